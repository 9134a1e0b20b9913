use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};

use crate::{
    audio::{progress::format_time, PlayerState, QueueSnapshot},
    sources::ResolvedSong,
};

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const WARNING_ORANGE: Colour = Colour::from_rgb(255, 193, 7);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎵 Open Music Bot";

/// Embed "reproduciendo ahora"; `progress` es la línea ya renderizada
pub fn now_playing(song: &ResolvedSong, progress: &str) -> CreateEmbed {
    let duration = if song.is_live() {
        "🔴 En vivo".to_string()
    } else {
        format_time(song.duration_secs)
    };

    let mut embed = CreateEmbed::default()
        .title("🎵 Reproduciendo Ahora")
        .description(format!("**[{}]({})**", song.title, song.webpage_url))
        .color(colors::MUSIC_PURPLE)
        .field("Progreso", progress, false)
        .field("⏱️ Duración", duration, true);

    if let Some(user) = song.requested_by {
        embed = embed.field("👤 Solicitado por", format!("<@{}>", user), true);
    }

    embed.footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Embed de la cola: canción actual y las próximas entradas
pub fn queue(snapshot: &QueueSnapshot) -> CreateEmbed {
    let embed = CreateEmbed::default()
        .title("📋 Cola de Reproducción")
        .color(colors::INFO_BLUE)
        .timestamp(Timestamp::now());

    if snapshot.is_empty() {
        return embed
            .description("😴 **La cola está vacía**")
            .color(colors::NEUTRAL_GRAY)
            .footer(CreateEmbedFooter::new(STANDARD_FOOTER));
    }

    let mut embed = embed;
    if let Some(current) = &snapshot.current {
        let status = if snapshot.state == PlayerState::Paused {
            "⏸️"
        } else {
            "▶️"
        };
        embed = embed.field(format!("{} Reproduciendo", status), format!("**{}**", current.title), false);
    }

    if !snapshot.pending.is_empty() {
        let description = snapshot
            .pending
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("**{}**. {} (<@{}>)", i + 1, entry.title, entry.requested_by))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("Próximas canciones", description, false);
    }

    let footer = match snapshot.hidden() {
        0 => STANDARD_FOOTER.to_string(),
        hidden => format!("...y {} más • {} en total", hidden, snapshot.total_pending),
    };
    embed.footer(CreateEmbedFooter::new(footer))
}

pub fn help(prefix: &str) -> CreateEmbed {
    let commands = [
        ("play <canción|url>", "Busca y agrega una canción a la cola (alias `p`)"),
        ("pause", "Pausa la canción actual"),
        ("resume", "Reanuda la reproducción"),
        ("skip", "Salta a la siguiente canción"),
        ("queue", "Muestra la cola (alias `q`)"),
        ("leave", "Vacía la cola y sale del canal de voz"),
        ("help", "Muestra esta ayuda"),
    ];

    let description = commands
        .iter()
        .map(|(usage, what)| format!("`{}{}` - {}", prefix, usage, what))
        .collect::<Vec<_>>()
        .join("\n");

    CreateEmbed::default()
        .title("🎵 Comandos de Música")
        .description(description)
        .color(colors::INFO_BLUE)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

pub fn error(description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("❌ Error")
        .description(description)
        .color(colors::ERROR_RED)
}

pub fn success(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("✅ {}", title))
        .description(description)
        .color(colors::SUCCESS_GREEN)
}

pub fn warning(description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("⚠️ Atención")
        .description(description)
        .color(colors::WARNING_ORANGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::QueuedEntry;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use serenity::model::id::UserId;

    fn json(embed: &CreateEmbed) -> Value {
        serde_json::to_value(embed).unwrap()
    }

    fn entry(title: &str) -> QueuedEntry {
        QueuedEntry {
            title: title.to_string(),
            requested_by: UserId::new(7),
        }
    }

    #[test]
    fn test_now_playing_shows_progress_and_requester() {
        let song = ResolvedSong::new(
            "stream".into(),
            "Canción".into(),
            200,
            "https://youtu.be/x".into(),
        )
        .with_requester(UserId::new(42));

        let value = json(&now_playing(&song, "`00:10` barra"));
        let fields = value["fields"].as_array().unwrap();

        assert_eq!(fields[0]["value"], "`00:10` barra");
        assert_eq!(fields[1]["value"], "03:20");
        assert_eq!(fields[2]["value"], "<@42>");
        assert!(value["description"].as_str().unwrap().contains("https://youtu.be/x"));
    }

    #[test]
    fn test_queue_lists_pending_and_hidden_count() {
        let snapshot = QueueSnapshot {
            state: PlayerState::Playing,
            current: Some(ResolvedSong::new("s".into(), "Actual".into(), 10, "u".into())),
            pending: (1..=10).map(|i| entry(&format!("t{}", i))).collect(),
            total_pending: 13,
        };

        let value = json(&queue(&snapshot));
        let fields = value["fields"].as_array().unwrap();

        assert_eq!(fields[0]["value"], "**Actual**");
        assert_eq!(fields[1]["value"].as_str().unwrap().lines().count(), 10);
        assert!(value["footer"]["text"].as_str().unwrap().starts_with("...y 3 más"));
    }

    #[test]
    fn test_empty_queue() {
        let value = json(&queue(&QueueSnapshot::empty()));
        assert!(value["description"].as_str().unwrap().contains("vacía"));
        assert!(value.get("fields").map_or(true, |fields| fields.as_array().unwrap().is_empty()));
    }

    #[test]
    fn test_help_uses_prefix() {
        let value = json(&help("?"));
        assert!(value["description"].as_str().unwrap().contains("`?play <canción|url>`"));
    }
}
