use anyhow::Result;
use serenity::{
    all::{Context, Message},
    builder::{CreateEmbed, CreateMessage},
    model::id::GuildId,
};
use tracing::{info, warn};

use super::{user_voice_channel, MusicBot};
use crate::{
    audio::{PlaybackRequest, PlayerError, QueueSnapshot, ReplyContext},
    ui::embeds,
};

/// Comandos de texto reconocidos (`!play`, `!skip`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(String),
    Pause,
    Resume,
    Skip,
    Queue,
    Leave,
    Help,
}

/// Interpreta un mensaje; `None` si no es un comando del bot
pub fn parse(content: &str, prefix: &str) -> Option<Command> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "play" | "p" => Command::Play(args.to_string()),
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "skip" => Command::Skip,
        "queue" | "q" => Command::Queue,
        "leave" => Command::Leave,
        "help" => Command::Help,
        _ => return None,
    };
    Some(command)
}

pub async fn handle(ctx: &Context, msg: &Message, command: Command, bot: &MusicBot) -> Result<()> {
    let Some(guild_id) = msg.guild_id else {
        return reply(ctx, msg, embeds::error("Este comando solo funciona en un servidor.")).await;
    };

    info!("📝 {:?} de {} en guild {}", command, msg.author.name, guild_id);

    match command {
        Command::Play(query) => handle_play(ctx, msg, guild_id, query, bot).await,
        Command::Pause => {
            let outcome = match bot.registry.get(guild_id) {
                Some(session) => {
                    let outcome = session.pause().await;
                    // El botón del mensaje "reproduciendo ahora" debe decir "Reanudar"
                    if outcome.is_ok() {
                        session.refresh_controls().await;
                    }
                    outcome
                }
                None => Err(PlayerError::NothingPlaying),
            };
            respond(ctx, msg, outcome, "Pausado", "Música pausada.").await
        }
        Command::Resume => {
            let outcome = match bot.registry.get(guild_id) {
                Some(session) => {
                    let outcome = session.resume().await;
                    if outcome.is_ok() {
                        session.refresh_controls().await;
                    }
                    outcome
                }
                None => Err(PlayerError::NothingPlaying),
            };
            respond(ctx, msg, outcome, "Reanudado", "Música reanudada.").await
        }
        Command::Skip => {
            let (outcome, skipped) = match bot.registry.get(guild_id) {
                Some(session) => {
                    let skipped = session.current_song();
                    (session.skip().await, skipped)
                }
                None => (Err(PlayerError::NothingPlaying), None),
            };
            let description = match skipped {
                Some(song) => format!("Saltada: **{}**", song.title),
                None => "Canción saltada.".to_string(),
            };
            respond(ctx, msg, outcome, "Saltada", &description).await
        }
        Command::Queue => {
            let snapshot = bot
                .registry
                .get(guild_id)
                .map(|session| session.snapshot())
                .unwrap_or_else(QueueSnapshot::empty);
            reply(ctx, msg, embeds::queue(&snapshot)).await
        }
        Command::Leave => match bot.registry.get(guild_id) {
            Some(session) => {
                session.leave().await;
                reply(ctx, msg, embeds::success("Hasta luego", "Cola vaciada y canal de voz abandonado.")).await
            }
            None => reply(ctx, msg, embeds::error("No estoy conectado a ningún canal de voz.")).await,
        },
        Command::Help => reply(ctx, msg, embeds::help(&bot.config.command_prefix)).await,
    }
}

async fn handle_play(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    query: String,
    bot: &MusicBot,
) -> Result<()> {
    if query.is_empty() {
        let usage = format!("Uso: `{}play <canción o URL>`", bot.config.command_prefix);
        return reply(ctx, msg, embeds::warning(&usage)).await;
    }

    let Some(voice_channel) = user_voice_channel(ctx, guild_id, msg.author.id) else {
        return reply(ctx, msg, embeds::warning("¡Necesitas estar en un canal de voz!")).await;
    };

    let display_title = bot
        .resolver
        .lookup_title(&query)
        .await
        .unwrap_or_else(|| query.clone());

    let request = PlaybackRequest {
        query,
        guild_id,
        voice_channel,
        requested_by: msg.author.id,
        reply: ReplyContext::from(msg.channel_id),
        display_title: display_title.clone(),
    };

    match bot.registry.enqueue(request).await {
        Ok(position) => {
            let description = format!("**{}**\nPosición en la cola: {}", display_title, position);
            reply(ctx, msg, embeds::success("Agregada a la cola", &description)).await
        }
        Err(e) => {
            warn!("⚠️ No se pudo encolar en guild {}: {}", guild_id, e);
            reply(ctx, msg, embeds::error(&e.to_string())).await
        }
    }
}

async fn respond(
    ctx: &Context,
    msg: &Message,
    outcome: Result<(), PlayerError>,
    title: &str,
    description: &str,
) -> Result<()> {
    let embed = match outcome {
        Ok(()) => embeds::success(title, description),
        Err(e) => embeds::error(&e.to_string()),
    };
    reply(ctx, msg, embed).await
}

async fn reply(ctx: &Context, msg: &Message, embed: CreateEmbed) -> Result<()> {
    msg.channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_commands_and_aliases() {
        assert_eq!(parse("!play never gonna", "!"), Some(Command::Play("never gonna".into())));
        assert_eq!(parse("!p   lofi  ", "!"), Some(Command::Play("lofi".into())));
        assert_eq!(parse("!play", "!"), Some(Command::Play(String::new())));
        assert_eq!(parse("!Q", "!"), Some(Command::Queue));
        assert_eq!(parse("!skip", "!"), Some(Command::Skip));
        assert_eq!(parse("!leave", "!"), Some(Command::Leave));
        assert_eq!(parse("?pause", "?"), Some(Command::Pause));
    }

    #[test]
    fn test_parse_ignores_other_messages() {
        assert_eq!(parse("play something", "!"), None);
        assert_eq!(parse("!shuffle", "!"), None);
        assert_eq!(parse("", "!"), None);
        assert_eq!(parse("!", "!"), None);
    }
}
