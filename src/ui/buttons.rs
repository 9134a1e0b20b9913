use serenity::{
    all::ButtonStyle,
    builder::{CreateActionRow, CreateButton},
};

use crate::audio::ControlAction;

/// IDs personalizados para los botones
pub mod button_ids {
    pub const PLAY_PAUSE: &str = "music_play_pause";
    pub const SKIP: &str = "music_skip";
    pub const LEAVE: &str = "music_leave";
    pub const QUEUE: &str = "music_queue";
}

/// Traduce el `custom_id` de un botón a su acción
pub fn action_for(custom_id: &str) -> Option<ControlAction> {
    match custom_id {
        button_ids::PLAY_PAUSE => Some(ControlAction::PauseResume),
        button_ids::SKIP => Some(ControlAction::Skip),
        button_ids::LEAVE => Some(ControlAction::Leave),
        button_ids::QUEUE => Some(ControlAction::ShowQueue),
        _ => None,
    }
}

pub fn custom_id(action: ControlAction) -> &'static str {
    match action {
        ControlAction::PauseResume => button_ids::PLAY_PAUSE,
        ControlAction::Skip => button_ids::SKIP,
        ControlAction::Leave => button_ids::LEAVE,
        ControlAction::ShowQueue => button_ids::QUEUE,
    }
}

/// Controles del mensaje "reproduciendo ahora".
///
/// The pause/resume button shows the action it will perform, so it reads "Reanudar"
/// while the song is paused.
pub fn player_controls(paused: bool) -> Vec<CreateActionRow> {
    let (emoji, label) = if paused {
        ('▶', "Reanudar")
    } else {
        ('⏸', "Pausar")
    };

    let play_pause = CreateButton::new(custom_id(ControlAction::PauseResume))
        .emoji(emoji)
        .label(label)
        .style(ButtonStyle::Primary);

    let skip = CreateButton::new(custom_id(ControlAction::Skip))
        .emoji('⏭')
        .label("Saltar")
        .style(ButtonStyle::Secondary);

    let leave = CreateButton::new(custom_id(ControlAction::Leave))
        .emoji('⏹')
        .label("Salir")
        .style(ButtonStyle::Danger);

    let queue = CreateButton::new(custom_id(ControlAction::ShowQueue))
        .emoji('📋')
        .label("Cola")
        .style(ButtonStyle::Secondary);

    vec![CreateActionRow::Buttons(vec![play_pause, skip, leave, queue])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_custom_ids_map_back_to_actions() {
        for action in [
            ControlAction::PauseResume,
            ControlAction::Skip,
            ControlAction::Leave,
            ControlAction::ShowQueue,
        ] {
            assert_eq!(action_for(custom_id(action)), Some(action));
        }
        assert_eq!(action_for("music_shuffle"), None);
    }

    #[test]
    fn test_pause_button_label_follows_state() {
        let playing = serde_json::to_value(&player_controls(false)).unwrap();
        let paused = serde_json::to_value(&player_controls(true)).unwrap();

        assert_eq!(playing[0]["components"][0]["label"], "Pausar");
        assert_eq!(paused[0]["components"][0]["label"], "Reanudar");
        assert_eq!(playing[0]["components"].as_array().unwrap().len(), 4);
    }
}
