use async_trait::async_trait;
use serenity::{
    builder::{CreateMessage, EditMessage},
    http::{Http, HttpError},
};
use std::sync::Arc;
use tracing::debug;

use super::{buttons, embeds};
use crate::{
    audio::{MessageHandle, NotificationSink, NotifyError, ReplyContext},
    sources::ResolvedSong,
};

/// [`NotificationSink`] sobre la API REST de Discord
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn map_discord_error(error: serenity::Error) -> NotifyError {
    match &error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404 =>
        {
            NotifyError::NotFound
        }
        _ => NotifyError::Rejected(error.to_string()),
    }
}

#[async_trait]
impl NotificationSink for DiscordNotifier {
    async fn send_text(&self, reply: ReplyContext, text: &str) -> Result<MessageHandle, NotifyError> {
        let message = reply
            .channel_id
            .say(&self.http, text)
            .await
            .map_err(map_discord_error)?;

        Ok(MessageHandle {
            channel_id: message.channel_id,
            message_id: message.id,
        })
    }

    async fn send_now_playing(
        &self,
        reply: ReplyContext,
        song: &ResolvedSong,
        progress: &str,
    ) -> Result<MessageHandle, NotifyError> {
        let builder = CreateMessage::new()
            .embed(embeds::now_playing(song, progress))
            .components(buttons::player_controls(false));

        let message = reply
            .channel_id
            .send_message(&self.http, builder)
            .await
            .map_err(map_discord_error)?;

        Ok(MessageHandle {
            channel_id: message.channel_id,
            message_id: message.id,
        })
    }

    async fn edit_progress(
        &self,
        message: MessageHandle,
        song: &ResolvedSong,
        progress: &str,
    ) -> Result<(), NotifyError> {
        message
            .channel_id
            .edit_message(
                &self.http,
                message.message_id,
                EditMessage::new().embed(embeds::now_playing(song, progress)),
            )
            .await
            .map_err(map_discord_error)?;
        Ok(())
    }

    async fn set_controls(&self, message: MessageHandle, paused: bool) -> Result<(), NotifyError> {
        message
            .channel_id
            .edit_message(
                &self.http,
                message.message_id,
                EditMessage::new().components(buttons::player_controls(paused)),
            )
            .await
            .map_err(map_discord_error)?;
        Ok(())
    }

    async fn clear_controls(&self, message: MessageHandle) -> Result<(), NotifyError> {
        message
            .channel_id
            .edit_message(&self.http, message.message_id, EditMessage::new().components(Vec::new()))
            .await
            .map_err(map_discord_error)?;

        debug!("Controles retirados del mensaje {}", message.message_id);
        Ok(())
    }
}
