use async_trait::async_trait;
use serenity::model::id::{ChannelId, MessageId};

use super::error::NotifyError;
use crate::sources::ResolvedSong;

/// Canal de texto donde se originó una petición (destino de las respuestas)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyContext {
    pub channel_id: ChannelId,
}

impl From<ChannelId> for ReplyContext {
    fn from(channel_id: ChannelId) -> Self {
        Self { channel_id }
    }
}

/// Referencia a un mensaje enviado por el bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

/// Sink for everything the engine tells users.
///
/// Every failure is non-fatal to playback: the loop logs send failures and the progress
/// tracker stops on the first failed edit.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_text(&self, reply: ReplyContext, text: &str) -> Result<MessageHandle, NotifyError>;

    /// Envía el mensaje "reproduciendo ahora" con los controles interactivos
    async fn send_now_playing(
        &self,
        reply: ReplyContext,
        song: &ResolvedSong,
        progress: &str,
    ) -> Result<MessageHandle, NotifyError>;

    async fn edit_progress(
        &self,
        message: MessageHandle,
        song: &ResolvedSong,
        progress: &str,
    ) -> Result<(), NotifyError>;

    /// Vuelve a dibujar los botones (la etiqueta de pausa depende de `paused`)
    async fn set_controls(&self, message: MessageHandle, paused: bool) -> Result<(), NotifyError>;

    /// Quita los botones de un mensaje "reproduciendo ahora" anterior
    async fn clear_controls(&self, message: MessageHandle) -> Result<(), NotifyError>;
}
