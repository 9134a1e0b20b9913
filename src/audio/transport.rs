use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tokio::sync::oneshot;

use super::error::TransportError;

/// Conexión de voz activa (propiedad del subsistema de transporte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceConnection {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
}

/// Señal de fin de pista.
///
/// The transport is the only producer and the player loop the only consumer. It may be
/// fired any number of times from any thread; only the first call is delivered.
#[derive(Debug, Clone)]
pub struct FinishSignal {
    tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl FinishSignal {
    pub fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Devuelve `true` si esta llamada entregó la señal
    pub fn fire(&self) -> bool {
        let sender = self.tx.lock().take();
        match sender {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

/// Transporte de audio externo (conexión de voz + reproducción)
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<VoiceConnection, TransportError>;

    async fn move_to(
        &self,
        connection: &VoiceConnection,
        channel_id: ChannelId,
    ) -> Result<VoiceConnection, TransportError>;

    async fn is_connected(&self, connection: &VoiceConnection) -> bool;

    /// Starts streaming `stream_url`; `on_finish` fires on natural end, error or `stop`.
    async fn play(
        &self,
        connection: &VoiceConnection,
        stream_url: &str,
        on_finish: FinishSignal,
    ) -> Result<(), TransportError>;

    async fn pause(&self, connection: &VoiceConnection) -> Result<(), TransportError>;

    async fn resume(&self, connection: &VoiceConnection) -> Result<(), TransportError>;

    /// Detiene la pista actual (dispara `on_finish`)
    async fn stop(&self, connection: &VoiceConnection) -> Result<(), TransportError>;

    async fn disconnect(&self, connection: &VoiceConnection) -> Result<(), TransportError>;

    async fn is_playing(&self, connection: &VoiceConnection) -> bool;

    async fn is_paused(&self, connection: &VoiceConnection) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_finish_signal_delivers_once() {
        let (signal, rx) = FinishSignal::channel();
        let from_callback = signal.clone();

        assert!(from_callback.fire());
        assert!(!signal.fire());
        assert!(rx.await.is_ok());
    }
}
