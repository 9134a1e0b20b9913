//! # Audio Module
//!
//! Per-guild sequential playback engine for Open Music Bot.
//!
//! ## Architecture
//!
//! ### [`registry`] - Session Registry
//! - One [`session::PlaybackSession`] per guild, created lazily on the first `play`
//! - Atomic obtain-or-create; sessions remove themselves on teardown
//!
//! ### [`session`] - Playback Session
//! - FIFO request queue consumed by a single player loop task
//! - State machine: `WaitingForRequest → Resolving → Connecting → Playing ⇄ Paused`
//! - Idle teardown after `IDLE_TIMEOUT_SECS` without requests
//!
//! ### [`progress`] - Progress Tracker
//! - Pause-aware elapsed time and a 20 segment progress bar
//! - Throttled edits of the now-playing message (only when the text changes)
//!
//! The voice connection and the chat messages are reached through the [`transport::Transport`]
//! and [`notifier::NotificationSink`] traits; [`songbird_transport`] and
//! `ui::discord` bind them to Songbird and Serenity.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! # async fn example(registry: SessionRegistry, request: PlaybackRequest) -> anyhow::Result<()> {
//! let guild_id = request.guild_id;
//! let position = registry.enqueue(request).await?;
//!
//! if let Some(session) = registry.get(guild_id) {
//!     session.pause().await?;
//!     session.resume().await?;
//!     session.skip().await?;
//!     session.leave().await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod notifier;
pub mod progress;
pub mod queue;
pub mod registry;
pub mod session;
pub mod songbird_transport;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{NotifyError, PlayerError, TransportError};
pub use notifier::{MessageHandle, NotificationSink, ReplyContext};
pub use queue::{PlaybackRequest, QueuedEntry};
pub use registry::SessionRegistry;
pub use session::{PlaybackSession, QueueSnapshot, SessionSettings};
pub use songbird_transport::SongbirdTransport;
pub use transport::{FinishSignal, Transport, VoiceConnection};

/// Estados del loop de reproducción
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    WaitingForRequest,
    Resolving,
    Connecting,
    Playing,
    Paused,
    TornDown,
}

impl PlayerState {
    /// Hay una canción activa (reproduciendo o en pausa)
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// Motivo del cierre de una sesión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// Sin peticiones durante el tiempo de inactividad
    Idle,
    /// `leave` explícito
    Leave,
}

/// Acciones que expone la superficie de control (botones del mensaje "reproduciendo ahora")
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    PauseResume,
    Skip,
    Leave,
    ShowQueue,
}

/// Resultado de aplicar una [`ControlAction`]
#[derive(Debug, Clone, PartialEq)]
pub enum ControlOutcome {
    Paused,
    Resumed,
    Skipped,
    Left,
    Queue(QueueSnapshot),
}
