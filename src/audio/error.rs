use serenity::model::id::GuildId;
use thiserror::Error;

/// Errores de las operaciones públicas del motor de reproducción.
///
/// The `Display` text is what the command surface shows to users.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("No hay ninguna canción reproduciéndose.")]
    NothingPlaying,
    #[error("La música no se está reproduciendo ahora mismo.")]
    NotPlaying,
    #[error("La música no está pausada.")]
    NotPaused,
    #[error("La cola está llena (máximo {max} canciones).")]
    QueueFull { max: usize },
    #[error("La sesión de reproducción ya fue cerrada.")]
    SessionClosed,
    #[error("Lo siento, no encontré `{query}`.")]
    ResolutionFailure { query: String },
    #[error("No pude conectarme a tu canal de voz, ¡revisa mis permisos!")]
    ConnectionFailure(#[source] TransportError),
    #[error("No se pudo reproducir `{title}`.")]
    PlaybackFailure {
        title: String,
        #[source]
        source: TransportError,
    },
    #[error("Error del transporte de audio: {0}")]
    Transport(#[from] TransportError),
}

impl PlayerError {
    /// Failures the loop recovers from by notifying the requester and moving on.
    pub fn is_recoverable_item_failure(&self) -> bool {
        matches!(
            self,
            Self::ResolutionFailure { .. } | Self::ConnectionFailure(_) | Self::PlaybackFailure { .. }
        )
    }
}

/// Errores del transporte de voz
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("no se pudo conectar al canal de voz: {0}")]
    Connect(String),
    #[error("no hay conexión de voz activa en la guild {0}")]
    NotConnected(GuildId),
    #[error("no hay pista activa en la guild {0}")]
    NoTrack(GuildId),
    #[error("no se pudo iniciar el stream: {0}")]
    Playback(String),
    #[error("error de control de pista: {0}")]
    Control(String),
}

/// Errores del canal de notificaciones (mensajes de Discord)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("el mensaje ya no existe")]
    NotFound,
    #[error("solicitud rechazada: {0}")]
    Rejected(String),
}
