//! # Sources Module
//!
//! Song resolution for the playback engine.
//!
//! The player loop only knows the [`Resolver`] trait: it hands over the raw text of a
//! `play` request and gets back either a [`ResolvedSong`] ready to stream or `None`
//! (not found). Resolution is slow (HTTP search + `yt-dlp` extraction), so the loop
//! always runs it on a separate task.
//!
//! ## Implementations
//!
//! - [`youtube::YouTubeResolver`] - URL detection, configurable search order
//!   (YouTube Data API v3 first, `ytsearch` fallback) and `yt-dlp` extraction.
//! - [`youtube_api_v3::YouTubeApiClient`] - search and title lookup over the Data API.
//! - [`ytdlp::YtDlp`] - stream URL / duration extraction through the `yt-dlp` binary.

pub mod youtube;
pub mod youtube_api_v3;
pub mod ytdlp;

use async_trait::async_trait;
use serenity::model::id::UserId;

pub use youtube::{SearchStrategy, YouTubeResolver};

/// Canción lista para reproducir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSong {
    /// URL directa del stream de audio
    pub stream_url: String,
    pub title: String,
    /// Duración en segundos; `0` significa transmisión en vivo o duración desconocida.
    pub duration_secs: u64,
    /// Página canónica del video (para el enlace del embed)
    pub webpage_url: String,
    /// El resolver no conoce al solicitante; la sesión lo asigna antes de reproducir.
    pub requested_by: Option<UserId>,
}

impl ResolvedSong {
    pub fn new(stream_url: String, title: String, duration_secs: u64, webpage_url: String) -> Self {
        Self {
            stream_url,
            title,
            duration_secs,
            webpage_url,
            requested_by: None,
        }
    }

    pub fn with_requester(mut self, user_id: UserId) -> Self {
        self.requested_by = Some(user_id);
        self
    }

    pub fn is_live(&self) -> bool {
        self.duration_secs == 0
    }
}

/// Contrato del backend de resolución de canciones.
///
/// Implementations must swallow transport-level failures and report them as `None`;
/// the player loop treats every `None` the same way (notify, discard, continue).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Convierte una consulta (texto libre o URL) en una canción reproducible.
    async fn resolve(&self, query: &str) -> Option<ResolvedSong>;

    /// Best-effort display title, looked up when the request is enqueued.
    async fn lookup_title(&self, query: &str) -> Option<String>;
}
