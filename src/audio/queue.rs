use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::{collections::VecDeque, time::Duration};
use tokio::{
    sync::Notify,
    time::{timeout_at, Instant},
};
use tracing::debug;

use super::{error::PlayerError, notifier::ReplyContext};

/// Petición de reproducción tal como llega desde un comando `play`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    /// Texto libre o URL directa
    pub query: String,
    pub guild_id: GuildId,
    /// Canal de voz del solicitante
    pub voice_channel: ChannelId,
    pub requested_by: UserId,
    pub reply: ReplyContext,
    /// Título resuelto al encolar (o la consulta si no se pudo)
    pub display_title: String,
}

/// Entrada pendiente tal como se muestra en `queue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedEntry {
    pub title: String,
    pub requested_by: UserId,
}

impl From<&PlaybackRequest> for QueuedEntry {
    fn from(request: &PlaybackRequest) -> Self {
        Self {
            title: request.display_title.clone(),
            requested_by: request.requested_by,
        }
    }
}

#[derive(Debug, Default)]
struct QueueInner {
    items: VecDeque<PlaybackRequest>,
    closed: bool,
}

/// Cola FIFO de peticiones pendientes de una sesión.
///
/// Producers append from any task; the player loop is the only consumer. Closing and
/// draining happen under the same lock as `push`, so nothing can slip into a queue whose
/// session is being torn down.
#[derive(Debug)]
pub struct RequestQueue {
    inner: Mutex<QueueInner>,
    available: Notify,
    max_size: usize,
}

impl RequestQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
            available: Notify::new(),
            max_size,
        }
    }

    /// Agrega una petición al final; devuelve su posición (1 = la siguiente)
    pub fn push(&self, request: PlaybackRequest) -> Result<usize, PlayerError> {
        let position = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(PlayerError::SessionClosed);
            }
            if inner.items.len() >= self.max_size {
                return Err(PlayerError::QueueFull { max: self.max_size });
            }
            inner.items.push_back(request);
            inner.items.len()
        };

        self.available.notify_one();
        Ok(position)
    }

    /// Espera la siguiente petición como máximo `wait`; `None` si se agotó el tiempo
    pub async fn pop_within(&self, wait: Duration) -> Option<PlaybackRequest> {
        let deadline = Instant::now() + wait;

        loop {
            let next = self.inner.lock().items.pop_front();
            if next.is_some() {
                return next;
            }

            if timeout_at(deadline, self.available.notified()).await.is_err() {
                // Última oportunidad: un push pudo llegar justo en el límite
                return self.inner.lock().items.pop_front();
            }
        }
    }

    /// Cierra la cola y descarta todo lo pendiente
    pub fn close_and_drain(&self) -> Vec<PlaybackRequest> {
        let mut inner = self.inner.lock();
        inner.closed = true;
        let drained: Vec<_> = inner.items.drain(..).collect();
        debug!("🗑️ {} peticiones descartadas", drained.len());
        drained
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Primeras `limit` entradas en orden de reproducción, junto al total pendiente
    pub fn preview(&self, limit: usize) -> (Vec<QueuedEntry>, usize) {
        let inner = self.inner.lock();
        let entries = inner.items.iter().take(limit).map(QueuedEntry::from).collect();
        (entries, inner.items.len())
    }
}
