use dashmap::{mapref::entry::Entry, DashMap};
use futures::future::join_all;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tracing::{info, warn};

use super::{
    error::PlayerError,
    notifier::NotificationSink,
    queue::PlaybackRequest,
    session::{Collaborators, PlaybackSession, SessionSettings},
    transport::Transport,
    TeardownReason,
};
use crate::sources::Resolver;

pub(crate) type SessionMap = DashMap<GuildId, Arc<PlaybackSession>>;

/// Registro de sesiones activas, como máximo una por guild.
///
/// Cheap to clone; every clone shares the same map. Sessions are created lazily by
/// [`SessionRegistry::get_or_create`] and remove themselves when torn down.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<SessionMap>,
    settings: SessionSettings,
    deps: Collaborators,
}

impl SessionRegistry {
    pub fn new(
        settings: SessionSettings,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn NotificationSink>,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            settings,
            deps: Collaborators {
                transport,
                notifier,
                resolver,
            },
        }
    }

    /// Devuelve la sesión de la guild o crea una nueva con su loop ya lanzado
    pub fn get_or_create(&self, guild_id: GuildId) -> Arc<PlaybackSession> {
        let session = match self.sessions.entry(guild_id) {
            Entry::Occupied(entry) => return Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let session = PlaybackSession::new(
                    guild_id,
                    self.settings.clone(),
                    self.deps.clone(),
                    Arc::downgrade(&self.sessions),
                );
                entry.insert(Arc::clone(&session));
                session
            }
        };

        // El shard de DashMap ya se liberó: el loop puede desregistrarse sin bloquear
        session.spawn_player();
        info!("🆕 Sesión creada para guild {}", guild_id);
        session
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Arc<PlaybackSession>> {
        self.sessions.get(&guild_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Quita la entrada de la guild sin cerrar la sesión
    #[allow(dead_code)]
    pub fn remove(&self, guild_id: GuildId) -> Option<Arc<PlaybackSession>> {
        self.sessions.remove(&guild_id).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Encola una petición en la sesión de su guild, creándola si hace falta.
    ///
    /// A session that is tearing itself down rejects new requests. In that case the request
    /// waits for that teardown to release the voice connection, the stale entry is dropped
    /// and the request goes to a fresh session.
    pub async fn enqueue(&self, request: PlaybackRequest) -> Result<usize, PlayerError> {
        let guild_id = request.guild_id;
        let session = self.get_or_create(guild_id);

        match session.enqueue(request.clone()) {
            Err(PlayerError::SessionClosed) => {
                // Desconectar es por guild: la sesión nueva no puede conectarse antes
                session.closed().await;
                self.sessions
                    .remove_if(&guild_id, |_, current| Arc::ptr_eq(current, &session));
                self.get_or_create(guild_id).enqueue(request)
            }
            other => other,
        }
    }

    /// Cierra todas las sesiones (apagado del bot)
    pub async fn shutdown(&self) {
        let sessions: Vec<_> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        if sessions.is_empty() {
            return;
        }

        info!("🛑 Cerrando {} sesiones activas", sessions.len());
        join_all(
            sessions
                .iter()
                .map(|session| session.teardown(TeardownReason::Leave)),
        )
        .await;

        if !self.sessions.is_empty() {
            warn!("⚠️ Quedaron {} sesiones tras el apagado", self.sessions.len());
        }
    }
}
