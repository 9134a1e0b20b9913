use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
    time::Duration,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{
    error::PlayerError,
    notifier::{MessageHandle, NotificationSink, ReplyContext},
    progress::{render_progress, PlaybackClock, ProgressTick, ProgressTracker},
    queue::{PlaybackRequest, QueuedEntry, RequestQueue},
    registry::SessionMap,
    transport::{FinishSignal, Transport, VoiceConnection},
    ControlAction, ControlOutcome, PlayerState, TeardownReason,
};
use crate::sources::{ResolvedSong, Resolver};

/// Entradas de la cola que se muestran en `queue`
pub const QUEUE_PREVIEW_LIMIT: usize = 10;

/// Políticas de una sesión (derivadas de [`crate::config::Config`])
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub idle_timeout: Duration,
    pub progress_interval: Duration,
    pub max_queue_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(180),
            progress_interval: Duration::from_secs(1),
            max_queue_size: 1000,
        }
    }
}

/// Colaboradores externos compartidos por todas las sesiones
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn Transport>,
    pub notifier: Arc<dyn NotificationSink>,
    pub resolver: Arc<dyn Resolver>,
}

/// Vista de solo lectura de la cola para `queue` y el botón de cola
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    pub state: PlayerState,
    pub current: Option<ResolvedSong>,
    /// Como máximo [`QUEUE_PREVIEW_LIMIT`] entradas
    pub pending: Vec<QueuedEntry>,
    pub total_pending: usize,
}

impl QueueSnapshot {
    pub fn empty() -> Self {
        Self {
            state: PlayerState::WaitingForRequest,
            current: None,
            pending: Vec::new(),
            total_pending: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.total_pending == 0
    }

    /// Entradas pendientes que no entran en la vista previa
    pub fn hidden(&self) -> usize {
        self.total_pending.saturating_sub(self.pending.len())
    }
}

#[derive(Debug, Default)]
struct SessionState {
    player: PlayerState,
    current: Option<ResolvedSong>,
    connection: Option<VoiceConnection>,
    clock: PlaybackClock,
    finish: Option<FinishSignal>,
    last_progress: Option<String>,
    last_reply: Option<ReplyContext>,
    now_playing: Option<MessageHandle>,
}

/// Sesión de reproducción de una guild.
///
/// A single player loop task owns every state transition. `enqueue`, `pause`, `resume`,
/// `skip` and `leave` are called concurrently from command handlers and buttons: they only
/// append to the queue, flip the pause state under a short lock, fire the current song's
/// [`FinishSignal`] or cancel the session token. The state lock is never held across an
/// `.await`.
pub struct PlaybackSession {
    guild_id: GuildId,
    settings: SessionSettings,
    deps: Collaborators,
    queue: RequestQueue,
    state: Mutex<SessionState>,
    /// Serializa pause/resume para que el transporte no reciba órdenes cruzadas
    controls: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
    started: AtomicBool,
    torn_down: AtomicBool,
    /// Se cancela cuando el primer teardown terminó sus efectos
    teardown_done: CancellationToken,
    registry: Weak<SessionMap>,
}

impl PlaybackSession {
    pub(crate) fn new(
        guild_id: GuildId,
        settings: SessionSettings,
        deps: Collaborators,
        registry: Weak<SessionMap>,
    ) -> Arc<Self> {
        Arc::new(Self {
            guild_id,
            queue: RequestQueue::new(settings.max_queue_size),
            settings,
            deps,
            state: Mutex::new(SessionState::default()),
            controls: tokio::sync::Mutex::new(()),
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
            teardown_done: CancellationToken::new(),
            registry,
        })
    }

    /// Lanza el loop de reproducción (solo la primera llamada tiene efecto)
    pub(crate) fn spawn_player(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        tokio::spawn(Arc::clone(self).run());
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn state(&self) -> PlayerState {
        self.state.lock().player
    }

    pub fn is_paused(&self) -> bool {
        self.state() == PlayerState::Paused
    }

    pub fn current_song(&self) -> Option<ResolvedSong> {
        self.state.lock().current.clone()
    }

    /// Canal de voz donde está conectada la sesión
    pub fn voice_channel(&self) -> Option<ChannelId> {
        self.state.lock().connection.map(|connection| connection.channel_id)
    }

    /// Tiempo reproducido de la canción actual (congelado mientras está en pausa)
    pub fn elapsed(&self) -> Duration {
        self.state.lock().clock.elapsed(Instant::now())
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let (state, current) = {
            let state = self.state.lock();
            (state.player, state.current.clone())
        };
        let (pending, total_pending) = self.queue.preview(QUEUE_PREVIEW_LIMIT);

        QueueSnapshot {
            state,
            current,
            pending,
            total_pending,
        }
    }

    /// Agrega una petición a la cola; devuelve su posición
    pub fn enqueue(&self, request: PlaybackRequest) -> Result<usize, PlayerError> {
        let title = request.display_title.clone();
        let position = self.queue.push(request)?;

        info!(
            "➕ '{}' agregada a la cola de guild {} (posición {})",
            title, self.guild_id, position
        );
        Ok(position)
    }

    /// Pausa la reproducción actual
    pub async fn pause(&self) -> Result<(), PlayerError> {
        let _controls = self.controls.lock().await;

        let connection = {
            let mut state = self.state.lock();
            match state.player {
                PlayerState::Playing => {}
                PlayerState::Paused => return Err(PlayerError::NotPlaying),
                _ => return Err(PlayerError::NothingPlaying),
            }
            let connection = state.connection.ok_or(PlayerError::NothingPlaying)?;
            state.player = PlayerState::Paused;
            state.clock.pause(Instant::now());
            connection
        };

        if let Err(e) = self.deps.transport.pause(&connection).await {
            let mut state = self.state.lock();
            if state.player == PlayerState::Paused {
                state.player = PlayerState::Playing;
                state.clock.resume(Instant::now());
            }
            return Err(e.into());
        }

        info!("⏸️ Música pausada en guild {}", self.guild_id);
        Ok(())
    }

    /// Reanuda la reproducción
    pub async fn resume(&self) -> Result<(), PlayerError> {
        let _controls = self.controls.lock().await;

        let connection = {
            let mut state = self.state.lock();
            match state.player {
                PlayerState::Paused => {}
                PlayerState::Playing => return Err(PlayerError::NotPaused),
                _ => return Err(PlayerError::NothingPlaying),
            }
            let connection = state.connection.ok_or(PlayerError::NothingPlaying)?;
            state.player = PlayerState::Playing;
            state.clock.resume(Instant::now());
            connection
        };

        if let Err(e) = self.deps.transport.resume(&connection).await {
            let mut state = self.state.lock();
            if state.player == PlayerState::Playing {
                state.player = PlayerState::Paused;
                state.clock.pause(Instant::now());
            }
            return Err(e.into());
        }

        info!("▶️ Música reanudada en guild {}", self.guild_id);
        Ok(())
    }

    /// Salta la canción actual.
    ///
    /// Fires the current song's finish signal; the player loop then stops the transport
    /// track and advances. A stale signal (the song already ended) is a no-op, so a skip
    /// racing a natural end can never stop the next song.
    pub async fn skip(&self) -> Result<(), PlayerError> {
        let finish = {
            let state = self.state.lock();
            if !state.player.is_active() {
                return Err(PlayerError::NothingPlaying);
            }
            state.finish.clone()
        };

        match finish {
            Some(finish) => {
                finish.fire();
                info!("⏭️ Canción saltada en guild {}", self.guild_id);
                Ok(())
            }
            None => Err(PlayerError::NothingPlaying),
        }
    }

    /// Cierra la sesión a pedido del usuario
    pub async fn leave(self: &Arc<Self>) -> bool {
        self.teardown(TeardownReason::Leave).await
    }

    /// Aplica una acción de la superficie de control
    pub async fn perform(self: &Arc<Self>, action: ControlAction) -> Result<ControlOutcome, PlayerError> {
        match action {
            ControlAction::PauseResume => {
                if self.is_paused() {
                    self.resume().await.map(|_| ControlOutcome::Resumed)
                } else {
                    self.pause().await.map(|_| ControlOutcome::Paused)
                }
            }
            ControlAction::Skip => self.skip().await.map(|_| ControlOutcome::Skipped),
            ControlAction::Leave => {
                self.leave().await;
                Ok(ControlOutcome::Left)
            }
            ControlAction::ShowQueue => Ok(ControlOutcome::Queue(self.snapshot())),
        }
    }

    /// Cierra la sesión: cancela loop y tracker, vacía la cola, desconecta la voz y se
    /// quita del registro.
    ///
    /// Only the first call performs the side effects and returns `true`. Later calls wait
    /// until those side effects are done, so every call returns with the voice connection
    /// released and the registry entry gone.
    pub async fn teardown(self: &Arc<Self>, reason: TeardownReason) -> bool {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            // La conexión de voz es por guild: nadie debe reemplazar esta sesión antes de
            // que el primer teardown haya desconectado
            self.closed().await;
            self.unregister();
            debug!("Sesión de guild {} ya estaba cerrada", self.guild_id);
            return false;
        }
        let _done = self.teardown_done.clone().drop_guard();

        info!("🧹 Cerrando sesión de guild {} ({:?})", self.guild_id, reason);

        // Cancela el loop y, por ser token hijo, el tracker
        self.cancel.cancel();
        let discarded = self.queue.close_and_drain();

        let (connection, now_playing, last_reply) = {
            let mut state = self.state.lock();
            state.player = PlayerState::TornDown;
            (state.connection.take(), state.now_playing.take(), state.last_reply)
        };

        if let Some(connection) = connection {
            let transport = &self.deps.transport;
            if transport.is_playing(&connection).await || transport.is_paused(&connection).await {
                if let Err(e) = transport.stop(&connection).await {
                    debug!("Nada que detener en guild {}: {}", self.guild_id, e);
                }
            }
            if let Err(e) = self.deps.transport.disconnect(&connection).await {
                warn!("⚠️ Error al desconectar guild {}: {}", self.guild_id, e);
            }
        }

        if let Some(message) = now_playing {
            if let Err(e) = self.deps.notifier.clear_controls(message).await {
                debug!("No se pudieron quitar los controles: {}", e);
            }
        }

        if reason == TeardownReason::Idle {
            if let Some(reply) = last_reply {
                let minutes = (self.settings.idle_timeout.as_secs() / 60).max(1);
                self.notify(
                    reply,
                    &format!("😴 Llevo más de {} minutos sin música, ¡me voy a descansar!", minutes),
                )
                .await;
            }
        }

        self.unregister();
        info!(
            "✅ Sesión de guild {} cerrada ({} peticiones descartadas)",
            self.guild_id,
            discarded.len()
        );
        true
    }

    /// Espera a que el teardown de esta sesión haya terminado
    pub(crate) async fn closed(&self) {
        self.teardown_done.cancelled().await;
    }

    /// Re-renderiza los botones del mensaje "reproduciendo ahora" según el estado actual
    pub async fn refresh_controls(&self) {
        let (message, paused) = {
            let state = self.state.lock();
            (state.now_playing, state.player == PlayerState::Paused)
        };
        let Some(message) = message else {
            return;
        };
        if let Err(e) = self.deps.notifier.set_controls(message, paused).await {
            debug!("No se pudieron actualizar los controles: {}", e);
        }
    }

    async fn run(self: Arc<Self>) {
        info!("🎶 Loop de reproducción iniciado para guild {}", self.guild_id);

        loop {
            self.retire_now_playing().await;
            self.set_player_state(PlayerState::WaitingForRequest);

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = self.queue.pop_within(self.settings.idle_timeout) => next,
            };

            let Some(request) = next else {
                info!(
                    "😴 Guild {} sin peticiones durante {}s",
                    self.guild_id,
                    self.settings.idle_timeout.as_secs()
                );
                self.teardown(TeardownReason::Idle).await;
                break;
            };

            let reply = request.reply;
            match self.play_request(request).await {
                Ok(()) => {}
                Err(PlayerError::SessionClosed) => break,
                Err(err) if err.is_recoverable_item_failure() => {
                    warn!("⚠️ Petición descartada en guild {}: {:?}", self.guild_id, err);
                    self.notify(reply, &format!("❌ {}", err)).await;
                }
                Err(err) => {
                    error!("❌ Error inesperado en guild {}: {:?}", self.guild_id, err);
                }
            }
        }

        debug!("Loop de reproducción terminado para guild {}", self.guild_id);
    }

    async fn play_request(self: &Arc<Self>, request: PlaybackRequest) -> Result<(), PlayerError> {
        self.state.lock().last_reply = Some(request.reply);

        self.set_player_state(PlayerState::Resolving);
        let song = self
            .resolve(&request.query)
            .await?
            .with_requester(request.requested_by);

        self.set_player_state(PlayerState::Connecting);
        let connection = self.ensure_connected(&request).await?;

        let (finish, finished) = FinishSignal::channel();
        let initial_progress = render_progress(Duration::ZERO, song.duration_secs);
        {
            let mut state = self.state.lock();
            if state.player == PlayerState::TornDown {
                return Err(PlayerError::SessionClosed);
            }
            state.current = Some(song.clone());
            state.clock.start(Instant::now());
            state.finish = Some(finish.clone());
            state.last_progress = Some(initial_progress.clone());
            state.player = PlayerState::Playing;
        }

        if let Err(source) = self
            .deps
            .transport
            .play(&connection, &song.stream_url, finish)
            .await
        {
            self.finish_song();
            return Err(PlayerError::PlaybackFailure {
                title: song.title.clone(),
                source,
            });
        }
        info!("🎵 Reproduciendo '{}' en guild {}", song.title, self.guild_id);

        self.retire_now_playing().await;
        match self
            .deps
            .notifier
            .send_now_playing(request.reply, &song, &initial_progress)
            .await
        {
            Ok(message) => {
                self.state.lock().now_playing = Some(message);
                if self.cancel.is_cancelled() {
                    self.retire_now_playing().await;
                }
            }
            Err(e) => warn!("No se pudo enviar el mensaje de reproducción: {}", e),
        }

        let tracker = ProgressTracker::spawn(
            Arc::clone(self),
            self.settings.progress_interval,
            self.cancel.child_token(),
        );

        tokio::select! {
            _ = finished => debug!("⏹️ Fin de '{}' en guild {}", song.title, self.guild_id),
            _ = self.cancel.cancelled() => debug!("Sesión cancelada durante '{}'", song.title),
        }

        tracker.stop().await;
        if let Err(e) = self.deps.transport.stop(&connection).await {
            debug!("Pista ya detenida en guild {}: {}", self.guild_id, e);
        }
        self.finish_song();
        Ok(())
    }

    /// Runs the resolver on its own task so cancellation stays responsive; a cancelled
    /// resolution keeps running and its result is dropped.
    async fn resolve(&self, query: &str) -> Result<ResolvedSong, PlayerError> {
        let resolver = Arc::clone(&self.deps.resolver);
        let owned_query = query.to_string();
        let lookup = tokio::spawn(async move { resolver.resolve(&owned_query).await });

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(PlayerError::SessionClosed),
            outcome = lookup => outcome,
        };

        match outcome {
            Ok(Some(song)) => Ok(song),
            Ok(None) => Err(PlayerError::ResolutionFailure {
                query: query.to_string(),
            }),
            Err(e) => {
                error!("💥 El resolver falló para '{}': {:?}", query, e);
                Err(PlayerError::ResolutionFailure {
                    query: query.to_string(),
                })
            }
        }
    }

    async fn ensure_connected(&self, request: &PlaybackRequest) -> Result<VoiceConnection, PlayerError> {
        let transport = &self.deps.transport;
        let existing = self.state.lock().connection;
        let alive = match &existing {
            Some(connection) => transport.is_connected(connection).await,
            None => false,
        };

        let connection = match existing {
            Some(current) if alive && current.channel_id == request.voice_channel => current,
            Some(current) if alive => transport
                .move_to(&current, request.voice_channel)
                .await
                .map_err(PlayerError::ConnectionFailure)?,
            _ => transport
                .connect(request.guild_id, request.voice_channel)
                .await
                .map_err(PlayerError::ConnectionFailure)?,
        };

        let orphaned = {
            let mut state = self.state.lock();
            if self.cancel.is_cancelled() {
                true
            } else {
                state.connection = Some(connection);
                false
            }
        };

        if orphaned {
            // El teardown ya pasó y no conoce esta conexión
            if let Err(e) = transport.disconnect(&connection).await {
                debug!("Error al cerrar conexión huérfana: {}", e);
            }
            return Err(PlayerError::SessionClosed);
        }

        Ok(connection)
    }

    /// Un ciclo del tracker: renderiza y edita el mensaje solo si el texto cambió
    pub(crate) async fn push_progress(&self) -> ProgressTick {
        let (message, song, rendered) = {
            let state = self.state.lock();
            if !state.player.is_active() {
                return ProgressTick::Inactive;
            }
            let (Some(song), Some(message)) = (state.current.as_ref(), state.now_playing) else {
                return ProgressTick::Inactive;
            };

            let rendered = render_progress(state.clock.elapsed(Instant::now()), song.duration_secs);
            if state.last_progress.as_deref() == Some(rendered.as_str()) {
                return ProgressTick::Unchanged;
            }
            (message, song.clone(), rendered)
        };

        match self.deps.notifier.edit_progress(message, &song, &rendered).await {
            Ok(()) => {
                self.state.lock().last_progress = Some(rendered);
                ProgressTick::Updated
            }
            Err(e) => ProgressTick::Failed(e),
        }
    }

    fn set_player_state(&self, next: PlayerState) {
        let mut state = self.state.lock();
        if state.player != PlayerState::TornDown {
            state.player = next;
        }
    }

    fn finish_song(&self) {
        let mut state = self.state.lock();
        state.current = None;
        state.finish = None;
        state.last_progress = None;
        state.clock.reset();
        if state.player != PlayerState::TornDown {
            state.player = PlayerState::WaitingForRequest;
        }
    }

    /// Quita los controles del último mensaje "reproduciendo ahora"
    async fn retire_now_playing(&self) {
        let message = self.state.lock().now_playing.take();
        if let Some(message) = message {
            if let Err(e) = self.deps.notifier.clear_controls(message).await {
                debug!("No se pudieron quitar los controles: {}", e);
            }
        }
    }

    async fn notify(&self, reply: ReplyContext, text: &str) {
        if let Err(e) = self.deps.notifier.send_text(reply, text).await {
            warn!("⚠️ No se pudo notificar en guild {}: {}", self.guild_id, e);
        }
    }

    fn unregister(self: &Arc<Self>) {
        let Some(sessions) = self.registry.upgrade() else {
            return;
        };
        if sessions
            .remove_if(&self.guild_id, |_, session| Arc::ptr_eq(session, self))
            .is_some()
        {
            debug!("🗑️ Sesión de guild {} eliminada del registro", self.guild_id);
        }
    }
}
