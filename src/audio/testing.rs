//! Dobles de prueba para el motor de reproducción.

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use super::{
    error::{NotifyError, TransportError},
    notifier::{MessageHandle, NotificationSink, ReplyContext},
    queue::PlaybackRequest,
    registry::SessionRegistry,
    session::SessionSettings,
    transport::{FinishSignal, Transport, VoiceConnection},
};
use crate::sources::{MockResolver, ResolvedSong};

pub const GUILD: GuildId = GuildId::new(1);

pub fn request(query: &str) -> PlaybackRequest {
    PlaybackRequest {
        query: query.to_string(),
        guild_id: GUILD,
        voice_channel: ChannelId::new(10),
        requested_by: UserId::new(100),
        reply: ReplyContext::from(ChannelId::new(20)),
        display_title: query.to_string(),
    }
}

pub fn song(query: &str, duration_secs: u64) -> ResolvedSong {
    ResolvedSong::new(
        format!("stream://{}", query),
        query.to_string(),
        duration_secs,
        format!("https://example.invalid/{}", query),
    )
}

/// `missing*` no se encuentra, `live*` no tiene duración, el resto dura 200s
pub fn resolver() -> MockResolver {
    let mut resolver = MockResolver::new();
    resolver.expect_resolve().returning(|query: &str| {
        if query.starts_with("missing") {
            None
        } else if query.starts_with("live") {
            Some(song(query, 0))
        } else {
            Some(song(query, 200))
        }
    });
    resolver
        .expect_lookup_title()
        .returning(|query: &str| Some(query.to_string()));
    resolver
}

#[derive(Default)]
pub struct FakeTransport {
    fail_connect: AtomicBool,
    fail_play: AtomicBool,
    paused: AtomicBool,
    moves: AtomicUsize,
    disconnects: AtomicUsize,
    disconnect_delay: Mutex<Duration>,
    played: Mutex<Vec<String>>,
    current: Mutex<Option<(String, FinishSignal)>>,
    connected: Mutex<Option<VoiceConnection>>,
}

impl FakeTransport {
    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn fail_play(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    /// Hace que `disconnect` tarde antes de soltar la conexión
    pub fn slow_disconnect(&self, delay: Duration) {
        *self.disconnect_delay.lock() = delay;
    }

    pub fn played(&self) -> Vec<String> {
        self.played.lock().clone()
    }

    pub fn now_playing(&self) -> Option<String> {
        self.current.lock().as_ref().map(|(url, _)| url.clone())
    }

    /// Simula el fin natural de la pista actual
    pub fn finish_current(&self) {
        if let Some((_, finish)) = self.current.lock().take() {
            finish.fire();
        }
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn moves(&self) -> usize {
        self.moves.load(Ordering::SeqCst)
    }

    pub fn is_paused_now(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<VoiceConnection, TransportError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("sin permisos".to_string()));
        }
        let connection = VoiceConnection { guild_id, channel_id };
        *self.connected.lock() = Some(connection);
        Ok(connection)
    }

    async fn move_to(
        &self,
        connection: &VoiceConnection,
        channel_id: ChannelId,
    ) -> Result<VoiceConnection, TransportError> {
        self.moves.fetch_add(1, Ordering::SeqCst);
        self.connect(connection.guild_id, channel_id).await
    }

    async fn is_connected(&self, connection: &VoiceConnection) -> bool {
        self.connected.lock().as_ref() == Some(connection)
    }

    async fn play(
        &self,
        _connection: &VoiceConnection,
        stream_url: &str,
        on_finish: FinishSignal,
    ) -> Result<(), TransportError> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(TransportError::Playback("stream caído".to_string()));
        }
        self.played.lock().push(stream_url.to_string());
        self.paused.store(false, Ordering::SeqCst);
        *self.current.lock() = Some((stream_url.to_string(), on_finish));
        Ok(())
    }

    async fn pause(&self, _connection: &VoiceConnection) -> Result<(), TransportError> {
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self, _connection: &VoiceConnection) -> Result<(), TransportError> {
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self, connection: &VoiceConnection) -> Result<(), TransportError> {
        match self.current.lock().take() {
            Some((_, finish)) => {
                finish.fire();
                Ok(())
            }
            None => Err(TransportError::NoTrack(connection.guild_id)),
        }
    }

    async fn disconnect(&self, _connection: &VoiceConnection) -> Result<(), TransportError> {
        let delay = *self.disconnect_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.connected.lock().take();
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_playing(&self, _connection: &VoiceConnection) -> bool {
        self.current.lock().is_some() && !self.is_paused_now()
    }

    async fn is_paused(&self, _connection: &VoiceConnection) -> bool {
        self.is_paused_now()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    next_id: AtomicU64,
    texts: Mutex<Vec<String>>,
    now_playing: Mutex<Vec<String>>,
    edits: Mutex<Vec<String>>,
    edit_attempts: AtomicUsize,
    controls: Mutex<Vec<bool>>,
    cleared: AtomicUsize,
    fail_edits: Mutex<Option<NotifyError>>,
}

impl RecordingNotifier {
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }

    pub fn now_playing(&self) -> Vec<String> {
        self.now_playing.lock().clone()
    }

    pub fn edits(&self) -> Vec<String> {
        self.edits.lock().clone()
    }

    pub fn edit_attempts(&self) -> usize {
        self.edit_attempts.load(Ordering::SeqCst)
    }

    /// Valor de `paused` de cada re-render de botones
    pub fn controls(&self) -> Vec<bool> {
        self.controls.lock().clone()
    }

    pub fn cleared(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }

    pub fn fail_edits_with(&self, error: NotifyError) {
        *self.fail_edits.lock() = Some(error);
    }

    fn handle(&self, reply: ReplyContext) -> MessageHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        MessageHandle {
            channel_id: reply.channel_id,
            message_id: MessageId::new(id),
        }
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn send_text(&self, reply: ReplyContext, text: &str) -> Result<MessageHandle, NotifyError> {
        self.texts.lock().push(text.to_string());
        Ok(self.handle(reply))
    }

    async fn send_now_playing(
        &self,
        reply: ReplyContext,
        song: &ResolvedSong,
        _progress: &str,
    ) -> Result<MessageHandle, NotifyError> {
        self.now_playing.lock().push(song.title.clone());
        Ok(self.handle(reply))
    }

    async fn edit_progress(
        &self,
        _message: MessageHandle,
        _song: &ResolvedSong,
        progress: &str,
    ) -> Result<(), NotifyError> {
        self.edit_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fail_edits.lock().clone() {
            return Err(error);
        }
        self.edits.lock().push(progress.to_string());
        Ok(())
    }

    async fn set_controls(&self, _message: MessageHandle, paused: bool) -> Result<(), NotifyError> {
        self.controls.lock().push(paused);
        Ok(())
    }

    async fn clear_controls(&self, _message: MessageHandle) -> Result<(), NotifyError> {
        self.cleared.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct Harness {
    pub registry: SessionRegistry,
    pub transport: Arc<FakeTransport>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(settings: SessionSettings) -> Harness {
    let transport = Arc::new(FakeTransport::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let registry = SessionRegistry::new(
        settings,
        transport.clone(),
        notifier.clone(),
        Arc::new(resolver()),
    );

    Harness {
        registry,
        transport,
        notifier,
    }
}

/// Cede el control en pasos de 10ms hasta que se cumpla la condición
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..2000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("la condición no se cumplió a tiempo");
}
