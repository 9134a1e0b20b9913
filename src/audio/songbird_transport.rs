use async_trait::async_trait;
use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    input::{HttpRequest, Input},
    tracks::{PlayMode, TrackHandle},
    Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{
    error::TransportError,
    transport::{FinishSignal, Transport, VoiceConnection},
};

/// Transporte de voz sobre Songbird.
///
/// Songbird owns the voice connections (one `Call` per guild); this type only keeps the
/// handle of the track it started so pause/resume/stop can reach it.
pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    http: reqwest::Client,
    tracks: DashMap<GuildId, TrackHandle>,
    volume: f32,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>, volume: f32) -> Self {
        Self {
            manager,
            http: reqwest::Client::new(),
            tracks: DashMap::new(),
            volume: volume.clamp(0.0, 2.0),
        }
    }

    fn call(&self, guild_id: GuildId) -> Result<Arc<Mutex<Call>>, TransportError> {
        self.manager
            .get(guild_id)
            .ok_or(TransportError::NotConnected(guild_id))
    }

    fn track(&self, guild_id: GuildId) -> Result<TrackHandle, TransportError> {
        self.tracks
            .get(&guild_id)
            .map(|track| track.clone())
            .ok_or(TransportError::NoTrack(guild_id))
    }

    async fn play_mode(&self, guild_id: GuildId) -> Option<PlayMode> {
        let track = self.track(guild_id).ok()?;
        track.get_info().await.ok().map(|info| info.playing)
    }
}

#[async_trait]
impl Transport for SongbirdTransport {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<VoiceConnection, TransportError> {
        self.manager
            .join(guild_id, channel_id)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        info!("🔊 Conectado al canal de voz {} en guild {}", channel_id, guild_id);
        Ok(VoiceConnection { guild_id, channel_id })
    }

    async fn move_to(
        &self,
        connection: &VoiceConnection,
        channel_id: ChannelId,
    ) -> Result<VoiceConnection, TransportError> {
        // Songbird mueve la llamada existente al volver a unirse en la misma guild
        self.manager
            .join(connection.guild_id, channel_id)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        info!(
            "🔀 Movido al canal {} en guild {}",
            channel_id, connection.guild_id
        );
        Ok(VoiceConnection {
            guild_id: connection.guild_id,
            channel_id,
        })
    }

    async fn is_connected(&self, connection: &VoiceConnection) -> bool {
        match self.manager.get(connection.guild_id) {
            Some(call) => call.lock().await.current_channel().is_some(),
            None => false,
        }
    }

    async fn play(
        &self,
        connection: &VoiceConnection,
        stream_url: &str,
        on_finish: FinishSignal,
    ) -> Result<(), TransportError> {
        let call = self.call(connection.guild_id)?;
        let input: Input = HttpRequest::new(self.http.clone(), stream_url.to_string()).into();

        let track = {
            let mut handler = call.lock().await;
            handler.play_only_input(input)
        };

        if let Err(e) = track.set_volume(self.volume) {
            debug!("No se pudo ajustar el volumen: {:?}", e);
        }

        for event in [TrackEvent::End, TrackEvent::Error] {
            track
                .add_event(
                    Event::Track(event),
                    TrackEndNotifier {
                        guild_id: connection.guild_id,
                        signal: on_finish.clone(),
                    },
                )
                .map_err(|e| TransportError::Playback(e.to_string()))?;
        }

        self.tracks.insert(connection.guild_id, track);
        Ok(())
    }

    async fn pause(&self, connection: &VoiceConnection) -> Result<(), TransportError> {
        self.track(connection.guild_id)?
            .pause()
            .map_err(|e| TransportError::Control(e.to_string()))?;
        info!("⏸️ Reproducción pausada en guild {}", connection.guild_id);
        Ok(())
    }

    async fn resume(&self, connection: &VoiceConnection) -> Result<(), TransportError> {
        self.track(connection.guild_id)?
            .play()
            .map_err(|e| TransportError::Control(e.to_string()))?;
        info!("▶️ Reproducción reanudada en guild {}", connection.guild_id);
        Ok(())
    }

    async fn stop(&self, connection: &VoiceConnection) -> Result<(), TransportError> {
        let (_, track) = self
            .tracks
            .remove(&connection.guild_id)
            .ok_or(TransportError::NoTrack(connection.guild_id))?;

        track
            .stop()
            .map_err(|e| TransportError::Control(e.to_string()))
    }

    async fn disconnect(&self, connection: &VoiceConnection) -> Result<(), TransportError> {
        if let Some((_, track)) = self.tracks.remove(&connection.guild_id) {
            let _ = track.stop();
        }

        self.manager
            .remove(connection.guild_id)
            .await
            .map_err(|e| TransportError::Control(e.to_string()))?;

        info!("👋 Desconectado del canal de voz en guild {}", connection.guild_id);
        Ok(())
    }

    async fn is_playing(&self, connection: &VoiceConnection) -> bool {
        matches!(self.play_mode(connection.guild_id).await, Some(PlayMode::Play))
    }

    async fn is_paused(&self, connection: &VoiceConnection) -> bool {
        matches!(self.play_mode(connection.guild_id).await, Some(PlayMode::Pause))
    }
}

/// Handler para cuando termina una canción (fin natural, error o stop)
struct TrackEndNotifier {
    guild_id: GuildId,
    signal: FinishSignal,
}

#[async_trait::async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(states) = ctx {
            for (state, _) in states.iter() {
                if let PlayMode::Errored(e) = &state.playing {
                    warn!("❌ Error de pista en guild {}: {:?}", self.guild_id, e);
                }
            }
        }

        if self.signal.fire() {
            debug!("⏹️ Pista terminada en guild {}", self.guild_id);
        }

        None
    }
}
