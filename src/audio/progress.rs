//! Elapsed-time bookkeeping and the now-playing progress bar.

use std::{sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::{error::NotifyError, session::PlaybackSession};

/// Segmentos de la barra de progreso
pub const BAR_SEGMENTS: usize = 20;
/// Se muestra en lugar de la barra cuando la duración es desconocida
pub const LIVE_MARKER: &str = "`🔴 En vivo, sin barra de progreso`";

const FILLED: &str = "▬";
const EMPTY: &str = "─";
const KNOB: &str = "🔘";

/// Reloj de reproducción que sobrevive a pausas y reanudaciones.
///
/// While playing, elapsed is `accumulated + (now - started_at)`; while paused it is
/// `accumulated`, which already includes the stretch played before the pause.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackClock {
    started_at: Option<Instant>,
    accumulated: Duration,
    paused: bool,
}

impl PlaybackClock {
    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.accumulated = Duration::ZERO;
        self.paused = false;
    }

    pub fn pause(&mut self, now: Instant) {
        if self.paused {
            return;
        }
        if let Some(started_at) = self.started_at {
            self.accumulated += now.saturating_duration_since(started_at);
        }
        self.paused = true;
    }

    pub fn resume(&mut self, now: Instant) {
        if self.paused {
            self.started_at = Some(now);
            self.paused = false;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(started_at) if !self.paused => {
                self.accumulated + now.saturating_duration_since(started_at)
            }
            _ => self.accumulated,
        }
    }
}

/// Formatea segundos como `mm:ss`
pub fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Renders the progress line shown in the now-playing embed.
pub fn render_progress(elapsed: Duration, duration_secs: u64) -> String {
    if duration_secs == 0 {
        return LIVE_MARKER.to_string();
    }

    let ratio = elapsed.as_secs_f64() / duration_secs as f64;
    let filled = ((ratio * BAR_SEGMENTS as f64) as usize).min(BAR_SEGMENTS);

    format!(
        "`{}` {}{}{} `{}`",
        format_time(elapsed.as_secs().min(duration_secs)),
        FILLED.repeat(filled),
        KNOB,
        EMPTY.repeat(BAR_SEGMENTS - filled),
        format_time(duration_secs),
    )
}

/// Resultado de un ciclo del tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressTick {
    Updated,
    Unchanged,
    /// La sesión ya no está reproduciendo ni en pausa
    Inactive,
    Failed(NotifyError),
}

/// Tarea concurrente que refresca la barra de progreso de la canción actual.
///
/// Started and stopped only by the player loop, one instance per song.
pub struct ProgressTracker {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ProgressTracker {
    pub fn spawn(
        session: Arc<PlaybackSession>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let task = tokio::spawn(run(session, interval, cancel.clone()));
        Self { cancel, task }
    }

    /// Cancela la tarea y espera a que termine
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                error!("💥 El tracker de progreso falló: {:?}", e);
            }
        }
    }
}

async fn run(session: Arc<PlaybackSession>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match session.push_progress().await {
            ProgressTick::Updated | ProgressTick::Unchanged => {}
            ProgressTick::Inactive => break,
            ProgressTick::Failed(e) => {
                debug!("Tracker detenido en guild {}: {}", session.guild_id(), e);
                break;
            }
        }
    }
}
