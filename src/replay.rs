//! Offline replay of recorded playback traces.
//!
//! A trace is a JSON document listing what the viewer did and when. Each step
//! moves a simulated clock and play-head, then feeds one input to a real
//! `SessionReporter`, so the resulting report is exactly what a live session
//! would have sent.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;

use heatwatch::analytics::{SessionOutcome, SessionReporter};
use heatwatch::navigation::NavigationSignal;
use heatwatch::player::{MediaElement, PlayerEvent};
use heatwatch::utils::Clock;

#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    /// Nominal duration; the command line may override it
    #[serde(default)]
    pub whole_time: Option<f64>,
    #[serde(default)]
    pub mount_path: Option<String>,
    pub steps: Vec<TraceStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceStep {
    /// Seconds since mount
    pub at: f64,
    /// Play-head position to set before the action
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(flatten)]
    pub action: TraceAction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum TraceAction {
    Play,
    Pause,
    /// Seeking, jump to `to`, seeked
    Seek { to: f64 },
    Ended,
    Tick,
    /// Route change inside the app
    Navigate { path: String },
    /// Metadata reported a (new) duration
    Duration { seconds: f64 },
    /// Speed change, e.g. 2.0 for double speed
    Rate { value: f64 },
    Unload,
}

impl Trace {
    pub fn from_json(contents: &str) -> Result<Self> {
        let trace: Trace = serde_json::from_str(contents).context("Failed to parse trace")?;

        let mut previous = 0.0;
        for (index, step) in trace.steps.iter().enumerate() {
            if !step.at.is_finite() || step.at < previous {
                bail!("Step {} goes back in time ({}s after {}s)", index, step.at, previous);
            }
            previous = step.at;
        }

        Ok(trace)
    }
}

/// Clock moved forward by the trace instead of real time
pub struct ReplayClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ReplayClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    fn set(&self, since_mount: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset = since_mount;
        }
    }
}

impl Clock for ReplayClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().map(|o| *o).unwrap_or_default();
        self.base + offset
    }
}

#[derive(Debug, Clone, Copy)]
struct MediaState {
    position: f64,
    duration: f64,
    rate: f64,
}

/// Media element whose play-head only moves when a step says so
pub struct SimulatedMedia {
    state: Mutex<MediaState>,
}

impl SimulatedMedia {
    pub fn new(duration: f64) -> Self {
        Self {
            state: Mutex::new(MediaState {
                position: 0.0,
                duration,
                rate: 1.0,
            }),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MediaState)) {
        if let Ok(mut state) = self.state.lock() {
            apply(&mut state);
        }
    }

    fn read<T>(&self, read: impl FnOnce(&MediaState) -> T, fallback: T) -> T {
        self.state.lock().map(|s| read(&*s)).unwrap_or(fallback)
    }
}

impl MediaElement for SimulatedMedia {
    fn current_time(&self) -> f64 {
        self.read(|s| s.position, f64::NAN)
    }

    fn duration(&self) -> f64 {
        self.read(|s| s.duration, f64::NAN)
    }

    fn playback_rate(&self) -> f64 {
        self.read(|s| s.rate, 1.0)
    }

    fn pause(&self) {}
}

/// Run every step, then unmount, and return what the session produced.
pub fn replay(
    trace: &Trace,
    reporter: &mut SessionReporter,
    media: &SimulatedMedia,
    clock: &ReplayClock,
) -> Option<SessionOutcome> {
    for step in &trace.steps {
        if reporter.is_terminated() {
            debug!("Session terminated, skipping remaining steps");
            break;
        }

        clock.set(Duration::from_secs_f64(step.at));
        if let Some(position) = step.position {
            media.update(|s| s.position = position);
        }

        match &step.action {
            TraceAction::Play => reporter.handle_player_event(PlayerEvent::Play),
            TraceAction::Pause => reporter.handle_player_event(PlayerEvent::Pause),
            TraceAction::Seek { to } => {
                reporter.handle_player_event(PlayerEvent::Seeking);
                media.update(|s| s.position = *to);
                reporter.handle_player_event(PlayerEvent::Seeked);
            }
            TraceAction::Ended => reporter.handle_player_event(PlayerEvent::Ended),
            TraceAction::Tick => reporter.tick(),
            TraceAction::Navigate { path } => {
                reporter.handle_navigation(&NavigationSignal::HistoryPush { path: path.clone() })
            }
            TraceAction::Duration { seconds } => {
                media.update(|s| s.duration = *seconds);
                reporter.set_whole_time(*seconds);
            }
            TraceAction::Rate { value } => media.update(|s| s.rate = *value),
            TraceAction::Unload => reporter.handle_navigation(&NavigationSignal::BeforeUnload),
        }
    }

    reporter.unmount().cloned()
}
