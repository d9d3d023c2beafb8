use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace};

use super::accumulator::SegmentAccumulator;
use super::policy::WatchPolicy;
use super::session::{PlaybackSession, SessionContext, SessionPhase, Termination};
use crate::delivery::{DeliveryAttempt, DeliveryStrategy};
use crate::models::TerminationReport;
use crate::navigation::{LeaveTrigger, NavigationSignal};
use crate::player::{MediaAccessor, PlayerEvent};
use crate::utils::Clock;

/// What a session produced when it terminated.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub termination: Termination,
    pub report: TerminationReport,
    pub delivery: DeliveryAttempt,
}

/// Lifecycle state machine for one mounted player.
///
/// Every input (player events, ticks, navigation) is handled synchronously
/// and never fails outward: anomalies degrade to doing nothing. The first
/// terminal trigger builds and delivers the report; every later one is a
/// no-op.
pub struct SessionReporter {
    session: PlaybackSession,
    accumulator: SegmentAccumulator,
    policy: WatchPolicy,
    media: MediaAccessor,
    delivery: DeliveryStrategy,
    clock: Arc<dyn Clock>,
    outcome: Option<SessionOutcome>,
}

impl SessionReporter {
    /// Join a new session for a freshly mounted player
    pub fn mount(
        context: SessionContext,
        whole_time: f64,
        policy: WatchPolicy,
        media: MediaAccessor,
        delivery: DeliveryStrategy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let accumulator = SegmentAccumulator::with_granularity(
            whole_time,
            policy.segment_seconds,
            policy.watched_ratio,
        );
        let session = PlaybackSession::new(context, whole_time, clock.now());

        let mut reporter = Self {
            session,
            accumulator,
            policy,
            media,
            delivery,
            clock,
            outcome: None,
        };

        if let Some(position) = reporter.position() {
            reporter.session.rebase(position);
        }
        reporter.session.phase = SessionPhase::Joined;

        info!(
            session_id = %reporter.session.context.session_id,
            video_id = %reporter.session.context.video_id,
            segments = reporter.accumulator.segment_count(),
            "Playback session joined"
        );

        reporter
    }

    /// Duration became known (or changed) after mount
    pub fn set_whole_time(&mut self, whole_time: f64) {
        if self.session.has_ended {
            return;
        }
        if whole_time == self.session.whole_time {
            return;
        }

        debug!(
            session_id = %self.session.context.session_id,
            "Duration changed from {} to {}, resetting segments",
            self.session.whole_time,
            whole_time
        );
        self.session.whole_time = whole_time;
        self.accumulator.initialize(whole_time);
    }

    pub fn handle_player_event(&mut self, event: PlayerEvent) {
        if self.session.has_ended {
            trace!("Ignoring {} after termination", event.as_str());
            return;
        }

        match event {
            PlayerEvent::Play => {
                self.session.is_playing = true;
                if let Some(position) = self.position() {
                    self.session.rebase(position);
                }
            }
            PlayerEvent::Pause => {
                if let Some(position) = self.position() {
                    let credit = self.session.is_playing
                        && !self.session.is_seeking
                        && !self.near_end(position);
                    if credit {
                        self.accumulator
                            .accumulate(self.session.last_known_position, position);
                        self.session.rebase(position);
                    }
                }
                self.session.is_playing = false;
            }
            PlayerEvent::Seeking => {
                self.session.is_seeking = true;
            }
            PlayerEvent::Seeked => {
                self.session.is_seeking = false;
                if let Some(position) = self.position() {
                    self.session.rebase(position);
                }
            }
            PlayerEvent::Ended => self.terminate(Termination::Ended),
        }
    }

    /// Periodic position sample
    pub fn tick(&mut self) {
        if self.session.has_ended {
            return;
        }
        let Some(position) = self.position() else {
            return;
        };

        if self.session.is_playing && !self.session.is_seeking {
            let diff = position - self.session.last_known_position;
            if diff != 0.0 {
                if diff.abs() < self.jitter_tolerance() {
                    self.accumulator
                        .accumulate(self.session.last_known_position, position);
                } else {
                    trace!("Position jumped {:.2}s without a seek, not credited", diff);
                }
                self.session.rebase(position);
            }
        }

        // Safety net for players that never fire `ended`
        if self.near_end(position) {
            debug!(
                session_id = %self.session.context.session_id,
                "Near-end heuristic matched at {:.1}s",
                position
            );
            self.terminate(Termination::Ended);
        }
    }

    pub fn handle_navigation(&mut self, signal: &NavigationSignal) {
        if self.session.has_ended {
            return;
        }
        if !signal.leaves(&self.session.context.mount_path) {
            trace!("Navigation {:?} stays on the player page", signal);
            return;
        }

        self.terminate(Termination::Left(signal.trigger()));
    }

    /// Host is tearing the player down
    pub fn unmount(&mut self) -> Option<&SessionOutcome> {
        if !self.session.has_ended {
            self.terminate(Termination::Left(LeaveTrigger::Unmount));
        }
        self.outcome.as_ref()
    }

    pub fn is_terminated(&self) -> bool {
        self.session.has_ended
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn accumulator(&self) -> &SegmentAccumulator {
        &self.accumulator
    }

    fn terminate(&mut self, termination: Termination) {
        let was_playing = self.session.is_playing;
        let was_seeking = self.session.is_seeking;

        if !self.session.latch(termination) {
            debug!(
                session_id = %self.session.context.session_id,
                "Session already terminated, ignoring {:?}",
                termination
            );
            return;
        }

        match termination {
            Termination::Ended => {
                if !was_seeking {
                    let end = self.duration();
                    self.accumulator
                        .accumulate(self.session.last_known_position, end);
                    self.session.rebase(end);
                }
            }
            Termination::Left(_) => {
                let media = (self.media)();
                let position = media
                    .as_ref()
                    .map(|m| m.current_time())
                    .filter(|p| p.is_finite());
                if let Some(media) = media {
                    media.pause();
                }

                if let Some(position) = position.filter(|_| was_playing && !was_seeking) {
                    let diff = position - self.session.last_known_position;
                    if diff > 0.0 && diff < self.jitter_tolerance() {
                        self.accumulator
                            .accumulate(self.session.last_known_position, position);
                    }
                    self.session.rebase(position);
                }
            }
        }

        let report = TerminationReport::build(
            self.session.context.session_id.clone(),
            &self.accumulator,
            self.session.last_known_position,
            termination.is_quit(),
        );

        info!(
            session_id = %report.session_id,
            watch_rate = report.watch_rate,
            is_quit = report.is_quit,
            "Playback session terminated: {:?}",
            termination
        );

        let delivery = self
            .delivery
            .deliver(&self.session.context.leave_target(), report.clone());

        self.outcome = Some(SessionOutcome {
            termination,
            report,
            delivery,
        });
    }

    fn position(&self) -> Option<f64> {
        (self.media)()
            .map(|m| m.current_time())
            .filter(|p| p.is_finite())
    }

    /// Media element's duration when it knows it, else the nominal one
    fn duration(&self) -> f64 {
        (self.media)()
            .map(|m| m.duration())
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(self.session.whole_time)
    }

    fn jitter_tolerance(&self) -> f64 {
        let rate = (self.media)().map(|m| m.playback_rate()).unwrap_or(1.0);
        self.policy.jitter_tolerance(rate)
    }

    fn elapsed(&self) -> Duration {
        self.clock
            .now()
            .saturating_duration_since(self.session.started_at)
    }

    fn near_end(&self, position: f64) -> bool {
        self.policy
            .is_near_end(position, self.duration(), self.elapsed())
    }
}
