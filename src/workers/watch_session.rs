use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::analytics::{SessionReporter, Termination};
use crate::delivery::DeliveryAttempt;
use crate::models::{OrgId, SessionId, TerminationReport, VideoId};
use crate::navigation::NavigationSubscription;
use crate::player::PlayerEvent;
use crate::utils::Result;

/// Inputs the host feeds a running session
#[derive(Debug, Clone, PartialEq)]
pub enum WatchSessionInput {
    Player(PlayerEvent),
    /// Duration became known (or changed) after metadata load
    SetWholeTime(f64),
    Unmount,
}

/// What a finished session looked like, for the host to log or inspect.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub org_id: OrgId,
    pub video_id: VideoId,
    pub joined_at: DateTime<Utc>,
    pub termination: Option<Termination>,
    pub report: Option<TerminationReport>,
    pub delivery: Option<DeliveryAttempt>,
}

impl SessionSummary {
    fn from_reporter(reporter: &SessionReporter) -> Self {
        let session = reporter.session();
        let outcome = reporter.outcome().cloned();

        Self {
            session_id: session.context.session_id.clone(),
            org_id: session.context.org_id.clone(),
            video_id: session.context.video_id.clone(),
            joined_at: session.joined_at,
            termination: outcome.as_ref().map(|o| o.termination),
            report: outcome.as_ref().map(|o| o.report.clone()),
            delivery: outcome.map(|o| o.delivery),
        }
    }
}

/// Handle to a mounted session running on its own task.
///
/// The task owns the `SessionReporter` outright, so player events, ticks and
/// navigation are applied one at a time in arrival order. It stops as soon as
/// the session terminates or the host unmounts, dropping its navigation
/// subscription on the way out.
pub struct WatchSession {
    session_id: SessionId,
    sender: mpsc::UnboundedSender<WatchSessionInput>,
    task: JoinHandle<SessionSummary>,
}

impl WatchSession {
    pub fn spawn(
        reporter: SessionReporter,
        navigation: NavigationSubscription,
        tick_interval: Duration,
    ) -> Self {
        let session_id = reporter.session().context.session_id.clone();
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_session(reporter, navigation, receiver, tick_interval));

        Self {
            session_id,
            sender,
            task,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Forward a player event. Returns false once the session has stopped.
    pub fn player_event(&self, event: PlayerEvent) -> bool {
        self.send(WatchSessionInput::Player(event))
    }

    pub fn set_whole_time(&self, whole_time: f64) -> bool {
        self.send(WatchSessionInput::SetWholeTime(whole_time))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Tear the player down and wait for the session's summary.
    ///
    /// A session that already terminated on its own just hands back its
    /// summary; the unmount is a no-op for it.
    pub async fn unmount(self) -> Result<SessionSummary> {
        self.send(WatchSessionInput::Unmount);
        Ok(self.task.await?)
    }

    fn send(&self, input: WatchSessionInput) -> bool {
        match self.sender.send(input) {
            Ok(()) => true,
            Err(e) => {
                trace!(
                    session_id = %self.session_id,
                    "Session already stopped, dropping {:?}",
                    e.0
                );
                false
            }
        }
    }
}

async fn run_session(
    mut reporter: SessionReporter,
    mut navigation: NavigationSubscription,
    mut inputs: mpsc::UnboundedReceiver<WatchSessionInput>,
    tick_interval: Duration,
) -> SessionSummary {
    let session_id = reporter.session().context.session_id.clone();
    let mut ticker = tokio::time::interval_at(Instant::now() + tick_interval, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut navigation_open = true;

    debug!(session_id = %session_id, "Watch session task started");

    while !reporter.is_terminated() {
        tokio::select! {
            biased;

            input = inputs.recv() => match input {
                Some(WatchSessionInput::Player(event)) => reporter.handle_player_event(event),
                Some(WatchSessionInput::SetWholeTime(whole_time)) => {
                    reporter.set_whole_time(whole_time)
                }
                // A dropped handle tears the player down as well
                Some(WatchSessionInput::Unmount) | None => {
                    reporter.unmount();
                }
            },

            signal = navigation.recv(), if navigation_open => match signal {
                Some(signal) => reporter.handle_navigation(&signal),
                None => {
                    debug!(session_id = %session_id, "Navigation hub closed");
                    navigation_open = false;
                }
            },

            _ = ticker.tick() => reporter.tick(),
        }
    }

    drop(navigation);

    let summary = SessionSummary::from_reporter(&reporter);
    info!(
        session_id = %session_id,
        termination = ?summary.termination,
        delivery = ?summary.delivery,
        "Watch session task finished"
    );

    summary
}
