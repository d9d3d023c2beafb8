use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::models::{LeaveTarget, OrgId, SessionId, VideoId};
use crate::navigation::LeaveTrigger;

/// Where a session sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Joined,
    Ended,
    Left,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "trigger")]
pub enum Termination {
    /// The player fired `ended`, or the near-end heuristic matched
    Ended,
    Left(LeaveTrigger),
}

impl Termination {
    pub fn is_quit(&self) -> bool {
        matches!(self, Termination::Left(_))
    }

    pub fn phase(&self) -> SessionPhase {
        match self {
            Termination::Ended => SessionPhase::Ended,
            Termination::Left(_) => SessionPhase::Left,
        }
    }
}

/// Identity of a mounted player instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: SessionId,
    pub org_id: OrgId,
    pub video_id: VideoId,
    /// Path the player was mounted on; navigation back to it is not a leave
    pub mount_path: String,
}

impl SessionContext {
    pub fn new(
        session_id: impl Into<SessionId>,
        org_id: impl Into<OrgId>,
        video_id: impl Into<VideoId>,
        mount_path: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            org_id: org_id.into(),
            video_id: video_id.into(),
            mount_path: mount_path.into(),
        }
    }

    pub fn leave_target(&self) -> LeaveTarget {
        LeaveTarget::new(self.org_id.clone(), self.video_id.clone())
    }
}

/// Mutable per-session playback state.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub context: SessionContext,
    pub whole_time: f64,
    pub phase: SessionPhase,
    /// Baseline for the next accumulated interval
    pub last_known_position: f64,
    pub is_playing: bool,
    pub is_seeking: bool,
    /// Latch: flips once, on the first terminal trigger
    pub has_ended: bool,
    pub started_at: Instant,
    pub joined_at: DateTime<Utc>,
}

impl PlaybackSession {
    pub fn new(context: SessionContext, whole_time: f64, started_at: Instant) -> Self {
        Self {
            context,
            whole_time,
            phase: SessionPhase::Idle,
            last_known_position: 0.0,
            is_playing: false,
            is_seeking: false,
            has_ended: false,
            started_at,
            joined_at: Utc::now(),
        }
    }

    /// Move the accumulation baseline without crediting anything
    pub fn rebase(&mut self, position: f64) {
        if position.is_finite() {
            self.last_known_position = position.max(0.0);
        }
    }

    /// Flip the latch. Returns false if the session already terminated.
    pub fn latch(&mut self, termination: Termination) -> bool {
        if self.has_ended {
            return false;
        }
        self.has_ended = true;
        self.is_playing = false;
        self.is_seeking = false;
        self.phase = termination.phase();
        true
    }
}
