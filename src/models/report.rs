use serde::{Deserialize, Serialize};
use url::Url;

use super::{OrgId, SessionId, VideoId};
use crate::analytics::SegmentAccumulator;

/// Final artifact of a playback session, posted to the leave endpoint.
///
/// Built exactly once per session and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationReport {
    pub session_id: SessionId,
    /// Integer percent of the video's duration covered by watched segments
    pub watch_rate: u8,
    /// One '0'/'1' per segment, index 0 first
    pub watch_segments: String,
    /// Floor of the last known play-head position, in seconds
    pub recent_position: u64,
    /// False only when the session reached the natural end of the video
    pub is_quit: bool,
}

impl TerminationReport {
    pub fn build(
        session_id: SessionId,
        accumulator: &SegmentAccumulator,
        last_position: f64,
        is_quit: bool,
    ) -> Self {
        let classification = accumulator.classify();

        Self {
            session_id,
            watch_rate: accumulator.overall_rate_of(&classification),
            watch_segments: classification.bits,
            recent_position: whole_seconds(last_position),
            is_quit,
        }
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn whole_seconds(position: f64) -> u64 {
    if position.is_finite() && position > 0.0 {
        position.floor() as u64
    } else {
        0
    }
}

/// The (organization, video) pair a leave report is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaveTarget {
    pub org_id: OrgId,
    pub video_id: VideoId,
}

impl LeaveTarget {
    pub fn new(org_id: impl Into<OrgId>, video_id: impl Into<VideoId>) -> Self {
        Self {
            org_id: org_id.into(),
            video_id: video_id.into(),
        }
    }

    /// Path segments of `/{orgId}/video/{videoId}/leave`
    pub fn path_segments(&self) -> [&str; 4] {
        [self.org_id.as_str(), "video", self.video_id.as_str(), "leave"]
    }

    /// Leave endpoint under `base`, ids percent-encoded. `None` when `base`
    /// can't carry a path (e.g. `mailto:`).
    pub fn leave_url(&self, base: &Url) -> Option<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(self.path_segments());
        Some(url)
    }
}
