use std::time::Duration;

use crate::constants::{
    JITTER_TOLERANCE_SECS, NEAR_END_MIN_DURATION_SECS, NEAR_END_MIN_ELAPSED_SECS,
    NEAR_END_WINDOW_SECS, SEGMENT_SECONDS, TICK_INTERVAL_MS, WATCHED_RATIO,
};
use crate::utils::{AnalyticsError, Result};

/// Tunable heuristics for crediting watch time.
///
/// None of these values are structural; the defaults match what the
/// backend's dashboards were calibrated against.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchPolicy {
    pub segment_seconds: f64,
    pub watched_ratio: f64,
    pub jitter_tolerance_secs: f64,
    pub near_end_window_secs: f64,
    pub near_end_min_duration_secs: f64,
    pub near_end_min_elapsed: Duration,
    pub tick_interval: Duration,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            segment_seconds: SEGMENT_SECONDS,
            watched_ratio: WATCHED_RATIO,
            jitter_tolerance_secs: JITTER_TOLERANCE_SECS,
            near_end_window_secs: NEAR_END_WINDOW_SECS,
            near_end_min_duration_secs: NEAR_END_MIN_DURATION_SECS,
            near_end_min_elapsed: Duration::from_secs(NEAR_END_MIN_ELAPSED_SECS),
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
        }
    }
}

impl WatchPolicy {
    pub fn validate(&self) -> Result<()> {
        if !(self.segment_seconds.is_finite() && self.segment_seconds > 0.0) {
            return Err(AnalyticsError::Configuration(format!(
                "segment_seconds must be positive, got {}",
                self.segment_seconds
            )));
        }
        if !(self.watched_ratio > 0.0 && self.watched_ratio <= 1.0) {
            return Err(AnalyticsError::Configuration(format!(
                "watched_ratio must be in (0, 1], got {}",
                self.watched_ratio
            )));
        }
        if !(self.jitter_tolerance_secs.is_finite() && self.jitter_tolerance_secs > 0.0) {
            return Err(AnalyticsError::Configuration(format!(
                "jitter_tolerance_secs must be positive, got {}",
                self.jitter_tolerance_secs
            )));
        }
        if self.tick_interval.is_zero() {
            return Err(AnalyticsError::Configuration(
                "tick_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Largest per-tick advance accepted as continuous playback.
    ///
    /// Faster playback legitimately moves the play-head further per tick, so
    /// the tolerance widens with rates above 1x. At 1x or slower it is the
    /// configured value unchanged.
    pub fn jitter_tolerance(&self, playback_rate: f64) -> f64 {
        let rate = if playback_rate.is_finite() {
            playback_rate.max(1.0)
        } else {
            1.0
        };
        self.jitter_tolerance_secs * rate
    }

    /// Whether `position` counts as having reached the end of a `duration`
    /// long video, `elapsed` into the session.
    pub fn is_near_end(&self, position: f64, duration: f64, elapsed: Duration) -> bool {
        if !position.is_finite() || !duration.is_finite() {
            return false;
        }
        duration >= self.near_end_min_duration_secs
            && position >= duration - self.near_end_window_secs
            && elapsed >= self.near_end_min_elapsed
    }
}
