use tracing::warn;

use crate::constants::{MAX_SEGMENTS, SEGMENT_SECONDS, WATCHED_RATIO};

/// Slack for float error when summing many sub-second intervals
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Result of classifying every segment against the watched threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// '1' for watched, '0' otherwise, index 0 first
    pub bits: String,
    /// Sum of the nominal lengths of watched segments
    pub watched_seconds: f64,
}

/// Per-segment watched-time totals for one playback session.
///
/// The video is cut into fixed-size segments; each holds the seconds of
/// playback credited to it. Callers are responsible for passing each elapsed
/// range once: overlapping ranges are counted twice, so a segment's total only
/// stays within its nominal length under non-overlapping accumulation.
#[derive(Debug, Clone)]
pub struct SegmentAccumulator {
    whole_time: f64,
    segment_seconds: f64,
    watched_ratio: f64,
    segments: Vec<f64>,
}

impl SegmentAccumulator {
    pub fn new(whole_time: f64) -> Self {
        Self::with_granularity(whole_time, SEGMENT_SECONDS, WATCHED_RATIO)
    }

    pub fn with_granularity(whole_time: f64, segment_seconds: f64, watched_ratio: f64) -> Self {
        let mut accumulator = Self {
            whole_time: 0.0,
            segment_seconds,
            watched_ratio,
            segments: Vec::new(),
        };
        accumulator.initialize(whole_time);
        accumulator
    }

    /// Discard all counters and size them for a new duration.
    ///
    /// A non-positive or non-finite duration leaves zero segments, which turns
    /// every other operation into a no-op. So does one needing more than
    /// `MAX_SEGMENTS` segments.
    pub fn initialize(&mut self, whole_time: f64) {
        self.segments.clear();
        self.whole_time = 0.0;

        if !whole_time.is_finite() || whole_time <= 0.0 || self.segment_seconds <= 0.0 {
            return;
        }

        let count = (whole_time / self.segment_seconds).ceil();
        if !count.is_finite() || count > MAX_SEGMENTS as f64 {
            warn!(
                "Duration {}s needs {} segments, more than {}; ignoring it",
                whole_time, count, MAX_SEGMENTS
            );
            return;
        }

        self.whole_time = whole_time;
        self.segments.resize(count as usize, 0.0);
    }

    /// Credit `[from, to)` to every segment it overlaps, clipped to the video.
    ///
    /// Totals are not capped at the nominal length: rewatching a range after
    /// a backward seek adds to it again. Classification is a threshold, so
    /// the extra credit never changes the bits or the rate.
    pub fn accumulate(&mut self, from: f64, to: f64) {
        if self.segments.is_empty() || !from.is_finite() || !to.is_finite() {
            return;
        }

        let from = from.max(0.0);
        let to = to.min(self.whole_time);
        if to <= from {
            return;
        }

        let first = (from / self.segment_seconds).floor() as usize;
        let last = ((to / self.segment_seconds).ceil() as usize).min(self.segments.len());

        for index in first..last {
            let seg_start = index as f64 * self.segment_seconds;
            let seg_end = seg_start + self.segment_seconds;
            let delta = to.min(seg_end) - from.max(seg_start);
            if delta > 0.0 {
                self.segments[index] += delta;
            }
        }
    }

    /// Nominal length of a segment: full width, except the final one which
    /// only covers the remainder of the video.
    pub fn nominal_length(&self, index: usize) -> f64 {
        if index + 1 != self.segments.len() {
            return self.segment_seconds;
        }

        let remainder = self.whole_time - index as f64 * self.segment_seconds;
        if remainder <= 0.0 {
            self.segment_seconds
        } else {
            remainder
        }
    }

    pub fn classify(&self) -> Classification {
        let mut bits = String::with_capacity(self.segments.len());
        let mut watched_seconds = 0.0;

        for (index, accumulated) in self.segments.iter().enumerate() {
            let nominal = self.nominal_length(index);
            if accumulated + THRESHOLD_EPSILON >= nominal * self.watched_ratio {
                bits.push('1');
                watched_seconds += nominal;
            } else {
                bits.push('0');
            }
        }

        Classification {
            bits,
            watched_seconds,
        }
    }

    /// Integer percent of the video covered by watched segments
    pub fn overall_rate(&self) -> u8 {
        self.overall_rate_of(&self.classify())
    }

    pub fn overall_rate_of(&self, classification: &Classification) -> u8 {
        if self.whole_time <= 0.0 {
            return 0;
        }
        let rate = (100.0 * classification.watched_seconds / self.whole_time).min(100.0);
        rate.round().clamp(0.0, 100.0) as u8
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[f64] {
        &self.segments
    }

    pub fn whole_time(&self) -> f64 {
        self.whole_time
    }

    pub fn segment_seconds(&self) -> f64 {
        self.segment_seconds
    }
}
