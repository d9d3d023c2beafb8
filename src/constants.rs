// Watch-analytics policy defaults - adjust these to tune how generously watch time is credited
// All heuristic constants in one place for easy tuning

// === Segmentation ===
/// Width of one heatmap segment in seconds
pub const SEGMENT_SECONDS: f64 = 10.0;
/// Fraction of a segment's nominal length that must be accumulated for it to count as watched
pub const WATCHED_RATIO: f64 = 0.9;
/// Upper bound on segments per video; longer durations are treated as malformed
pub const MAX_SEGMENTS: usize = 1_000_000;

// === Sampling ===
/// Interval between position samples
pub const TICK_INTERVAL_MS: u64 = 1000;
/// Largest position advance between two ticks still treated as continuous playback
pub const JITTER_TOLERANCE_SECS: f64 = 2.1;

// === Near-end heuristic ===
/// Distance from the end of the video that counts as "finished"
pub const NEAR_END_WINDOW_SECS: f64 = 9.0;
/// Videos shorter than this never trigger the near-end heuristic
pub const NEAR_END_MIN_DURATION_SECS: f64 = 15.0;
/// Wall-clock time a session must have existed before the near-end heuristic may fire
pub const NEAR_END_MIN_ELAPSED_SECS: u64 = 5;

// === Delivery ===
pub const BEACON_QUEUE_CAPACITY: usize = 64;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
