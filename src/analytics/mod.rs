pub mod accumulator;
pub mod heatmap;
pub mod policy;
pub mod reporter;
pub mod session;

pub use accumulator::{Classification, SegmentAccumulator};
pub use heatmap::{HeatmapCell, aggregate_segments, build_heatmap};
pub use policy::WatchPolicy;
pub use reporter::{SessionOutcome, SessionReporter};
pub use session::{PlaybackSession, SessionContext, SessionPhase, Termination};
