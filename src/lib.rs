// Watch analytics for embedded video players: segment accumulation,
// session lifecycle and leave-report delivery

pub mod analytics;
pub mod api;
pub mod config;
pub mod constants;
pub mod delivery;
pub mod models;
pub mod navigation;
pub mod player;
pub mod utils;
pub mod workers;

#[cfg(test)]
mod test_utils;

pub use analytics::{SegmentAccumulator, SessionContext, SessionReporter, WatchPolicy};
pub use api::{AnalyticsApi, ApiError};
pub use config::Config;
pub use delivery::{Beacon, DeliveryAttempt, DeliveryStrategy, QueuedBeacon, ReportSink};
pub use models::{LeaveTarget, OrgId, SessionId, TerminationReport, VideoId};
pub use navigation::{NavigationHub, NavigationSignal};
pub use player::{MediaElement, PlayerEvent};
pub use utils::{AnalyticsError, Result};
pub use workers::{BeaconDispatcher, SessionSummary, WatchSession};
