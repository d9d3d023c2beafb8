/// Background tasks driving sessions and report delivery
pub mod beacon_dispatcher;
pub mod watch_session;

pub use beacon_dispatcher::{BeaconDispatcher, BeaconDispatcherHandle, DispatchStats};
pub use watch_session::{SessionSummary, WatchSession, WatchSessionInput};
