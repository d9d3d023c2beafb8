pub mod hub;
pub mod signal;

pub use hub::{NavigationHub, NavigationHubStats, NavigationSubscription};
pub use signal::{LeaveTrigger, NavigationSignal};
