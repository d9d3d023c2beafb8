pub mod clock;
pub mod errors;

pub use clock::{Clock, SystemClock};
pub use errors::{AnalyticsError, Result};
