mod identifiers;
mod report;

pub use identifiers::{OrgId, SessionId, VideoId};
pub use report::{LeaveTarget, TerminationReport};
