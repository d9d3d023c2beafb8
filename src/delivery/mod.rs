//! Two-tier delivery of termination reports.
//!
//! The primary tier is a [`Beacon`]: it answers synchronously with a boolean
//! and never errors. Only when it is missing or refuses the payload does the
//! secondary tier, an async [`ReportSink`], get spawned onto the runtime. In
//! both cases the caller returns immediately.

pub mod beacon;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::ApiError;
use crate::models::{LeaveTarget, TerminationReport};

pub use beacon::{Beacon, BeaconRequest, QueuedBeacon};

/// Ordinary async network call used when the beacon can't take a report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn send_report(
        &self,
        target: &LeaveTarget,
        report: &TerminationReport,
    ) -> Result<(), ApiError>;
}

/// Which tier took the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryAttempt {
    /// Accepted by the beacon
    Beacon,
    /// Handed to a spawned fallback request; its outcome is only logged
    Fallback,
    /// Neither tier could take it
    Dropped,
}

pub struct DeliveryStrategy {
    base_url: Url,
    beacon: Option<Arc<dyn Beacon>>,
    fallback: Arc<dyn ReportSink>,
}

impl DeliveryStrategy {
    pub fn new(
        base_url: Url,
        beacon: Option<Arc<dyn Beacon>>,
        fallback: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            base_url,
            beacon,
            fallback,
        }
    }

    /// Make the single delivery attempt for a report. Never blocks.
    pub fn deliver(&self, target: &LeaveTarget, report: TerminationReport) -> DeliveryAttempt {
        if self.try_beacon(target, &report) {
            info!(
                session_id = %report.session_id,
                tier = "beacon",
                "Leave report queued"
            );
            return DeliveryAttempt::Beacon;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(
                    session_id = %report.session_id,
                    "No async runtime for fallback delivery, leave report dropped"
                );
                return DeliveryAttempt::Dropped;
            }
        };

        info!(
            session_id = %report.session_id,
            tier = "fallback",
            "Leave report dispatched"
        );

        let sink = self.fallback.clone();
        let target = target.clone();
        handle.spawn(async move {
            if let Err(e) = sink.send_report(&target, &report).await {
                warn!(
                    session_id = %report.session_id,
                    transient = e.is_transient(),
                    "Fallback leave delivery failed: {}",
                    e
                );
            }
        });

        DeliveryAttempt::Fallback
    }

    fn try_beacon(&self, target: &LeaveTarget, report: &TerminationReport) -> bool {
        let Some(beacon) = &self.beacon else {
            return false;
        };

        let Some(url) = target.leave_url(&self.base_url) else {
            warn!("Base URL {} can't address the leave endpoint", self.base_url);
            return false;
        };

        let body = match report.to_json_bytes() {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to serialize leave report: {}", e);
                return false;
            }
        };

        let accepted = beacon.send_beacon(url.as_str(), &body);
        if !accepted {
            debug!("Beacon refused leave report, falling back");
        }
        accepted
    }
}
