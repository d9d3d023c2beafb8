use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::AnalyticsApi;
use crate::delivery::BeaconRequest;
use crate::utils::Result;

/// Counters reported when the dispatcher stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub failed: u64,
}

/// Long-lived worker posting payloads accepted by a `QueuedBeacon`.
///
/// It is started once per application, not per session, so a report queued
/// by a session that is being torn down still goes out.
pub struct BeaconDispatcher {
    api: AnalyticsApi,
    receiver: mpsc::Receiver<BeaconRequest>,
    cancel: CancellationToken,
    stats: DispatchStats,
}

/// Handle to a running dispatcher
pub struct BeaconDispatcherHandle {
    cancel: CancellationToken,
    task: JoinHandle<DispatchStats>,
}

impl BeaconDispatcher {
    pub fn spawn(
        api: AnalyticsApi,
        receiver: mpsc::Receiver<BeaconRequest>,
    ) -> BeaconDispatcherHandle {
        let cancel = CancellationToken::new();
        let dispatcher = Self {
            api,
            receiver,
            cancel: cancel.clone(),
            stats: DispatchStats::default(),
        };

        BeaconDispatcherHandle {
            cancel,
            task: tokio::spawn(dispatcher.run()),
        }
    }

    async fn run(mut self) -> DispatchStats {
        info!("Beacon dispatcher started");

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!("Beacon dispatcher cancelled, draining queue");
                    self.receiver.close();
                    while let Some(request) = self.receiver.recv().await {
                        self.dispatch(request).await;
                    }
                    break;
                }

                request = self.receiver.recv() => match request {
                    Some(request) => self.dispatch(request).await,
                    None => {
                        debug!("All beacons dropped, dispatcher exiting");
                        break;
                    }
                },
            }
        }

        info!(
            "Beacon dispatcher stopped: {} delivered, {} failed",
            self.stats.delivered, self.stats.failed
        );
        self.stats
    }

    async fn dispatch(&mut self, request: BeaconRequest) {
        match self.api.post_json_bytes(&request.url, request.body).await {
            Ok(()) => {
                debug!("Beacon payload delivered to {}", request.url);
                self.stats.delivered += 1;
            }
            Err(e) => {
                // No retries: a beacon is best effort by contract
                warn!("Beacon payload to {} failed: {}", request.url, e);
                self.stats.failed += 1;
            }
        }
    }
}

impl BeaconDispatcherHandle {
    /// Stop accepting new work, flush what is queued and return the counters
    pub async fn shutdown(self) -> Result<DispatchStats> {
        self.cancel.cancel();
        Ok(self.task.await?)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
