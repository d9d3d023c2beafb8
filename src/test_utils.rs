#![cfg(test)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::api::ApiError;
use crate::delivery::{Beacon, BeaconRequest, ReportSink};
use crate::models::{LeaveTarget, TerminationReport};
use crate::player::MediaElement;
use crate::utils::Clock;

/// Clock that only moves when told to
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }
}

/// Media element whose play-head is moved by the test
pub struct FakeMedia {
    position: Mutex<f64>,
    duration: Mutex<f64>,
    rate: Mutex<f64>,
    pause_calls: AtomicUsize,
}

impl FakeMedia {
    pub fn new(duration: f64) -> Self {
        Self {
            position: Mutex::new(0.0),
            duration: Mutex::new(duration),
            rate: Mutex::new(1.0),
            pause_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_position(&self, position: f64) {
        *self.position.lock().unwrap() = position;
    }

    pub fn set_duration(&self, duration: f64) {
        *self.duration.lock().unwrap() = duration;
    }

    pub fn set_rate(&self, rate: f64) {
        *self.rate.lock().unwrap() = rate;
    }

    pub fn pause_calls(&self) -> usize {
        self.pause_calls.load(Ordering::SeqCst)
    }
}

impl MediaElement for FakeMedia {
    fn current_time(&self) -> f64 {
        *self.position.lock().unwrap()
    }

    fn duration(&self) -> f64 {
        *self.duration.lock().unwrap()
    }

    fn playback_rate(&self) -> f64 {
        *self.rate.lock().unwrap()
    }

    fn pause(&self) {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Beacon that records every payload and answers with a fixed verdict
pub struct RecordingBeacon {
    accept: bool,
    sent: Mutex<Vec<BeaconRequest>>,
    attempts: AtomicUsize,
}

impl RecordingBeacon {
    pub fn accepting() -> Self {
        Self::with_verdict(true)
    }

    pub fn refusing() -> Self {
        Self::with_verdict(false)
    }

    fn with_verdict(accept: bool) -> Self {
        Self {
            accept,
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn sent(&self) -> Vec<BeaconRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn reports(&self) -> Vec<TerminationReport> {
        self.sent()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }
}

impl Beacon for RecordingBeacon {
    fn send_beacon(&self, url: &str, body: &[u8]) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.accept {
            self.sent.lock().unwrap().push(BeaconRequest {
                url: url.to_string(),
                body: body.to_vec(),
            });
        }
        self.accept
    }
}

/// Fallback sink that records reports, optionally failing every call
#[derive(Default)]
pub struct RecordingSink {
    fail: AtomicBool,
    reports: Mutex<Vec<(LeaveTarget, TerminationReport)>>,
    notify: Notify,
}

impl RecordingSink {
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        sink
    }

    pub fn reports(&self) -> Vec<(LeaveTarget, TerminationReport)> {
        self.reports.lock().unwrap().clone()
    }

    /// Wait until at least `count` reports arrived
    pub async fn wait_for(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if self.reports.lock().unwrap().len() >= count {
                    return;
                }
                self.notify.notified().await;
            }
        })
        .await
        .expect("fallback sink never received the report");
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn send_report(
        &self,
        target: &LeaveTarget,
        report: &TerminationReport,
    ) -> Result<(), ApiError> {
        self.reports
            .lock()
            .unwrap()
            .push((target.clone(), report.clone()));
        self.notify.notify_one();

        if self.fail.load(Ordering::SeqCst) {
            Err(ApiError::Network("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}
