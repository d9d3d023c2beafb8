use std::sync::{Arc, Mutex};

use heatwatch::analytics::{SessionContext, SessionReporter, WatchPolicy};
use heatwatch::delivery::{Beacon, BeaconRequest, DeliveryStrategy, ReportSink};
use heatwatch::models::TerminationReport;
use heatwatch::player::{MediaElement, media_accessor};
use heatwatch::utils::SystemClock;
use url::Url;

pub const MOUNT_PATH: &str = "/acme/videos/intro";

/// Media element driven by the test
pub struct FakeMedia {
    position: Mutex<f64>,
    duration: f64,
}

impl FakeMedia {
    pub fn new(duration: f64) -> Arc<Self> {
        Arc::new(Self {
            position: Mutex::new(0.0),
            duration,
        })
    }

    pub fn seek_to(&self, position: f64) {
        *self.position.lock().unwrap() = position;
    }
}

impl MediaElement for FakeMedia {
    fn current_time(&self) -> f64 {
        *self.position.lock().unwrap()
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn pause(&self) {}
}

/// Beacon keeping every accepted payload in memory
#[derive(Default)]
pub struct CollectingBeacon {
    sent: Mutex<Vec<BeaconRequest>>,
}

impl CollectingBeacon {
    pub fn reports(&self) -> Vec<TerminationReport> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }
}

impl Beacon for CollectingBeacon {
    fn send_beacon(&self, url: &str, body: &[u8]) -> bool {
        self.sent.lock().unwrap().push(BeaconRequest {
            url: url.to_string(),
            body: body.to_vec(),
        });
        true
    }
}

pub fn mount(
    session_id: &str,
    media: Arc<FakeMedia>,
    policy: WatchPolicy,
    base_url: &str,
    beacon: Option<Arc<dyn Beacon>>,
    fallback: Arc<dyn ReportSink>,
) -> SessionReporter {
    let whole_time = media.duration();
    let delivery = DeliveryStrategy::new(Url::parse(base_url).unwrap(), beacon, fallback);

    SessionReporter::mount(
        SessionContext::new(session_id, "acme", "intro", MOUNT_PATH),
        whole_time,
        policy,
        media_accessor(media as Arc<dyn MediaElement>),
        delivery,
        Arc::new(SystemClock),
    )
}

/// Fallback for tests where the beacon always accepts
pub fn unused_sink() -> Arc<dyn ReportSink> {
    Arc::new(
        heatwatch::api::AnalyticsApi::new("http://127.0.0.1:9", std::time::Duration::from_secs(1))
            .unwrap(),
    )
}
