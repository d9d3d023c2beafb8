use std::sync::Arc;
use std::time::Duration;

use heatwatch::analytics::WatchPolicy;
use heatwatch::api::AnalyticsApi;
use heatwatch::delivery::{Beacon, DeliveryAttempt, QueuedBeacon};
use heatwatch::navigation::{NavigationHub, NavigationSignal};
use heatwatch::player::PlayerEvent;
use heatwatch::workers::{BeaconDispatcher, DispatchStats, WatchSession};
use mockito::{Matcher, Mock, Server};
use serde_json::json;

use crate::common::{FakeMedia, mount};

async fn wait_until_matched(mock: &Mock) {
    for _ in 0..250 {
        if mock.matched_async().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_leave_without_beacon_uses_http_fallback() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/acme/video/intro/leave")
        .match_body(Matcher::Json(json!({
            "session_id": "sess-fallback",
            "watch_rate": 0,
            "watch_segments": "000",
            "recent_position": 0,
            "is_quit": true
        })))
        .with_status(200)
        .create_async()
        .await;

    let api = AnalyticsApi::new(&server.url(), Duration::from_secs(5)).unwrap();
    let hub = NavigationHub::default();
    let reporter = mount(
        "sess-fallback",
        FakeMedia::new(30.0),
        WatchPolicy::default(),
        &server.url(),
        None,
        Arc::new(api),
    );
    let session = WatchSession::spawn(reporter, hub.subscribe(), Duration::from_secs(1));

    hub.publish(NavigationSignal::LinkClick {
        href: "/acme/videos".to_string(),
    });
    let summary = session.unmount().await.unwrap();
    assert_eq!(summary.delivery, Some(DeliveryAttempt::Fallback));

    wait_until_matched(&mock).await;
    mock.assert_async().await;
}

#[tokio::test]
async fn test_queued_beacon_outlives_the_session() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/acme/video/intro/leave")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "session_id": "sess-beacon",
            "watch_rate": 100,
            "watch_segments": "111",
            "recent_position": 30,
            "is_quit": false
        })))
        .with_status(204)
        .create_async()
        .await;

    let api = AnalyticsApi::new(&server.url(), Duration::from_secs(5)).unwrap();
    let (beacon, receiver) = QueuedBeacon::channel(4);
    let dispatcher = BeaconDispatcher::spawn(api.clone(), receiver);

    let media = FakeMedia::new(30.0);
    let mut reporter = mount(
        "sess-beacon",
        media.clone(),
        WatchPolicy::default(),
        &server.url(),
        Some(Arc::new(beacon) as Arc<dyn Beacon>),
        Arc::new(api),
    );

    reporter.handle_player_event(PlayerEvent::Play);
    media.seek_to(30.0);
    reporter.handle_player_event(PlayerEvent::Ended);

    let outcome = reporter.outcome().cloned().unwrap();
    assert_eq!(outcome.delivery, DeliveryAttempt::Beacon);
    drop(reporter);

    let stats = dispatcher.shutdown().await.unwrap();
    assert_eq!(stats, DispatchStats { delivered: 1, failed: 0 });
    mock.assert_async().await;
}

#[tokio::test]
async fn test_backend_errors_never_reach_the_host() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/acme/video/intro/leave")
        .with_status(503)
        .with_body("maintenance")
        .create_async()
        .await;

    let api = AnalyticsApi::new(&server.url(), Duration::from_secs(5)).unwrap();
    let mut reporter = mount(
        "sess-503",
        FakeMedia::new(30.0),
        WatchPolicy::default(),
        &server.url(),
        None,
        Arc::new(api),
    );

    let outcome = reporter.unmount().cloned().unwrap();
    assert_eq!(outcome.delivery, DeliveryAttempt::Fallback);
    assert!(outcome.report.is_quit);

    wait_until_matched(&mock).await;
    mock.assert_async().await;
}
