use std::sync::Arc;
use std::time::Duration;

use heatwatch::analytics::{Termination, WatchPolicy};
use heatwatch::config::Config;
use heatwatch::delivery::{Beacon, DeliveryAttempt};
use heatwatch::navigation::{LeaveTrigger, NavigationHub, NavigationSignal};
use heatwatch::player::PlayerEvent;
use heatwatch::workers::WatchSession;

use crate::common::{CollectingBeacon, FakeMedia, MOUNT_PATH, mount, unused_sink};

#[tokio::test(start_paused = true)]
async fn test_unload_ends_every_mounted_session() {
    let hub = NavigationHub::default();
    let beacon = Arc::new(CollectingBeacon::default());

    let sessions: Vec<WatchSession> = ["first", "second"]
        .into_iter()
        .map(|id| {
            let reporter = mount(
                id,
                FakeMedia::new(60.0),
                WatchPolicy::default(),
                "http://analytics.test",
                Some(beacon.clone() as Arc<dyn Beacon>),
                unused_sink(),
            );
            WatchSession::spawn(reporter, hub.subscribe(), Duration::from_secs(1))
        })
        .collect();
    assert_eq!(hub.subscriber_count(), 2);

    assert_eq!(hub.publish(NavigationSignal::BeforeUnload), 2);

    for session in sessions {
        let summary = session.unmount().await.unwrap();
        assert_eq!(
            summary.termination,
            Some(Termination::Left(LeaveTrigger::BeforeUnload))
        );
        assert_eq!(summary.delivery, Some(DeliveryAttempt::Beacon));
    }

    assert_eq!(hub.subscriber_count(), 0);
    assert_eq!(hub.stats().published, 1);

    let reports = beacon.reports();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.is_quit && r.watch_segments == "000000"));
    assert!(
        beacon
            .urls()
            .iter()
            .all(|url| url == "http://analytics.test/acme/video/intro/leave")
    );
}

#[tokio::test(start_paused = true)]
async fn test_configured_policy_drives_ticks() {
    let config = Config::from_toml_str("[policy]\nsegment_seconds = 5.0\n").unwrap();
    let policy = config.policy().unwrap();
    let tick_interval = policy.tick_interval;

    let hub = NavigationHub::default();
    let media = FakeMedia::new(10.0);
    let beacon = Arc::new(CollectingBeacon::default());
    let reporter = mount(
        "ticking",
        media.clone(),
        policy,
        "http://analytics.test",
        Some(beacon.clone() as Arc<dyn Beacon>),
        unused_sink(),
    );
    let session = WatchSession::spawn(reporter, hub.subscribe(), tick_interval);

    session.player_event(PlayerEvent::Play);
    tokio::time::sleep(Duration::from_millis(500)).await;
    for second in 1..=10 {
        media.seek_to(second as f64);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    // Navigating within the player page is not a leave
    hub.publish(NavigationSignal::HistoryReplace {
        path: format!("{}?t=10", MOUNT_PATH),
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!session.is_finished());

    let summary = session.unmount().await.unwrap();
    let report = summary.report.unwrap();

    assert_eq!(report.watch_segments, "11");
    assert_eq!(report.watch_rate, 100);
    assert_eq!(report.recent_position, 10);
    assert_eq!(beacon.reports(), vec![report]);
}

#[tokio::test(start_paused = true)]
async fn test_events_after_termination_are_rejected() {
    let hub = NavigationHub::default();
    let reporter = mount(
        "done",
        FakeMedia::new(20.0),
        WatchPolicy::default(),
        "http://analytics.test",
        Some(Arc::new(CollectingBeacon::default()) as Arc<dyn Beacon>),
        unused_sink(),
    );
    let session = WatchSession::spawn(reporter, hub.subscribe(), Duration::from_secs(1));

    session.player_event(PlayerEvent::Ended);
    while !session.is_finished() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert!(!session.player_event(PlayerEvent::Play));
    assert!(!session.set_whole_time(40.0));

    let summary = session.unmount().await.unwrap();
    assert_eq!(summary.termination, Some(Termination::Ended));
    assert_eq!(summary.report.unwrap().watch_segments, "11");
}
