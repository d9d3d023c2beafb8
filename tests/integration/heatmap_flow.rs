use std::sync::Arc;

use heatwatch::analytics::{WatchPolicy, aggregate_segments, build_heatmap};
use heatwatch::delivery::Beacon;
use heatwatch::player::PlayerEvent;

use crate::common::{CollectingBeacon, FakeMedia, mount, unused_sink};

/// Watch `[from, to)` in one go and leave
fn watch(id: &str, beacon: &Arc<CollectingBeacon>, from: f64, to: f64) {
    let media = FakeMedia::new(30.0);
    let mut reporter = mount(
        id,
        media.clone(),
        WatchPolicy::default(),
        "http://analytics.test",
        Some(beacon.clone() as Arc<dyn Beacon>),
        unused_sink(),
    );

    media.seek_to(from);
    reporter.handle_player_event(PlayerEvent::Play);
    media.seek_to(to);
    reporter.handle_player_event(PlayerEvent::Pause);
    reporter.unmount();
}

#[test]
fn test_heatmap_from_many_sessions() {
    let beacon = Arc::new(CollectingBeacon::default());
    watch("a", &beacon, 0.0, 10.0);
    watch("b", &beacon, 0.0, 20.0);
    watch("c", &beacon, 10.0, 30.0);

    let reports = beacon.reports();
    let bits: Vec<&str> = reports.iter().map(|r| r.watch_segments.as_str()).collect();
    assert_eq!(bits, vec!["100", "110", "011"]);

    let counts = aggregate_segments(3, bits.iter().copied());
    assert_eq!(counts, vec![2, 2, 1]);

    let cells = build_heatmap(&counts, 30.0, WatchPolicy::default().segment_seconds);
    let intensities: Vec<f64> = cells.iter().map(|c| c.intensity).collect();
    assert_eq!(intensities, vec![1.0, 1.0, 0.5]);
    assert_eq!(cells[2].start_secs, 20.0);
    assert_eq!(cells[2].end_secs, 30.0);
}
