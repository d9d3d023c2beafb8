use serde::Serialize;

/// One bar of a video's watch heatmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub index: usize,
    pub start_secs: f64,
    pub end_secs: f64,
    /// Sessions that watched this segment
    pub views: u64,
    /// `views` relative to the busiest segment, in [0, 1]
    pub intensity: f64,
}

/// Sum `watch_segments` bit strings from many sessions into per-segment
/// view counts.
///
/// Strings shorter than `segment_count` only contribute to the segments they
/// cover; extra characters are ignored, as is anything other than `'1'`.
pub fn aggregate_segments<'a, I>(segment_count: usize, bit_strings: I) -> Vec<u64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = vec![0u64; segment_count];

    for bits in bit_strings {
        for (count, bit) in counts.iter_mut().zip(bits.chars()) {
            if bit == '1' {
                *count += 1;
            }
        }
    }

    counts
}

/// Lay view counts out on the video's timeline.
pub fn build_heatmap(counts: &[u64], whole_time: f64, segment_seconds: f64) -> Vec<HeatmapCell> {
    if !whole_time.is_finite() || whole_time <= 0.0 || segment_seconds <= 0.0 {
        return Vec::new();
    }

    let max_views = counts.iter().copied().max().unwrap_or(0);

    counts
        .iter()
        .enumerate()
        .map(|(index, &views)| {
            let start_secs = (index as f64 * segment_seconds).min(whole_time);
            let end_secs = (start_secs + segment_seconds).min(whole_time);
            let intensity = if max_views == 0 {
                0.0
            } else {
                views as f64 / max_views as f64
            };

            HeatmapCell {
                index,
                start_secs,
                end_secs,
                views,
                intensity,
            }
        })
        .collect()
}
