//! Pure interval aggregation over tracker events.
//!
//! No side effects, no clock reads: a function of the samples and the
//! window bounds only, so it can be property-tested without any network
//! layer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::client::{TrackerEvent, WindowData};

/// Composite key for a window event, `"title - app"`.
///
/// Missing sub-fields get stable placeholders so keys match across
/// aggregation cycles.
pub fn composite_key(data: &WindowData) -> String {
    let title = data
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or("<untitled>");
    let app = data
        .app
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or("unknown");
    format!("{title} - {app}")
}

/// Total active milliseconds per composite key within
/// `[window_start, window_end)`.
///
/// Each sample contributes the overlap of `[timestamp, timestamp + duration)`
/// with the window, clamped at zero. Samples with unparsable timestamps or
/// non-finite durations contribute nothing; malformed upstream data must not
/// abort aggregation.
pub fn aggregate(
    samples: &[TrackerEvent],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> HashMap<String, u64> {
    let start_ms = window_start.timestamp_millis();
    let end_ms = window_end.timestamp_millis();

    let mut totals = HashMap::new();
    for sample in samples {
        let overlap = overlap_ms(sample, start_ms, end_ms);
        if overlap == 0 {
            continue;
        }
        *totals.entry(composite_key(&sample.data)).or_insert(0) += overlap;
    }
    totals
}

fn overlap_ms(sample: &TrackerEvent, start_ms: i64, end_ms: i64) -> u64 {
    let ts = match DateTime::parse_from_rfc3339(&sample.timestamp) {
        Ok(dt) => dt.timestamp_millis(),
        Err(_) => return 0,
    };
    let duration_ms = if sample.duration.is_finite() && sample.duration > 0.0 {
        (sample.duration * 1000.0).round() as i64
    } else {
        0
    };
    let overlap = (ts + duration_ms).min(end_ms) - ts.max(start_ms);
    overlap.max(0) as u64
}

/// Ranked view of a totals map: descending by total, ties broken by the
/// key's lexical order for determinism.
pub fn ranked(totals: &HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut entries: Vec<_> = totals.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}
