//! Domain types shared across the bot.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ── Time series ───────────────────────────────────────────────────────

/// One sample of a time series: an absolute instant (carrying its UTC
/// offset) plus a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub timestamp: DateTime<FixedOffset>,
    pub value: f64,
}

impl TimePoint {
    pub fn new(timestamp: DateTime<FixedOffset>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Sorts a series by timestamp and drops duplicate timestamps, keeping the
/// latest occurrence (last write wins).
pub fn normalize_series(points: &mut Vec<TimePoint>) {
    points.sort_by_key(|p| p.timestamp);
    points.dedup_by(|next, kept| {
        if next.timestamp == kept.timestamp {
            *kept = *next;
            true
        } else {
            false
        }
    });
}

/// Min and max timestamps of a series, `None` when empty.
///
/// Assumes the series is sorted.
pub fn series_bounds(points: &[TimePoint]) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
        _ => None,
    }
}

// ── Temperature graph ─────────────────────────────────────────────────

/// One row of the heating curve: outdoor temperature mapped to the required
/// temperatures at the home inlet (forward pipe) and outlet (return pipe).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempGraphPoint {
    pub outdoor_t: f64,
    pub home_in_t: f64,
    pub home_out_t: f64,
}

/// Required temperatures resolved for a concrete outdoor temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempRequirement {
    pub home_in_t: f64,
    pub home_out_t: f64,
}

impl From<&TempGraphPoint> for TempRequirement {
    fn from(point: &TempGraphPoint) -> Self {
        Self {
            home_in_t: point.home_in_t,
            home_out_t: point.home_out_t,
        }
    }
}
