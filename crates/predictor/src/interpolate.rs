//! Linear gap interpolation over the prediction grid.

use chrono::{DateTime, Duration, FixedOffset};
use common::types::TimePoint;
use common::Error;

/// Fills every gap wider than one tick with evenly spaced linear
/// interpolants.
///
/// Original points pass through unchanged. The result is sorted with unique
/// timestamps; on a duplicate timestamp the first occurrence wins. A series
/// with fewer than two points has no gaps to fill.
pub fn fill_gaps(points: &[TimePoint], tick: Duration) -> Result<Vec<TimePoint>, Error> {
    if tick <= Duration::zero() {
        return Err(Error::InvalidSeries(format!(
            "tick must be positive, got {}s",
            tick.num_seconds()
        )));
    }
    if points.len() < 2 {
        return Ok(points.to_vec());
    }

    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.timestamp);

    let mut filled: Vec<TimePoint> = Vec::with_capacity(sorted.len());
    for next in sorted {
        if let Some(prev) = filled.last().copied() {
            if next.timestamp == prev.timestamp {
                continue;
            }
            let gap = next.timestamp - prev.timestamp;
            if gap > tick {
                let segments = gap.num_seconds() / tick.num_seconds();
                if segments >= 1 {
                    let step = (next.value - prev.value) / segments as f64;
                    for pass in 1..segments {
                        filled.push(TimePoint::new(
                            prev.timestamp + tick * pass as i32,
                            prev.value + step * pass as f64,
                        ));
                    }
                }
            }
        }
        filled.push(next);
    }

    Ok(filled)
}

/// Flat-fills a sorted series out to the requested bounds.
///
/// When the series starts after `min_time`, the first known value is carried
/// back to `min_time`; symmetric for `max_time` with the last known value.
/// No slope is extrapolated past the known range. An empty series stays
/// empty.
pub fn extend_to_bounds(
    points: &[TimePoint],
    min_time: Option<DateTime<FixedOffset>>,
    max_time: Option<DateTime<FixedOffset>>,
) -> Vec<TimePoint> {
    let mut extended = Vec::with_capacity(points.len() + 2);

    if let (Some(min_time), Some(first)) = (min_time, points.first()) {
        if first.timestamp > min_time {
            extended.push(TimePoint::new(min_time, first.value));
        }
    }

    extended.extend_from_slice(points);

    if let (Some(max_time), Some(last)) = (max_time, points.last()) {
        if last.timestamp < max_time {
            extended.push(TimePoint::new(max_time, last.value));
        }
    }

    extended
}
