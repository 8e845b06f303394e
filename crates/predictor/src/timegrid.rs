//! Alignment of timestamps to the prediction grid.

use chrono::{DateTime, Duration, FixedOffset};
use common::Error;

/// Rounds a timestamp up to the next grid boundary.
///
/// A timestamp already on the grid is returned unchanged; anything past a
/// boundary, including by a fraction of a second, lands on the next one.
/// The result carries the input's UTC offset.
pub fn ceil_to_tick(
    timestamp: DateTime<FixedOffset>,
    tick: Duration,
) -> Result<DateTime<FixedOffset>, Error> {
    let tick_secs = tick.num_seconds();
    if tick_secs <= 0 {
        return Err(Error::InvalidSeries(format!(
            "tick must be positive, got {}s",
            tick_secs
        )));
    }

    let secs = timestamp.timestamp();
    let mut boundary = secs.div_euclid(tick_secs);
    if secs.rem_euclid(tick_secs) != 0 || timestamp.timestamp_subsec_nanos() != 0 {
        boundary += 1;
    }

    let rounded = DateTime::from_timestamp(boundary * tick_secs, 0).ok_or_else(|| {
        Error::InvalidSeries(format!("timestamp out of range after rounding: {}", timestamp))
    })?;

    Ok(rounded.with_timezone(&timestamp.timezone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick() -> Duration {
        Duration::minutes(3)
    }

    fn at(time: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(time).unwrap()
    }

    #[test]
    fn aligned_timestamp_is_unchanged() {
        let ts = at("2021-01-30T00:06:00+05:00");
        assert_eq!(ceil_to_tick(ts, tick()).unwrap(), ts);
    }

    #[test]
    fn rounds_up_to_next_boundary() {
        let ts = at("2021-01-30T00:06:01+05:00");
        assert_eq!(ceil_to_tick(ts, tick()).unwrap(), at("2021-01-30T00:09:00+05:00"));
    }

    #[test]
    fn subsecond_past_boundary_rounds_up() {
        let ts = at("1970-01-01T00:03:00.500+00:00");
        let rounded = ceil_to_tick(ts, tick()).unwrap();
        assert_eq!(rounded.timestamp(), 360);
    }

    #[test]
    fn is_idempotent() {
        let ts = at("2021-01-30T23:58:30+05:00");
        let once = ceil_to_tick(ts, tick()).unwrap();
        let twice = ceil_to_tick(once, tick()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn preserves_utc_offset() {
        let ts = at("2021-01-30T00:07:00+05:00");
        let rounded = ceil_to_tick(ts, tick()).unwrap();
        assert_eq!(rounded.offset().local_minus_utc(), 5 * 3600);
        assert_eq!(rounded, at("2021-01-30T00:09:00+05:00"));
    }

    #[test]
    fn non_positive_tick_is_rejected() {
        let ts = at("2021-01-30T00:06:00+05:00");
        assert!(ceil_to_tick(ts, Duration::zero()).is_err());
        assert!(ceil_to_tick(ts, Duration::seconds(-180)).is_err());
    }
}
