//! Staleness-aware cache over the outdoor-weather forecast.
//!
//! Owns a single quantized series. Reads go through [`ForecastCache::get`],
//! which refreshes from the forecast source at most once per call when the
//! cached data is stale or ends too early, then serves a windowed copy.

use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, FixedOffset};
use common::source::{ForecastSource, WeatherParser};
use common::types::{normalize_series, TimePoint};
use common::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::interpolate::{extend_to_bounds, fill_gaps};
use crate::timegrid::ceil_to_tick;

#[derive(Debug, Default)]
struct CacheState {
    series: Vec<TimePoint>,
    last_refresh: Option<Instant>,
}

impl CacheState {
    fn max_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.series.last().map(|p| p.timestamp)
    }

    fn is_expired(&self, update_interval: StdDuration) -> bool {
        match self.last_refresh {
            Some(at) => at.elapsed() > update_interval,
            None => true,
        }
    }
}

/// Forecast cache.
///
/// The whole check-refresh-read sequence runs under one async lock, so
/// concurrent stale detections coalesce: the second caller waits, re-checks,
/// and finds the cache already refreshed.
pub struct ForecastCache<S, P> {
    source: S,
    parser: P,
    tick: Duration,
    update_interval: StdDuration,
    state: Mutex<CacheState>,
}

impl<S: ForecastSource, P: WeatherParser> ForecastCache<S, P> {
    pub fn new(source: S, parser: P, tick: Duration, update_interval: StdDuration) -> Self {
        Self {
            source,
            parser,
            tick,
            update_interval,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Weather for `[start, end)` on the prediction grid.
    ///
    /// Refreshes from the source when the cache is empty, expired, or ends
    /// before `end`. A fetch or parse failure over a populated cache
    /// degrades to the stale data instead of failing the read; quantization
    /// and gap-filling failures are always fatal. When the source has less
    /// future data than requested, the returned slice is truncated.
    pub async fn get(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<TimePoint>, Error> {
        let start = ceil_to_tick(start, self.tick)?;
        let end = ceil_to_tick(end, self.tick)?;

        debug!("Requested weather from {} to {}", start, end);

        let mut state = self.state.lock().await;

        if self.needs_refresh(&state, end) {
            match self.refresh(&mut state, start).await {
                Ok(()) => {
                    if state.max_timestamp().map_or(true, |max| end > max) {
                        debug!(
                            "Forecast still ends before {} after refresh; serving a truncated window",
                            end
                        );
                    }
                }
                Err(e @ (Error::ForecastSource(_) | Error::Json(_)))
                    if !state.series.is_empty() =>
                {
                    warn!("Forecast refresh failed ({}); serving cached data", e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(state
            .series
            .iter()
            .filter(|p| p.timestamp >= start && p.timestamp < end)
            .copied()
            .collect())
    }

    fn needs_refresh(&self, state: &CacheState, end: DateTime<FixedOffset>) -> bool {
        let Some(max_cached) = state.max_timestamp() else {
            debug!("Forecast cache is empty");
            return true;
        };
        if end > max_cached {
            debug!("Requested {} is past the cached forecast end {}", end, max_cached);
            return true;
        }
        if state.is_expired(self.update_interval) {
            debug!("Cached forecast is older than the update interval");
            return true;
        }
        false
    }

    /// Fetch, parse, and harmonize a fresh forecast, then replace the cached
    /// series wholesale.
    ///
    /// `window_start` is the quantized start of the triggering request; the
    /// fresh series is flat-filled back to it so a request beginning just
    /// before the first forecast point can still be served.
    async fn refresh(
        &self,
        state: &mut CacheState,
        window_start: DateTime<FixedOffset>,
    ) -> Result<(), Error> {
        debug!("Refreshing forecast from source");

        let raw = self.source.fetch_forecast().await?;
        let mut series = self.parser.parse_weather(&raw)?;

        for point in &mut series {
            point.timestamp = ceil_to_tick(point.timestamp, self.tick)?;
        }
        normalize_series(&mut series);
        let series = extend_to_bounds(&series, Some(window_start), None);
        let series = fill_gaps(&series, self.tick)?;

        debug!("Forecast cache replaced with {} points", series.len());
        state.series = series;
        state.last_refresh = Some(Instant::now());
        Ok(())
    }
}
