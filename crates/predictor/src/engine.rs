//! Boiler setpoint prediction.
//!
//! Composes the forecast cache, the heating-curve graph, the optimized
//! lookup table, and the per-home lags into one predicted setpoint series.

use chrono::{DateTime, Duration, FixedOffset};
use common::source::{ForecastSource, WeatherParser};
use common::types::{series_bounds, TimePoint};
use common::Error;
use tracing::{debug, info};

use crate::cache::ForecastCache;
use crate::tables::{HomeTimeDeltas, OptimizedLookupTable};
use crate::temp_graph::TempGraph;
use crate::timegrid::ceil_to_tick;

/// The prediction engine.
///
/// Each home sees the boiler's water only after its own thermal lag, so the
/// weather window is extended backward by the largest lag and every home's
/// required temperature is resolved from lag-shifted weather.
pub struct SetpointEngine<S, P> {
    cache: ForecastCache<S, P>,
    temp_graph: TempGraph,
    lookup_table: OptimizedLookupTable,
    homes: HomeTimeDeltas,
    dispersion_coefficient: f64,
    tick: Duration,
}

impl<S: ForecastSource, P: WeatherParser> SetpointEngine<S, P> {
    pub fn new(
        cache: ForecastCache<S, P>,
        temp_graph: TempGraph,
        lookup_table: OptimizedLookupTable,
        homes: HomeTimeDeltas,
        dispersion_coefficient: f64,
        tick: Duration,
    ) -> Self {
        Self {
            cache,
            temp_graph,
            lookup_table,
            homes,
            dispersion_coefficient,
            tick,
        }
    }

    /// Predicted boiler setpoints, one per grid tick in `[start, end)`.
    ///
    /// # Arguments
    /// * `start` — first instant under control (rounded up to the grid)
    /// * `end` — exclusive end of the control window
    ///
    /// A forecast that stops short of `end` truncates the result; a forecast
    /// that starts after `start - max_lag` is an error, because at least one
    /// home's lag-shifted weather would be missing for every output tick.
    pub async fn predict(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<TimePoint>, Error> {
        if self.homes.is_empty() {
            return Err(Error::NoHomesConfigured);
        }

        let start = ceil_to_tick(start, self.tick)?;
        let end = ceil_to_tick(end, self.tick)?;
        if start >= end {
            return Ok(Vec::new());
        }

        let max_lag = self.tick * self.homes.max_ticks() as i32;
        let weather_start = start - max_lag;
        let weather = self.cache.get(weather_start, end).await?;

        match series_bounds(&weather) {
            Some((min_cached, _)) if min_cached <= weather_start => {}
            _ => {
                return Err(Error::InsufficientData(format!(
                    "weather forecast does not cover {}",
                    weather_start
                )));
            }
        }

        let weather_at = |t: DateTime<FixedOffset>| -> Option<f64> {
            weather
                .binary_search_by_key(&t, |p| p.timestamp)
                .ok()
                .map(|i| weather[i].value)
        };

        let mut setpoints = Vec::new();
        let mut t = start;
        'grid: while t < end {
            let mut required = Vec::with_capacity(self.homes.len());
            for home in self.homes.iter() {
                let shifted = t - self.tick * home.time_delta as i32;
                let Some(weather_t) = weather_at(shifted) else {
                    debug!(
                        "No weather for {} at {} ({} tick lag); truncating output",
                        home.home_name, shifted, home.time_delta
                    );
                    break 'grid;
                };
                required.push(self.temp_graph.required_temp(weather_t).home_in_t);
            }

            let target = self.aggregate_required(&required);
            setpoints.push(TimePoint::new(t, self.lookup_table.boiler_t_for(target)));
            t = t + self.tick;
        }

        info!(
            "Predicted {} setpoints for [{}, {})",
            setpoints.len(),
            start,
            end
        );
        Ok(setpoints)
    }

    /// Collapses per-home required temperatures into one boiler target: the
    /// mean pulled toward the worst-case home by the dispersion coefficient
    /// (0 = mean, 1 = max).
    fn aggregate_required(&self, required: &[f64]) -> f64 {
        let mean = required.iter().sum::<f64>() / required.len() as f64;
        let max = required.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        mean + self.dispersion_coefficient * (max - mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::HomeTimeDelta;
    use common::source::{ForecastSource, WeatherParser};
    use std::time::Duration as StdDuration;

    /// Source handing out a fixed weather series directly.
    struct CannedWeather(Vec<(i64, f64)>);

    impl ForecastSource for CannedWeather {
        async fn fetch_forecast(&self) -> Result<String, Error> {
            Ok(self
                .0
                .iter()
                .map(|(secs, value)| format!("{}:{}", secs, value))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    struct LineParser;

    impl WeatherParser for LineParser {
        fn parse_weather(&self, raw: &str) -> Result<Vec<TimePoint>, Error> {
            let offset = FixedOffset::east_opt(5 * 3600).unwrap();
            raw.lines()
                .map(|line| {
                    let (secs, value) = line.split_once(':').unwrap();
                    Ok(TimePoint::new(
                        DateTime::from_timestamp(secs.parse().unwrap(), 0)
                            .unwrap()
                            .with_timezone(&offset),
                        value.parse().unwrap(),
                    ))
                })
                .collect()
        }
    }

    fn tick() -> Duration {
        Duration::minutes(3)
    }

    fn grid(ticks: i64) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        DateTime::from_timestamp(ticks * 180, 0)
            .unwrap()
            .with_timezone(&offset)
    }

    fn mirror_point(outdoor_t: f64) -> common::types::TempGraphPoint {
        common::types::TempGraphPoint {
            outdoor_t,
            home_in_t: -outdoor_t,
            home_out_t: -outdoor_t,
        }
    }

    /// Graph where required t equals the negated outdoor t, for easy math.
    fn mirror_graph() -> TempGraph {
        TempGraph::new(vec![
            mirror_point(-100.0),
            mirror_point(0.0),
            mirror_point(100.0),
        ])
        .unwrap()
    }

    /// Table where the setpoint equals the required temperature.
    fn identity_table() -> OptimizedLookupTable {
        OptimizedLookupTable::from_rows((0..=200).map(|i| {
            let t = i as f64 - 100.0;
            (t, t)
        }))
        .unwrap()
    }

    fn engine_with(
        weather: Vec<(i64, f64)>,
        homes: Vec<HomeTimeDelta>,
        dispersion: f64,
    ) -> SetpointEngine<CannedWeather, LineParser> {
        let cache = ForecastCache::new(
            CannedWeather(weather),
            LineParser,
            tick(),
            StdDuration::from_secs(1800),
        );
        SetpointEngine::new(
            cache,
            mirror_graph(),
            identity_table(),
            HomeTimeDeltas::new(homes),
            dispersion,
            tick(),
        )
    }

    fn home(name: &str, lag: u32) -> HomeTimeDelta {
        HomeTimeDelta {
            home_name: name.into(),
            time_delta: lag,
        }
    }

    #[tokio::test]
    async fn lagged_homes_read_shifted_weather() {
        // Weather ramps one degree colder per tick: -10, -11, -12, ...
        let weather: Vec<(i64, f64)> = (0..10).map(|i| (i * 180, -10.0 - i as f64)).collect();
        let engine = engine_with(weather, vec![home("a", 0), home("b", 2)], 1.0);

        let setpoints = engine.predict(grid(2), grid(4)).await.unwrap();

        assert_eq!(setpoints.len(), 2);
        // At t = tick 2: home a sees -12 (now), home b sees -10 (2 ticks
        // back); required temps are 12 and 10, worst case 12.
        assert_eq!(setpoints[0].timestamp, grid(2));
        assert_eq!(setpoints[0].value, 12.0);
        assert_eq!(setpoints[1].value, 13.0);
    }

    #[tokio::test]
    async fn constant_weather_is_lag_invariant() {
        let weather: Vec<(i64, f64)> = (0..10).map(|i| (i * 180, -5.0)).collect();
        let engine = engine_with(weather, vec![home("a", 0), home("b", 2)], 1.0);

        let setpoints = engine.predict(grid(2), grid(5)).await.unwrap();

        assert_eq!(setpoints.len(), 3);
        for point in &setpoints {
            assert_eq!(point.value, 5.0);
        }
    }

    #[tokio::test]
    async fn dispersion_zero_takes_the_mean() {
        let weather: Vec<(i64, f64)> = (0..10).map(|i| (i * 180, -10.0 - i as f64)).collect();
        let engine = engine_with(weather, vec![home("a", 0), home("b", 2)], 0.0);

        let setpoints = engine.predict(grid(2), grid(3)).await.unwrap();

        // Homes see -12 and -10; mean required is 11.
        assert_eq!(setpoints[0].value, 11.0);
    }

    #[tokio::test]
    async fn no_homes_is_an_error() {
        let engine = engine_with(vec![(0, -5.0)], Vec::new(), 1.0);

        let err = engine.predict(grid(0), grid(1)).await.unwrap_err();
        assert!(matches!(err, Error::NoHomesConfigured));
    }

    #[tokio::test]
    async fn fresh_but_short_cache_is_insufficient() {
        // The first call populates the cache back to tick 3 and leaves it
        // fresh. The second call needs weather from tick 1, but the cache
        // covers its end and is not expired, so no refresh fires and the
        // engine must report the missing coverage.
        let weather: Vec<(i64, f64)> = (3..10).map(|i| (i * 180, -5.0)).collect();
        let engine = engine_with(weather, vec![home("a", 0), home("b", 2)], 1.0);

        engine.predict(grid(5), grid(6)).await.unwrap();

        let err = engine.predict(grid(3), grid(4)).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[tokio::test]
    async fn output_has_one_point_per_tick() {
        let weather: Vec<(i64, f64)> = (0..20).map(|i| (i * 180, -5.0)).collect();
        let engine = engine_with(weather, vec![home("a", 0)], 1.0);

        let setpoints = engine.predict(grid(0), grid(5)).await.unwrap();

        assert_eq!(setpoints.len(), 5);
        for (i, point) in setpoints.iter().enumerate() {
            assert_eq!(point.timestamp, grid(i as i64));
        }
    }
}
