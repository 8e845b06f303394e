//! Static prediction tables loaded from CSV artifacts.

use std::path::Path;

use common::Error;
use serde::Deserialize;
use tracing::debug;

// ── Optimized lookup table ────────────────────────────────────────────

/// Precomputed required-temperature to boiler-setpoint table.
///
/// Produced offline by the optimization pipeline; loaded once at startup and
/// shared read-only by every prediction.
#[derive(Debug, Clone)]
pub struct OptimizedLookupTable {
    rows: Vec<LookupRow>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct LookupRow {
    required_t: f64,
    boiler_t: f64,
}

impl OptimizedLookupTable {
    pub fn from_rows(rows: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, Error> {
        let mut rows: Vec<LookupRow> = rows
            .into_iter()
            .map(|(required_t, boiler_t)| LookupRow {
                required_t,
                boiler_t,
            })
            .collect();

        if rows.is_empty() {
            return Err(Error::Artifact("optimized lookup table has no rows".into()));
        }
        rows.sort_by(|a, b| a.required_t.total_cmp(&b.required_t));

        Ok(Self { rows })
    }

    /// Load from a CSV artifact with `required_t,boiler_t` columns.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;

        let mut rows = Vec::new();
        for record in reader.deserialize::<LookupRow>() {
            let row = record.map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;
            rows.push((row.required_t, row.boiler_t));
        }

        debug!("Loaded {} lookup rows from {}", rows.len(), path.display());
        Self::from_rows(rows)
    }

    /// Boiler setpoint for a required temperature, by nearest table row.
    /// Ties resolve to the lower row.
    pub fn boiler_t_for(&self, required_t: f64) -> f64 {
        let upper = self.rows.partition_point(|r| r.required_t < required_t);
        if upper == 0 {
            return self.rows[0].boiler_t;
        }
        if upper == self.rows.len() {
            return self.rows[upper - 1].boiler_t;
        }

        let lo = self.rows[upper - 1];
        let hi = self.rows[upper];
        if required_t - lo.required_t <= hi.required_t - required_t {
            lo.boiler_t
        } else {
            hi.boiler_t
        }
    }
}

// ── Home time deltas ──────────────────────────────────────────────────

/// Lag of one home behind the boiler, in whole prediction ticks.
#[derive(Debug, Clone, Deserialize)]
pub struct HomeTimeDelta {
    pub home_name: String,
    pub time_delta: u32,
}

/// Per-home thermal lags, immutable after load.
#[derive(Debug, Clone)]
pub struct HomeTimeDeltas {
    homes: Vec<HomeTimeDelta>,
}

impl HomeTimeDeltas {
    pub fn new(homes: Vec<HomeTimeDelta>) -> Self {
        Self { homes }
    }

    /// Load from a CSV artifact with `home_name,time_delta` columns.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;

        let mut homes = Vec::new();
        for record in reader.deserialize::<HomeTimeDelta>() {
            let home = record.map_err(|e| Error::Artifact(format!("{}: {}", path.display(), e)))?;
            homes.push(home);
        }

        debug!("Loaded {} home lags from {}", homes.len(), path.display());
        Ok(Self::new(homes))
    }

    pub fn is_empty(&self) -> bool {
        self.homes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.homes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HomeTimeDelta> {
        self.homes.iter()
    }

    /// The largest lag across all homes, in ticks.
    pub fn max_ticks(&self) -> u32 {
        self.homes.iter().map(|h| h.time_delta).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> OptimizedLookupTable {
        OptimizedLookupTable::from_rows([(40.0, 55.0), (50.0, 68.0), (60.0, 80.0)]).unwrap()
    }

    #[test]
    fn nearest_row_wins() {
        assert_eq!(table().boiler_t_for(48.0), 68.0);
        assert_eq!(table().boiler_t_for(43.0), 55.0);
    }

    #[test]
    fn midpoint_resolves_to_lower_row() {
        assert_eq!(table().boiler_t_for(45.0), 55.0);
    }

    #[test]
    fn out_of_range_clamps() {
        assert_eq!(table().boiler_t_for(0.0), 55.0);
        assert_eq!(table().boiler_t_for(99.0), 80.0);
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(OptimizedLookupTable::from_rows([]).is_err());
    }

    #[test]
    fn max_ticks_over_homes() {
        let homes = HomeTimeDeltas::new(vec![
            HomeTimeDelta {
                home_name: "engelsa_35".into(),
                time_delta: 2,
            },
            HomeTimeDelta {
                home_name: "gaydara_1".into(),
                time_delta: 5,
            },
        ]);

        assert_eq!(homes.max_ticks(), 5);
        assert_eq!(homes.len(), 2);
    }

    #[test]
    fn no_homes_means_zero_lag() {
        assert_eq!(HomeTimeDeltas::new(Vec::new()).max_ticks(), 0);
    }
}
