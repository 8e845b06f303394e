//! Outdoor-temperature to required-temperature resolution.

use common::types::{TempGraphPoint, TempRequirement};
use common::Error;
use tracing::debug;

/// Heating-curve graph with interpolated lookup.
///
/// Lookups between rows interpolate linearly; lookups outside the graph's
/// domain clamp to the boundary rows, so the controller never recommends
/// setpoints for weather the curve does not cover.
#[derive(Debug, Clone)]
pub struct TempGraph {
    points: Vec<TempGraphPoint>,
}

impl TempGraph {
    /// Builds a graph from parsed rows, sorted by outdoor temperature.
    /// Duplicate outdoor temperatures keep the first row.
    pub fn new(mut points: Vec<TempGraphPoint>) -> Result<Self, Error> {
        if points.is_empty() {
            return Err(Error::TempGraph("temperature graph has no rows".into()));
        }

        points.sort_by(|a, b| a.outdoor_t.total_cmp(&b.outdoor_t));
        points.dedup_by(|next, kept| next.outdoor_t.total_cmp(&kept.outdoor_t).is_eq());

        debug!(
            "Temp graph covers outdoor range [{}, {}] with {} rows",
            points[0].outdoor_t,
            points[points.len() - 1].outdoor_t,
            points.len()
        );

        Ok(Self { points })
    }

    /// Required home inlet/outlet temperatures for an outdoor temperature.
    pub fn required_temp(&self, outdoor_t: f64) -> TempRequirement {
        let first = &self.points[0];
        let last = &self.points[self.points.len() - 1];

        if outdoor_t <= first.outdoor_t {
            return TempRequirement::from(first);
        }
        if outdoor_t >= last.outdoor_t {
            return TempRequirement::from(last);
        }

        let upper = self.points.partition_point(|p| p.outdoor_t < outdoor_t);
        let lo = &self.points[upper - 1];
        let hi = &self.points[upper];

        let ratio = (outdoor_t - lo.outdoor_t) / (hi.outdoor_t - lo.outdoor_t);
        TempRequirement {
            home_in_t: lo.home_in_t + (hi.home_in_t - lo.home_in_t) * ratio,
            home_out_t: lo.home_out_t + (hi.home_out_t - lo.home_out_t) * ratio,
        }
    }
}
