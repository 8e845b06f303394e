//! Capability traits for the forecast data path.
//!
//! The cache only cares that something can produce a raw payload and that
//! something else can turn that payload into the canonical series shape.
//! Tests inject in-memory fakes for both.

use std::future::Future;

use crate::error::Error;
use crate::types::TimePoint;

/// A remote service that returns a raw forecast payload on demand.
///
/// No retry or backoff here; transport failures surface as
/// [`Error::ForecastSource`] and the caller decides what to do.
pub trait ForecastSource: Send + Sync {
    fn fetch_forecast(&self) -> impl Future<Output = Result<String, Error>> + Send;
}

/// Converts one upstream payload schema into the canonical series shape.
///
/// Each upstream (with its own column names and date formats) gets its own
/// implementation; downstream code only ever sees [`TimePoint`]s.
pub trait WeatherParser: Send + Sync {
    fn parse_weather(&self, raw: &str) -> Result<Vec<TimePoint>, Error>;
}
