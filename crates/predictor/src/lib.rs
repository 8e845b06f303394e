//! Prediction engine for district-heating boiler control.
//!
//! Turns a cached outdoor-weather forecast, a heating-curve graph, a
//! precomputed setpoint table, and per-home thermal lags into a predicted
//! boiler supply-temperature series on a fixed time grid.

pub mod cache;
pub mod engine;
pub mod interpolate;
pub mod tables;
pub mod temp_graph;
pub mod timegrid;

pub use cache::ForecastCache;
pub use engine::SetpointEngine;
pub use tables::{HomeTimeDelta, HomeTimeDeltas, OptimizedLookupTable};
pub use temp_graph::TempGraph;
