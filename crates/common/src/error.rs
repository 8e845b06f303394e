//! Unified error type for the boiler-bot.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid series: {0}")]
    InvalidSeries(String),

    #[error("forecast source error: {0}")]
    ForecastSource(String),

    #[error("insufficient forecast data: {0}")]
    InsufficientData(String),

    #[error("no homes configured")]
    NoHomesConfigured,

    #[error("temperature graph error: {0}")]
    TempGraph(String),

    #[error("table artifact error: {0}")]
    Artifact(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
