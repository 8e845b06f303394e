//! SoftM district-heating server client.
//!
//! Fetches the outdoor-temperature forecast from the SoftM JSON endpoint
//! and hands the raw payload to the parsing layer.

pub mod parse;

use common::source::ForecastSource;
use common::Error;
use tracing::debug;

/// SoftM HTTP client with connection pooling and a request timeout.
#[derive(Debug, Clone)]
pub struct SoftMWeatherClient {
    client: reqwest::Client,
    server_address: String,
}

impl SoftMWeatherClient {
    pub fn new(server_address: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("boiler-bot/0.1")
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build SoftM HTTP client");

        Self {
            client,
            server_address: server_address.into(),
        }
    }

    /// Call a SoftM JSON method and return the raw response body.
    async fn get_json(&self, method: &str) -> Result<String, Error> {
        let url = format!("{}/JSON/", self.server_address);

        debug!("Fetching {} from {}", method, url);

        let resp = self
            .client
            .get(&url)
            .query(&[("method", method)])
            .send()
            .await
            .map_err(|e| Error::ForecastSource(format!("HTTP error for {}: {}", method, e)))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::ForecastSource(format!(
                "SoftM returned {} for {}: {}",
                status,
                method,
                &body[..body.len().min(500)]
            )));
        }

        resp.text()
            .await
            .map_err(|e| Error::ForecastSource(format!("body read error for {}: {}", method, e)))
    }

    /// Fetch the raw temperature-graph payload.
    pub async fn fetch_temp_graph(&self) -> Result<String, Error> {
        self.get_json("getTempGraphic").await
    }
}

impl ForecastSource for SoftMWeatherClient {
    async fn fetch_forecast(&self) -> Result<String, Error> {
        self.get_json("getPrognozT").await
    }
}
