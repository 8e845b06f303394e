//! Bot configuration types.

use serde::{Deserialize, Serialize};

/// Top-level bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoilerConfig {
    /// Base address of the SoftM weather server.
    #[serde(default = "default_server_address")]
    pub server_address: String,

    /// UTC offset (whole hours) the weather server reports timestamps in.
    #[serde(default = "default_server_utc_offset_hours")]
    pub server_utc_offset_hours: i32,

    /// Width of the prediction grid tick, in seconds.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Max age of the cached forecast before a re-fetch (seconds).
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,

    /// How far per-home required temperatures are pulled toward the
    /// worst-case home (0 = mean, 1 = max).
    #[serde(default = "default_dispersion_coefficient")]
    pub home_t_dispersion_coefficient: f64,

    /// Path to the temperature-graph JSON artifact.
    #[serde(default = "default_temp_graph_path")]
    pub temp_graph_path: String,

    /// Path to the precomputed required-t → boiler-t CSV artifact.
    #[serde(default = "default_t_table_path")]
    pub optimized_t_table_path: String,

    /// Path to the per-home lag CSV artifact.
    #[serde(default = "default_homes_deltas_path")]
    pub homes_deltas_path: String,

    /// Timing parameters.
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Timing configuration for the service loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Interval between prediction cycles (seconds).
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Length of the predicted window, in ticks.
    #[serde(default = "default_horizon_ticks")]
    pub horizon_ticks: u32,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_server_address() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_server_utc_offset_hours() -> i32 {
    5
}

fn default_tick_secs() -> u64 {
    180
}

fn default_update_interval() -> u64 {
    1800
}

fn default_dispersion_coefficient() -> f64 {
    1.0
}

fn default_temp_graph_path() -> String {
    "data/temp_graph.json".into()
}

fn default_t_table_path() -> String {
    "data/optimized_t_table.csv".into()
}

fn default_homes_deltas_path() -> String {
    "data/homes_time_deltas.csv".into()
}

fn default_scan_interval() -> u64 {
    180
}

fn default_horizon_ticks() -> u32 {
    20
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            horizon_ticks: default_horizon_ticks(),
        }
    }
}

impl Default for BoilerConfig {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            server_utc_offset_hours: default_server_utc_offset_hours(),
            tick_secs: default_tick_secs(),
            update_interval_secs: default_update_interval(),
            home_t_dispersion_coefficient: default_dispersion_coefficient(),
            temp_graph_path: default_temp_graph_path(),
            optimized_t_table_path: default_t_table_path(),
            homes_deltas_path: default_homes_deltas_path(),
            timing: TimingConfig::default(),
        }
    }
}
