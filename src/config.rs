//! Configuration loader — merges defaults, config.toml, and env vars.

use common::config::BoilerConfig;
use common::Error;
use std::path::Path;

fn parse_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer >= 0")))
}

fn parse_u32(raw: &str, env_name: &str) -> Result<u32, Error> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer >= 0")))
}

fn parse_i32(raw: &str, env_name: &str) -> Result<i32, Error> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer")))
}

fn parse_f64(raw: &str, env_name: &str) -> Result<f64, Error> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| Error::Config(format!("{env_name} must be a number")))
}

fn validate_config(config: &BoilerConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.server_address.trim().is_empty() {
        issues.push("server_address must not be empty".into());
    }
    if !(-12..=14).contains(&config.server_utc_offset_hours) {
        issues.push("server_utc_offset_hours must be in [-12, 14]".into());
    }
    if config.tick_secs == 0 {
        issues.push("tick_secs must be > 0".into());
    }
    if config.update_interval_secs == 0 {
        issues.push("update_interval_secs must be > 0".into());
    }
    if !(0.0..=1.0).contains(&config.home_t_dispersion_coefficient) {
        issues.push("home_t_dispersion_coefficient must be in [0, 1]".into());
    }
    if config.temp_graph_path.trim().is_empty() {
        issues.push("temp_graph_path must not be empty".into());
    }
    if config.optimized_t_table_path.trim().is_empty() {
        issues.push("optimized_t_table_path must not be empty".into());
    }
    if config.homes_deltas_path.trim().is_empty() {
        issues.push("homes_deltas_path must not be empty".into());
    }
    if config.timing.scan_interval_secs == 0 {
        issues.push("timing.scan_interval_secs must be > 0".into());
    }
    if config.timing.horizon_ticks == 0 {
        issues.push("timing.horizon_ticks must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load bot configuration from environment and optional config file.
pub fn load_config() -> Result<BoilerConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = BoilerConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // 4. Override with environment variables (highest priority).
    if let Ok(addr) = std::env::var("BOILER_SERVER_ADDRESS") {
        config.server_address = addr;
    }
    if let Ok(raw) = std::env::var("BOILER_SERVER_UTC_OFFSET_HOURS") {
        config.server_utc_offset_hours = parse_i32(&raw, "BOILER_SERVER_UTC_OFFSET_HOURS")?;
    }
    if let Ok(raw) = std::env::var("BOILER_TICK_SECS") {
        config.tick_secs = parse_u64(&raw, "BOILER_TICK_SECS")?;
    }
    if let Ok(raw) = std::env::var("BOILER_UPDATE_INTERVAL_SECS") {
        config.update_interval_secs = parse_u64(&raw, "BOILER_UPDATE_INTERVAL_SECS")?;
    }
    if let Ok(raw) = std::env::var("BOILER_DISPERSION_COEFFICIENT") {
        config.home_t_dispersion_coefficient = parse_f64(&raw, "BOILER_DISPERSION_COEFFICIENT")?;
    }
    if let Ok(path) = std::env::var("BOILER_TEMP_GRAPH_PATH") {
        config.temp_graph_path = path;
    }
    if let Ok(path) = std::env::var("BOILER_T_TABLE_PATH") {
        config.optimized_t_table_path = path;
    }
    if let Ok(path) = std::env::var("BOILER_HOMES_DELTAS_PATH") {
        config.homes_deltas_path = path;
    }
    if let Ok(raw) = std::env::var("BOILER_SCAN_INTERVAL_SECS") {
        config.timing.scan_interval_secs = parse_u64(&raw, "BOILER_SCAN_INTERVAL_SECS")?;
    }
    if let Ok(raw) = std::env::var("BOILER_HORIZON_TICKS") {
        config.timing.horizon_ticks = parse_u32(&raw, "BOILER_HORIZON_TICKS")?;
    }

    // 5. Validate.
    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&BoilerConfig::default()).is_ok());
    }

    #[test]
    fn zero_tick_is_rejected() {
        let config = BoilerConfig {
            tick_secs: 0,
            ..BoilerConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn out_of_range_dispersion_is_rejected() {
        let config = BoilerConfig {
            home_t_dispersion_coefficient: 1.5,
            ..BoilerConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn silly_utc_offset_is_rejected() {
        let config = BoilerConfig {
            server_utc_offset_hours: 26,
            ..BoilerConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
