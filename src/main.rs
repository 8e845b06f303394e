//! Boiler-bot: district-heating boiler setpoint predictor.
//!
//! Single-binary Tokio application that:
//! 1. Loads the heating curve, the optimized setpoint table, and per-home lags
//! 2. Keeps an outdoor-weather forecast cache fresh from the SoftM server
//! 3. Periodically predicts the boiler supply temperature for the next window
//! 4. Logs the predicted setpoints for the controller to pick up

mod config;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use clap::Parser;
use tokio::time::sleep;
use tracing::{error, info, warn};

use common::config::BoilerConfig;
use common::types::TimePoint;
use common::Error;
use predictor::{ForecastCache, HomeTimeDeltas, OptimizedLookupTable, SetpointEngine, TempGraph};
use softm_client::parse::{SoftMTempGraphParser, SoftMWeatherParser};
use softm_client::SoftMWeatherClient;

/// District-heating boiler setpoint predictor
#[derive(Parser)]
#[command(name = "boiler-bot", about = "district-heating boiler setpoint predictor")]
struct Cli {
    /// Run a single prediction, print it as JSON, and exit.
    #[arg(long)]
    once: bool,

    /// Prediction window start (RFC 3339); defaults to now.
    #[arg(long)]
    start: Option<String>,

    /// Prediction window end (RFC 3339); defaults to start + horizon.
    #[arg(long)]
    end: Option<String>,

    /// Override the configured prediction horizon, in ticks.
    #[arg(long)]
    horizon_ticks: Option<u32>,
}

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

type Engine = SetpointEngine<SoftMWeatherClient, SoftMWeatherParser>;

/// Load the temperature graph from the file artifact, falling back to the
/// SoftM server when the file is absent.
async fn load_temp_graph(cfg: &BoilerConfig, client: &SoftMWeatherClient) -> Result<TempGraph, Error> {
    let path = std::path::Path::new(&cfg.temp_graph_path);
    let raw = if path.exists() {
        info!("Loading temp graph from {}", path.display());
        std::fs::read_to_string(path)?
    } else {
        info!("No temp graph file at {}; fetching from server", path.display());
        client.fetch_temp_graph().await?
    };

    TempGraph::new(SoftMTempGraphParser.parse_temp_graph(&raw)?)
}

fn build_engine(cfg: &BoilerConfig, temp_graph: TempGraph, client: SoftMWeatherClient) -> Result<Engine, Error> {
    let offset = FixedOffset::east_opt(cfg.server_utc_offset_hours * 3600)
        .ok_or_else(|| Error::Config("server_utc_offset_hours out of range".into()))?;

    let lookup_table = OptimizedLookupTable::load(&cfg.optimized_t_table_path)?;
    let homes = HomeTimeDeltas::load(&cfg.homes_deltas_path)?;
    let tick = chrono::Duration::seconds(cfg.tick_secs as i64);

    let cache = ForecastCache::new(
        client,
        SoftMWeatherParser::new(offset),
        tick,
        Duration::from_secs(cfg.update_interval_secs),
    );

    Ok(SetpointEngine::new(
        cache,
        temp_graph,
        lookup_table,
        homes,
        cfg.home_t_dispersion_coefficient,
        tick,
    ))
}

/// Resolve the prediction window from CLI args, defaulting to
/// `[now, now + horizon)` in the server's offset.
fn resolve_window(
    cli: &Cli,
    cfg: &BoilerConfig,
) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), Error> {
    let offset = FixedOffset::east_opt(cfg.server_utc_offset_hours * 3600)
        .ok_or_else(|| Error::Config("server_utc_offset_hours out of range".into()))?;
    let tick = chrono::Duration::seconds(cfg.tick_secs as i64);
    let horizon = tick * cfg.timing.horizon_ticks as i32;

    let start = match &cli.start {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|e| Error::Config(format!("bad --start value {:?}: {}", raw, e)))?,
        None => Utc::now().with_timezone(&offset),
    };
    let end = match &cli.end {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|e| Error::Config(format!("bad --end value {:?}: {}", raw, e)))?,
        None => start + horizon,
    };

    Ok((start, end))
}

async fn run_prediction_cycle(engine: &Engine, cfg: &BoilerConfig) {
    let offset = match FixedOffset::east_opt(cfg.server_utc_offset_hours * 3600) {
        Some(offset) => offset,
        None => return,
    };
    let tick = chrono::Duration::seconds(cfg.tick_secs as i64);
    let start = Utc::now().with_timezone(&offset);
    let end = start + tick * cfg.timing.horizon_ticks as i32;

    match engine.predict(start, end).await {
        Ok(setpoints) => {
            for point in &setpoints {
                info!("  {} → {:.1}°C", point.timestamp.to_rfc3339(), point.value);
            }
        }
        Err(e) => {
            warn!("Prediction cycle failed: {}", e);
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boiler_bot=info,softm_client=info,predictor=info".into()),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    info!("Boiler bot starting up...");

    // Load configuration.
    let mut cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(horizon_ticks) = cli.horizon_ticks {
        cfg.timing.horizon_ticks = horizon_ticks;
    }

    info!("Weather server: {}", cfg.server_address);
    info!(
        "Grid: tick={}s, horizon={} ticks, forecast refresh every {}s",
        cfg.tick_secs, cfg.timing.horizon_ticks, cfg.update_interval_secs
    );
    info!(
        "Aggregation: dispersion coefficient {:.2}",
        cfg.home_t_dispersion_coefficient
    );

    let client = SoftMWeatherClient::new(cfg.server_address.clone());

    let temp_graph = match load_temp_graph(&cfg, &client).await {
        Ok(graph) => graph,
        Err(e) => {
            error!("Failed to load temp graph: {}", e);
            std::process::exit(1);
        }
    };

    let engine = match build_engine(&cfg, temp_graph, client) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to build prediction engine: {}", e);
            std::process::exit(1);
        }
    };
    let engine = Arc::new(engine);

    // ── Once mode ────────────────────────────────────────────────────
    if cli.once {
        let (start, end) = match resolve_window(&cli, &cfg) {
            Ok(window) => window,
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        };

        match engine.predict(start, end).await {
            Ok(setpoints) => {
                let rows: Vec<(String, f64)> = setpoints
                    .iter()
                    .map(|p: &TimePoint| {
                        (p.timestamp.to_rfc3339(), (p.value * 10.0).round() / 10.0)
                    })
                    .collect();
                match serde_json::to_string_pretty(&rows) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize prediction: {}", e);
                        std::process::exit(1);
                    }
                }
            }
            Err(e) => {
                error!("Prediction failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // ── Spawn tasks ──────────────────────────────────────────────────
    info!("Spawning tasks...");

    // Task 1: Prediction loop
    let pred_engine = engine.clone();
    let pred_cfg = cfg.clone();
    let prediction_handle = tokio::spawn(async move {
        loop {
            info!("Running prediction cycle...");
            run_prediction_cycle(&pred_engine, &pred_cfg).await;
            sleep(Duration::from_secs(pred_cfg.timing.scan_interval_secs)).await;
        }
    });

    // Task 2: Heartbeat
    let hb_cfg = cfg.clone();
    let heartbeat_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            info!(
                "HEARTBEAT: scan={}s horizon={} ticks",
                hb_cfg.timing.scan_interval_secs, hb_cfg.timing.horizon_ticks
            );
        }
    });

    // ── Wait for shutdown ────────────────────────────────────────────
    info!("Boiler bot is running. Press Ctrl+C to stop.");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        r = prediction_handle => {
            error!("Prediction task exited: {:?}", r);
        }
        r = heartbeat_handle => {
            error!("Heartbeat task exited: {:?}", r);
        }
    }

    info!("Boiler bot shut down.");
}
