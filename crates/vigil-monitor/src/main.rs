//! Safety monitor binary.
//!
//! Replays recorded detector output through the trigger engine:
//!
//! ```text
//! vigil-monitor [frames.jsonl]
//! ```

use anyhow::Context;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use metrics_exporter_prometheus::PrometheusBuilder;
use vigil_engine::EngineConfig;
use vigil_monitor::{DetectorEnsemble, Monitor, MonitorConfig, ReplaySource};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vigil_engine=info,vigil_monitor=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vigil-monitor");

    let config = MonitorConfig::from_env();
    info!("Monitor config: {:?}", config);

    if let Err(e) = run(config).await {
        error!("Monitor failed: {:#}", e);
        std::process::exit(1);
    }

    info!("Monitor shutdown complete");
}

async fn run(config: MonitorConfig) -> anyhow::Result<()> {
    if let Some(addr) = config.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!(%addr, "Prometheus metrics listener started");
    }

    let engine_config = match &config.config_path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("invalid engine config {}", path.display()))?,
        None => {
            info!("VIGIL_CONFIG_PATH not set, using default engine config");
            EngineConfig::default()
        }
    };

    let replay_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.replay_path.clone())
        .context("no replay file: pass a path or set VIGIL_REPLAY_PATH")?;

    let source = ReplaySource::open(&replay_path, engine_config.frame_interval())
        .await?
        .with_realtime(config.realtime);
    let ensemble = DetectorEnsemble::standard(&engine_config);

    let handle = Monitor::new(config, engine_config, ensemble)?.start(source);

    // Setup signal handler
    let shutdown = handle.shutdown_trigger();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            shutdown.trigger();
        }
    });

    let summary = handle.wait().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
