//! envdash - environmental-sensor dashboard daemon
//!
//! Headless mode: polls the sensor feed on an interval and logs readings and
//! cycle reports; fetches the prediction endpoint once at startup and logs
//! per-field model accuracy. Use `envdash-tui` for the interactive view.
//!
//! Module structure:
//! - `domain/` - Core types (FieldId, Reading, ChartSeries)
//! - `io/` - External interfaces (feed client, prediction client)
//! - `services/` - Dashboard logic (poller, slot board, charts, navigation)
//! - `infra/` - Infrastructure (config)

use clap::Parser;
use envdash::infra::Config;
use envdash::io::{PredictionClient, ThingSpeakClient};
use envdash::services::{build_charts, SensorPoller, SlotBoard};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Interval for the periodic slot summary log line.
const SUMMARY_INTERVAL_SECS: u64 = 30;

/// envdash - environmental sensor dashboard (headless)
#[derive(Parser, Debug)]
#[command(name = "envdash", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for per-cycle visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(git_hash = env!("GIT_HASH"), "envdash starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        base_url = %config.base_url(),
        channel_id = %config.channel_id(),
        poll_interval_ms = %config.poll_interval_ms(),
        fields = config.fields().len(),
        predictions_enabled = config.predictions_enabled(),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Shared slot board, written by the poller
    let board = Arc::new(RwLock::new(SlotBoard::new(config.fields())));

    let feed = Arc::new(ThingSpeakClient::new(&config)?);
    let poller = Arc::new(SensorPoller::new(&config, feed, board.clone()));

    // Start the polling loop
    let poller_task = poller.clone();
    let poller_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        poller_task.run(poller_shutdown).await;
    });

    // One-shot prediction fetch (not repeated by the timer)
    if config.predictions_enabled() {
        let prediction_config = config.clone();
        tokio::spawn(async move {
            match PredictionClient::new(&prediction_config) {
                Ok(client) => match client.fetch().await {
                    Ok(predictions) => {
                        let charts = build_charts(&prediction_config, &predictions);
                        for chart in &charts {
                            info!(
                                chart = %chart.id,
                                points = chart.labels.len(),
                                accuracy = %envdash::services::charts::format_accuracy(chart.accuracy),
                                "model_chart_ready"
                            );
                        }
                        if charts.is_empty() {
                            warn!("prediction_response_empty");
                        }
                    }
                    Err(e) => error!(error = %e, "prediction_fetch_failed"),
                },
                Err(e) => error!(error = %e, "prediction_client_init_failed"),
            }
        });
    }

    // Periodic slot summary
    let summary_board = board.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(SUMMARY_INTERVAL_SECS));
        interval.tick().await; // skip the immediate tick
        loop {
            interval.tick().await;
            let snapshot = summary_board.read().snapshot();
            for view in snapshot {
                info!(
                    slot = %view.slot,
                    value = %view.display_value(),
                    status = %view.status.as_str(),
                    "slot_summary"
                );
            }
        }
    });

    // Handle shutdown on Ctrl+C
    tokio::signal::ctrl_c().await.ok();
    info!("shutdown_signal_received");
    let _ = shutdown_tx.send(true);

    info!("envdash shutdown complete");
    Ok(())
}
