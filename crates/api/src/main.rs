//! Driver Risk Pipeline - Main Entry Point

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, RwLock};
use tracing::info;

use api::config::MonitorConfig;
use api::{init_logging, pipeline, run_server, simulator, AppState};
use vitals_classifier::{ThresholdModel, VitalsClassifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = MonitorConfig::load().context("loading configuration")?;

    info!("=== Driver Risk Pipeline v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "scenario: {:?}, tick rate: {} Hz",
        config.scenario, config.tick_hz
    );

    let state = Arc::new(RwLock::new(AppState::new()));

    let (ocular_tx, ocular_rx) = mpsc::channel(100);
    let (vitals_tx, vitals_rx) = mpsc::channel(16);

    // Two threshold calibrations stand in for the trained model pair
    let classifier = VitalsClassifier::new(
        config.classifier.clone(),
        Box::new(ThresholdModel::conservative()),
        Box::new(ThresholdModel::sensitive()),
    );

    pipeline::spawn(config.clone(), ocular_rx, vitals_rx, classifier, state.clone());
    tokio::spawn(simulator::run(
        config.scenario,
        config.tick_hz,
        ocular_tx,
        vitals_tx,
    ));

    run_server(&config.listen_addr, state)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {}", e))?;

    Ok(())
}
