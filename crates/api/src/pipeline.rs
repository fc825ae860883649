//! Monitoring pipeline wiring
//!
//! Two producer workers consume their input streams at their own cadence and
//! write the latest result into single-writer watch slots. The fusion loop
//! reads whatever is current on each tick; it never blocks on a producer and
//! never observes a half-written value.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

use alerting::AlertDispatcher;
use ocular_tracker::{OcularSample, OcularStatus, OcularTracker};
use risk_fusion::FusionEngine;
use vitals_classifier::{VitalsClassification, VitalsClassifier, VitalsSample};

use crate::config::MonitorConfig;
use crate::{epoch_ms, AppState};

/// Camera considered absent once the latest status is this old
const OCULAR_ABSENT_AFTER_MS: u64 = 2_000;

/// Handles for the three pipeline tasks
pub struct PipelineHandles {
    pub ocular_worker: JoinHandle<()>,
    pub vitals_worker: JoinHandle<()>,
    pub fusion_loop: JoinHandle<()>,
}

impl PipelineHandles {
    /// Stop all pipeline tasks
    pub fn abort(&self) {
        self.ocular_worker.abort();
        self.vitals_worker.abort();
        self.fusion_loop.abort();
    }
}

/// Spawn the producer workers and the fusion loop
pub fn spawn(
    config: MonitorConfig,
    ocular_rx: mpsc::Receiver<OcularSample>,
    vitals_rx: mpsc::Receiver<VitalsSample>,
    classifier: VitalsClassifier,
    state: Arc<RwLock<AppState>>,
) -> PipelineHandles {
    let (ocular_slot_tx, ocular_slot_rx) = watch::channel(None::<OcularStatus>);
    let (vitals_slot_tx, vitals_slot_rx) = watch::channel(None::<VitalsClassification>);

    let tracker = OcularTracker::new(config.tracker.clone());

    PipelineHandles {
        ocular_worker: tokio::spawn(ocular_worker(ocular_rx, tracker, ocular_slot_tx)),
        vitals_worker: tokio::spawn(vitals_worker(vitals_rx, classifier, vitals_slot_tx)),
        fusion_loop: tokio::spawn(fusion_loop(config, ocular_slot_rx, vitals_slot_rx, state)),
    }
}

/// Consume ocular frames in timestamp order, publish the latest status
async fn ocular_worker(
    mut rx: mpsc::Receiver<OcularSample>,
    mut tracker: OcularTracker,
    slot: watch::Sender<Option<OcularStatus>>,
) {
    while let Some(sample) = rx.recv().await {
        let status = tracker.update(sample);
        if slot.send(Some(status)).is_err() {
            break;
        }
    }
    debug!("ocular stream ended");
}

/// Consume vitals samples, publish the latest classification
async fn vitals_worker(
    mut rx: mpsc::Receiver<VitalsSample>,
    classifier: VitalsClassifier,
    slot: watch::Sender<Option<VitalsClassification>>,
) {
    while let Some(sample) = rx.recv().await {
        let classification = classifier.classify(&sample);
        if slot.send(Some(classification)).is_err() {
            break;
        }
    }
    debug!("vitals stream ended");
}

/// Run the fusion engine once per tick against the latest slot values
async fn fusion_loop(
    config: MonitorConfig,
    ocular_slot: watch::Receiver<Option<OcularStatus>>,
    vitals_slot: watch::Receiver<Option<VitalsClassification>>,
    state: Arc<RwLock<AppState>>,
) {
    let mut engine = FusionEngine::new(config.fusion.clone());
    let mut dispatcher = AlertDispatcher::new(config.alerts.clone());
    let mut ticker = interval(Duration::from_secs_f64(1.0 / config.tick_hz.max(1.0)));

    info!("fusion loop running at {} Hz", config.tick_hz);

    loop {
        ticker.tick().await;
        let now_ms = epoch_ms();

        let ocular = ocular_slot
            .borrow()
            .clone()
            .filter(|s| now_ms.saturating_sub(s.last_updated_ms) <= OCULAR_ABSENT_AFTER_MS);
        let vitals = vitals_slot.borrow().clone();

        let assessment = engine.tick(now_ms, ocular.as_ref(), vitals.as_ref());
        let alert = dispatcher.dispatch(&assessment);

        let mut state = state.write().await;
        state.record(assessment);
        if let Some(alert) = alert {
            state.alert_log.add(alert);
        }
    }
}
