//! Simulated sensor streams
//!
//! Generates ocular frames and vitals samples without camera or wearable
//! hardware. Three scenarios cover the interesting bands of both streams.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

use ocular_tracker::OcularSample;
use vitals_classifier::VitalsSample;

/// Simulation scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl Scenario {
    /// EAR sampling range for the scenario
    fn ear_range(self) -> (f32, f32) {
        match self {
            Scenario::Normal => (0.28, 0.38),
            Scenario::Warning => (0.20, 0.26),
            Scenario::Critical => (0.12, 0.22),
        }
    }

    /// Probability a frame is part of a yawn
    fn yawn_probability(self) -> f64 {
        match self {
            Scenario::Normal => 0.01,
            Scenario::Warning => 0.15,
            Scenario::Critical => 0.30,
        }
    }

    fn heart_rate_range(self) -> (f64, f64) {
        match self {
            Scenario::Normal => (65.0, 85.0),
            Scenario::Warning => (105.0, 125.0),
            Scenario::Critical => (135.0, 155.0),
        }
    }

    fn spo2_range(self) -> (f64, f64) {
        match self {
            Scenario::Normal => (97.0, 99.5),
            Scenario::Warning => (94.0, 96.5),
            Scenario::Critical => (91.0, 94.0),
        }
    }

    fn hrv_range(self) -> (f64, f64) {
        match self {
            Scenario::Normal => (40.0, 65.0),
            Scenario::Warning => (20.0, 30.0),
            Scenario::Critical => (10.0, 18.0),
        }
    }

    fn skin_temp_range(self) -> (f64, f64) {
        match self {
            Scenario::Normal => (33.0, 35.5),
            Scenario::Warning => (36.0, 37.5),
            Scenario::Critical => (37.5, 39.0),
        }
    }
}

/// One simulated ocular frame
pub fn ocular_sample(scenario: Scenario, timestamp_ms: u64) -> OcularSample {
    let mut rng = rand::thread_rng();
    let (ear_lo, ear_hi) = scenario.ear_range();
    let mouth_open_ratio = if rng.gen_bool(scenario.yawn_probability()) {
        rng.gen_range(0.65..0.85)
    } else {
        rng.gen_range(0.05..0.25)
    };

    OcularSample {
        timestamp_ms,
        eye_aspect_ratio: rng.gen_range(ear_lo..ear_hi),
        mouth_open_ratio,
    }
}

/// One simulated vitals reading
pub fn vitals_sample(scenario: Scenario, timestamp_ms: u64) -> VitalsSample {
    let mut rng = rand::thread_rng();
    let (hr_lo, hr_hi) = scenario.heart_rate_range();
    let (spo2_lo, spo2_hi) = scenario.spo2_range();
    let (hrv_lo, hrv_hi) = scenario.hrv_range();
    let (skin_lo, skin_hi) = scenario.skin_temp_range();

    VitalsSample {
        timestamp_ms,
        heart_rate_bpm: rng.gen_range(hr_lo..hr_hi),
        spo2_percent: rng.gen_range(spo2_lo..spo2_hi),
        hrv_ms: Some(rng.gen_range(hrv_lo..hrv_hi)),
        skin_temp_c: Some(rng.gen_range(skin_lo..skin_hi)),
    }
}

/// Feed simulated streams into the pipeline until a receiver closes
///
/// Ocular frames at `frame_hz`, vitals once a second (typical wearable
/// cadence).
pub async fn run(
    scenario: Scenario,
    frame_hz: f64,
    ocular_tx: mpsc::Sender<OcularSample>,
    vitals_tx: mpsc::Sender<VitalsSample>,
) {
    info!("simulator started: scenario {:?}, {} fps", scenario, frame_hz);

    let frame_period = Duration::from_secs_f64(1.0 / frame_hz.max(1.0));
    let frames_per_vitals = (frame_hz.max(1.0)).round() as u64;
    let mut ticker = interval(frame_period);
    let mut frame: u64 = 0;

    loop {
        ticker.tick().await;
        let now_ms = crate::epoch_ms();

        if ocular_tx.send(ocular_sample(scenario, now_ms)).await.is_err() {
            warn!("ocular channel closed, stopping simulator");
            return;
        }

        if frame % frames_per_vitals == 0
            && vitals_tx.send(vitals_sample(scenario, now_ms)).await.is_err()
        {
            warn!("vitals channel closed, stopping simulator");
            return;
        }

        frame += 1;
    }
}
