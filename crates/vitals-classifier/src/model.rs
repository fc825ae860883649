//! Risk model capability and the built-in threshold model

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::level::RiskLevel;

/// Probability distribution over {Normal, Warning, Critical}, indexed by
/// [`RiskLevel::index`]
pub type ClassProbabilities = [f64; 3];

/// Model scoring error types
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Malformed feature vector: {0}")]
    MalformedFeatures(String),

    #[error("Scoring failed: {0}")]
    Scoring(String),
}

/// Feature vector passed to the risk models
///
/// HRV and skin temperature are optional; sensors that only report heart
/// rate and SpO2 leave them unset.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VitalsFeatures {
    pub heart_rate_bpm: f64,
    pub spo2_percent: f64,
    pub hrv_ms: Option<f64>,
    pub skin_temp_c: Option<f64>,
}

/// Opaque scoring capability
///
/// Any trained classifier (tree ensemble, lookup table, test stub) satisfies
/// this; the classifier never trains or persists models itself.
pub trait RiskModel: Send + Sync {
    /// Score a feature vector into a class-probability distribution
    fn score(&self, features: &VitalsFeatures) -> Result<ClassProbabilities, ModelError>;
}

/// Rule-based model mapping clinical bands to a soft distribution
///
/// Stands in for a trained ensemble in demos and as a baseline; two
/// calibrations approximate the conservative/sensitive split of a model
/// pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdModel {
    /// Heart rate above this scores Critical
    pub hr_critical_bpm: f64,
    /// Heart rate above this scores Warning
    pub hr_warning_bpm: f64,
    /// SpO2 below this scores Critical
    pub spo2_critical_percent: f64,
    /// SpO2 below this scores Warning
    pub spo2_warning_percent: f64,
    /// Probability mass placed on the chosen class
    pub confidence: f64,
}

impl ThresholdModel {
    /// Calibration that flags only clearly abnormal vitals
    pub fn conservative() -> Self {
        Self {
            hr_critical_bpm: 140.0,
            hr_warning_bpm: 115.0,
            spo2_critical_percent: 93.0,
            spo2_warning_percent: 95.5,
            confidence: 0.9,
        }
    }

    /// Calibration that escalates earlier
    pub fn sensitive() -> Self {
        Self {
            hr_critical_bpm: 135.0,
            hr_warning_bpm: 108.0,
            spo2_critical_percent: 94.0,
            spo2_warning_percent: 96.5,
            confidence: 0.8,
        }
    }
}

impl RiskModel for ThresholdModel {
    fn score(&self, features: &VitalsFeatures) -> Result<ClassProbabilities, ModelError> {
        if !features.heart_rate_bpm.is_finite() || !features.spo2_percent.is_finite() {
            return Err(ModelError::MalformedFeatures(format!(
                "non-finite vitals: hr={} spo2={}",
                features.heart_rate_bpm, features.spo2_percent
            )));
        }

        let hr = features.heart_rate_bpm;
        let spo2 = features.spo2_percent;

        let label = if hr > self.hr_critical_bpm || spo2 < self.spo2_critical_percent {
            RiskLevel::Critical
        } else if hr > self.hr_warning_bpm || spo2 < self.spo2_warning_percent {
            RiskLevel::Warning
        } else {
            RiskLevel::Normal
        };

        Ok(soft_distribution(label, self.confidence))
    }
}

/// Place `confidence` on `label` and split the remainder over the other two
/// classes
pub fn soft_distribution(label: RiskLevel, confidence: f64) -> ClassProbabilities {
    let confidence = confidence.clamp(0.0, 1.0);
    let rest = (1.0 - confidence) / 2.0;
    let mut probs = [rest; 3];
    probs[label.index()] = confidence;
    probs
}
