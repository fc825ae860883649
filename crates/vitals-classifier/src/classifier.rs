//! Dual-model fusion classifier with clinical overrides

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::level::RiskLevel;
use crate::model::{ClassProbabilities, RiskModel, VitalsFeatures};

/// Fallback thresholds with no configuration knob; taken from the training
/// label rules of the health model
const HR_CRITICAL_LOW_BPM: f64 = 45.0;
const HR_WARNING_HIGH_BPM: f64 = 110.0;
const HRV_CRITICAL_MS: f64 = 15.0;
const HRV_WARNING_MS: f64 = 25.0;
const SKIN_TEMP_CRITICAL_C: f64 = 38.0;

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Weight for model A probabilities
    pub model_a_weight: f64,
    /// Weight for model B probabilities
    pub model_b_weight: f64,
    /// Heart rate above this forces Critical
    pub heart_rate_critical_bpm: f64,
    /// Heart rate below this forces at least Warning
    pub heart_rate_warn_low_bpm: f64,
    /// SpO2 below this forces Critical
    pub spo2_critical_percent: f64,
    /// SpO2 below this forces at least Warning
    pub spo2_warning_percent: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_a_weight: 0.45,
            model_b_weight: 0.55,
            heart_rate_critical_bpm: 140.0,
            heart_rate_warn_low_bpm: 50.0,
            spo2_critical_percent: 94.0,
            spo2_warning_percent: 96.0,
        }
    }
}

/// One vitals sensor reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VitalsSample {
    /// Capture timestamp (epoch milliseconds)
    pub timestamp_ms: u64,
    pub heart_rate_bpm: f64,
    pub spo2_percent: f64,
    /// Heart rate variability, if the sensor reports it
    pub hrv_ms: Option<f64>,
    /// Skin temperature, if the sensor reports it
    pub skin_temp_c: Option<f64>,
}

/// Classification result, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalsClassification {
    /// Fused probabilities for {Normal, Warning, Critical}; sums to 1.0
    pub class_probabilities: ClassProbabilities,
    /// Final label after fusion and overrides
    pub fused_label: RiskLevel,
    /// Highest fused probability (pre-override)
    pub confidence: f64,
    /// Value-bearing trigger tokens, e.g. "hr_145", "spo2_93"
    pub triggers: BTreeSet<String>,
    /// Whether threshold-only fallback replaced the model scores
    pub used_fallback: bool,
    /// Timestamp of the classified sample (epoch ms)
    pub timestamp_ms: u64,
}

/// Vitals risk classifier fusing two injected models
pub struct VitalsClassifier {
    config: ClassifierConfig,
    model_a: Box<dyn RiskModel>,
    model_b: Box<dyn RiskModel>,
}

impl VitalsClassifier {
    /// Create a classifier around two trained models
    pub fn new(
        config: ClassifierConfig,
        model_a: Box<dyn RiskModel>,
        model_b: Box<dyn RiskModel>,
    ) -> Self {
        Self {
            config,
            model_a,
            model_b,
        }
    }

    /// Classify one vitals sample; never fails
    ///
    /// Model scoring errors degrade to threshold-only classification, and
    /// clinical overrides are applied after fusion in all cases.
    pub fn classify(&self, sample: &VitalsSample) -> VitalsClassification {
        let features = features_from(sample);

        let (mut probs, used_fallback) =
            match (self.model_a.score(&features), self.model_b.score(&features)) {
                (Ok(a), Ok(b)) => {
                    let mut fused = [0.0; 3];
                    for i in 0..3 {
                        fused[i] =
                            self.config.model_a_weight * a[i] + self.config.model_b_weight * b[i];
                    }
                    (fused, false)
                }
                (a, b) => {
                    if let Err(e) = a {
                        warn!("model A failed to score: {}", e);
                    }
                    if let Err(e) = b {
                        warn!("model B failed to score: {}", e);
                    }
                    let label = self.threshold_label(&features);
                    (crate::model::soft_distribution(label, 1.0), true)
                }
            };

        // Model outputs may drift from a proper distribution
        let sum: f64 = probs.iter().sum();
        if sum > 0.0 {
            for p in &mut probs {
                *p /= sum;
            }
        } else {
            probs = [1.0, 0.0, 0.0];
        }

        let mut label = argmax_by_severity(&probs);
        let confidence = probs[label.index()];

        let mut triggers = BTreeSet::new();
        if used_fallback {
            triggers.insert("model_fallback".to_string());
        }

        // Clinical overrides: thresholds always out-rank model confidence
        let hr = features.heart_rate_bpm;
        let spo2 = features.spo2_percent;
        if hr > self.config.heart_rate_critical_bpm {
            triggers.insert(format!("hr_{:.0}", hr));
            label = label.max(RiskLevel::Critical);
        } else if hr < self.config.heart_rate_warn_low_bpm {
            triggers.insert(format!("hr_{:.0}", hr));
            label = label.max(RiskLevel::Warning);
        }
        if spo2 < self.config.spo2_critical_percent {
            triggers.insert(format!("spo2_{:.0}", spo2));
            label = label.max(RiskLevel::Critical);
        } else if spo2 < self.config.spo2_warning_percent {
            triggers.insert(format!("spo2_{:.0}", spo2));
            label = label.max(RiskLevel::Warning);
        }

        debug!(
            "vitals classified: label={} confidence={:.2} fallback={}",
            label.as_str(),
            confidence,
            used_fallback
        );

        VitalsClassification {
            class_probabilities: probs,
            fused_label: label,
            confidence,
            triggers,
            used_fallback,
            timestamp_ms: sample.timestamp_ms,
        }
    }

    /// Threshold-only classification used when a model cannot score
    fn threshold_label(&self, features: &VitalsFeatures) -> RiskLevel {
        let hr = features.heart_rate_bpm;
        let spo2 = features.spo2_percent;
        let hrv_below = |limit: f64| features.hrv_ms.is_some_and(|v| v < limit);
        let skin_above = |limit: f64| features.skin_temp_c.is_some_and(|v| v > limit);

        if hr > self.config.heart_rate_critical_bpm
            || hr < HR_CRITICAL_LOW_BPM
            || spo2 < self.config.spo2_critical_percent
            || hrv_below(HRV_CRITICAL_MS)
            || skin_above(SKIN_TEMP_CRITICAL_C)
        {
            RiskLevel::Critical
        } else if hr > HR_WARNING_HIGH_BPM
            || hr < self.config.heart_rate_warn_low_bpm
            || spo2 < self.config.spo2_warning_percent
            || hrv_below(HRV_WARNING_MS)
        {
            RiskLevel::Warning
        } else {
            RiskLevel::Normal
        }
    }
}

/// Build the model feature vector, clamping sensor noise into plausible
/// physiological ranges
fn features_from(sample: &VitalsSample) -> VitalsFeatures {
    VitalsFeatures {
        heart_rate_bpm: clamp_vital(sample.heart_rate_bpm, 0.0, 300.0, 75.0),
        spo2_percent: clamp_vital(sample.spo2_percent, 0.0, 100.0, 98.0),
        hrv_ms: sample.hrv_ms.filter(|v| v.is_finite()),
        skin_temp_c: sample.skin_temp_c.filter(|v| v.is_finite()),
    }
}

fn clamp_vital(value: f64, min: f64, max: f64, neutral: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        neutral
    }
}

/// Argmax over class probabilities, ties broken by severity
fn argmax_by_severity(probs: &ClassProbabilities) -> RiskLevel {
    let mut best = RiskLevel::Critical;
    for level in [RiskLevel::Warning, RiskLevel::Normal] {
        if probs[level.index()] > probs[best.index()] {
            best = level;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelError, RiskModel};

    struct ConstantModel(ClassProbabilities);

    impl RiskModel for ConstantModel {
        fn score(&self, _features: &VitalsFeatures) -> Result<ClassProbabilities, ModelError> {
            Ok(self.0)
        }
    }

    struct FailingModel;

    impl RiskModel for FailingModel {
        fn score(&self, _features: &VitalsFeatures) -> Result<ClassProbabilities, ModelError> {
            Err(ModelError::Scoring("simulated failure".into()))
        }
    }

    fn classifier(a: ClassProbabilities, b: ClassProbabilities) -> VitalsClassifier {
        VitalsClassifier::new(
            ClassifierConfig::default(),
            Box::new(ConstantModel(a)),
            Box::new(ConstantModel(b)),
        )
    }

    fn sample(hr: f64, spo2: f64) -> VitalsSample {
        VitalsSample {
            timestamp_ms: 1_000,
            heart_rate_bpm: hr,
            spo2_percent: spo2,
            hrv_ms: None,
            skin_temp_c: None,
        }
    }

    #[test]
    fn test_weighted_fusion() {
        let c = classifier([0.8, 0.2, 0.0], [0.2, 0.8, 0.0]);
        let result = c.classify(&sample(75.0, 98.0));

        // 0.45*0.8 + 0.55*0.2 = 0.47 normal, 0.45*0.2 + 0.55*0.8 = 0.53 warning
        assert_eq!(result.fused_label, RiskLevel::Warning);
        assert!((result.class_probabilities[0] - 0.47).abs() < 1e-9);
        assert!((result.class_probabilities[1] - 0.53).abs() < 1e-9);
        assert!((result.confidence - 0.53).abs() < 1e-9);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let c = classifier([0.6, 0.3, 0.3], [0.5, 0.5, 0.5]);
        let result = c.classify(&sample(75.0, 98.0));
        let sum: f64 = result.class_probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_broken_by_severity() {
        let third = 1.0 / 3.0;
        let c = classifier([third; 3], [third; 3]);
        let result = c.classify(&sample(75.0, 98.0));
        assert_eq!(result.fused_label, RiskLevel::Critical);
    }

    #[test]
    fn test_high_heart_rate_overrides_models() {
        // Models are certain everything is fine
        let c = classifier([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let result = c.classify(&sample(145.0, 98.0));
        assert_eq!(result.fused_label, RiskLevel::Critical);
        assert!(result.triggers.contains("hr_145"));
    }

    #[test]
    fn test_low_spo2_overrides_models() {
        let c = classifier([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let result = c.classify(&sample(75.0, 93.0));
        assert_eq!(result.fused_label, RiskLevel::Critical);
        assert!(result.triggers.contains("spo2_93"));
    }

    #[test]
    fn test_low_heart_rate_forces_warning() {
        let c = classifier([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let result = c.classify(&sample(48.0, 98.0));
        assert_eq!(result.fused_label, RiskLevel::Warning);
        assert!(result.triggers.contains("hr_48"));
    }

    #[test]
    fn test_marginal_spo2_forces_warning() {
        let c = classifier([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let result = c.classify(&sample(75.0, 95.0));
        assert_eq!(result.fused_label, RiskLevel::Warning);
    }

    #[test]
    fn test_override_never_downgrades_model_critical() {
        let c = classifier([0.0, 0.0, 1.0], [0.0, 0.0, 1.0]);
        let result = c.classify(&sample(75.0, 98.0));
        assert_eq!(result.fused_label, RiskLevel::Critical);
    }

    #[test]
    fn test_model_failure_degrades_to_thresholds() {
        let c = VitalsClassifier::new(
            ClassifierConfig::default(),
            Box::new(FailingModel),
            Box::new(ConstantModel([1.0, 0.0, 0.0])),
        );

        let result = c.classify(&sample(120.0, 98.0));
        assert!(result.used_fallback);
        assert!(result.triggers.contains("model_fallback"));
        assert_eq!(result.fused_label, RiskLevel::Warning);

        let result = c.classify(&sample(75.0, 98.0));
        assert_eq!(result.fused_label, RiskLevel::Normal);
    }

    #[test]
    fn test_fallback_uses_hrv_and_skin_temp() {
        let c = VitalsClassifier::new(
            ClassifierConfig::default(),
            Box::new(FailingModel),
            Box::new(FailingModel),
        );

        let mut s = sample(75.0, 98.0);
        s.hrv_ms = Some(10.0);
        assert_eq!(c.classify(&s).fused_label, RiskLevel::Critical);

        let mut s = sample(75.0, 98.0);
        s.skin_temp_c = Some(39.0);
        assert_eq!(c.classify(&s).fused_label, RiskLevel::Critical);

        let mut s = sample(75.0, 98.0);
        s.hrv_ms = Some(20.0);
        assert_eq!(c.classify(&s).fused_label, RiskLevel::Warning);
    }

    #[test]
    fn test_out_of_range_vitals_are_clamped() {
        let c = classifier([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        // Clamps to 300 bpm, still far beyond the critical threshold
        let result = c.classify(&sample(4000.0, 98.0));
        assert_eq!(result.fused_label, RiskLevel::Critical);
        assert!(result.triggers.contains("hr_300"));
    }

    #[test]
    fn test_non_finite_vitals_fall_back_to_neutral() {
        let c = classifier([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let result = c.classify(&sample(f64::NAN, f64::INFINITY));
        assert_eq!(result.fused_label, RiskLevel::Normal);
    }
}
