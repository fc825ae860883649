//! Fusion engine implementation

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ocular_tracker::OcularStatus;
use vitals_classifier::{RiskLevel, VitalsClassification};

use crate::assessment::RiskAssessment;

/// Fusion engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Consecutive closed frames beyond this (strict greater-than) is
    /// Critical on its own
    pub closed_frames_critical: u32,

    /// Blink rate per minute above this contributes a Warning
    pub blink_rate_warning: f32,

    /// Yawn count at or above this contributes a Warning
    pub yawn_count_warning: u32,

    /// Vitals older than this are treated as absent (milliseconds)
    pub vitals_staleness_ms: u64,

    /// Consecutive qualifying ticks before a downgrade is accepted
    pub hysteresis_ticks: u32,

    /// With no input at all for this long, report Warning "no_signal"
    /// instead of holding the last level (milliseconds)
    pub no_signal_grace_ms: u64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            closed_frames_critical: 20,
            blink_rate_warning: 25.0,
            yawn_count_warning: 3,
            vitals_staleness_ms: 10_000,
            hysteresis_ticks: 3,
            no_signal_grace_ms: 5_000,
        }
    }
}

/// Risk fusion and alert decision engine
///
/// Holds only the accepted level, the pending-downgrade run, and the last
/// time any input was seen. Upstream state arrives as read-only snapshots.
pub struct FusionEngine {
    config: FusionConfig,
    accepted: RiskLevel,
    /// Candidate downgrade level and its consecutive-tick count
    pending_downgrade: Option<(RiskLevel, u32)>,
    last_input_ms: Option<u64>,
}

impl FusionEngine {
    /// Create a new engine starting at Normal
    pub fn new(config: FusionConfig) -> Self {
        Self {
            config,
            accepted: RiskLevel::Normal,
            pending_downgrade: None,
            last_input_ms: None,
        }
    }

    /// Currently accepted risk level
    pub fn level(&self) -> RiskLevel {
        self.accepted
    }

    /// Run one decision tick against the latest upstream snapshots
    ///
    /// Absent or stale inputs degrade the decision, they never fail it.
    pub fn tick(
        &mut self,
        now_ms: u64,
        ocular: Option<&OcularStatus>,
        vitals: Option<&VitalsClassification>,
    ) -> RiskAssessment {
        let mut reasons = BTreeSet::new();

        let fresh_vitals = vitals
            .filter(|v| now_ms.saturating_sub(v.timestamp_ms) <= self.config.vitals_staleness_ms);
        if vitals.is_some() && fresh_vitals.is_none() {
            reasons.insert("vitals_stale".to_string());
        }

        let ocular_level = match ocular {
            Some(status) => self.ocular_level(status, &mut reasons),
            None => {
                reasons.insert("ocular_absent".to_string());
                RiskLevel::Normal
            }
        };

        let vitals_level = match fresh_vitals {
            Some(classification) => {
                if classification.fused_label >= RiskLevel::Warning {
                    if classification.triggers.is_empty() {
                        reasons.insert(match classification.fused_label {
                            RiskLevel::Critical => "vitals_critical".to_string(),
                            _ => "vitals_warning".to_string(),
                        });
                    } else {
                        reasons.extend(classification.triggers.iter().cloned());
                    }
                }
                classification.fused_label
            }
            None => RiskLevel::Normal,
        };

        let mut raw = ocular_level.max(vitals_level);

        if ocular.is_some() || fresh_vitals.is_some() {
            self.last_input_ms = Some(now_ms);
        }
        let last_seen = *self.last_input_ms.get_or_insert(now_ms);
        if ocular.is_none()
            && fresh_vitals.is_none()
            && now_ms.saturating_sub(last_seen) >= self.config.no_signal_grace_ms
        {
            raw = raw.max(RiskLevel::Warning);
            reasons.insert("no_signal".to_string());
        }

        let previous = self.accepted;
        self.apply_hysteresis(raw);
        let is_transition = self.accepted != previous;

        if is_transition {
            info!(
                "risk level {} -> {} (reasons: {:?})",
                previous.as_str(),
                self.accepted.as_str(),
                reasons
            );
        }

        RiskAssessment {
            level: self.accepted,
            reasons,
            timestamp_ms: now_ms,
            is_transition,
        }
    }

    /// Escalate immediately, de-escalate only after a sustained run
    fn apply_hysteresis(&mut self, raw: RiskLevel) {
        if raw >= self.accepted {
            self.accepted = raw;
            self.pending_downgrade = None;
            return;
        }

        let (candidate, run) = match self.pending_downgrade {
            Some((level, count)) if level == raw => (level, count + 1),
            _ => (raw, 1),
        };

        if run >= self.config.hysteresis_ticks {
            debug!(
                "downgrade {} -> {} after {} ticks",
                self.accepted.as_str(),
                candidate.as_str(),
                run
            );
            self.accepted = candidate;
            self.pending_downgrade = None;
        } else {
            self.pending_downgrade = Some((candidate, run));
        }
    }

    /// Severity contributed by the ocular signal alone
    fn ocular_level(&self, status: &OcularStatus, reasons: &mut BTreeSet<String>) -> RiskLevel {
        if status.consecutive_closed_frames > self.config.closed_frames_critical {
            reasons.insert(format!("eyes_closed_{}f", self.config.closed_frames_critical));
            return RiskLevel::Critical;
        }

        let mut level = RiskLevel::Normal;
        if status.consecutive_closed_frames > 0 {
            reasons.insert("eyes_closing".to_string());
            level = RiskLevel::Warning;
        }
        if status.blink_rate_per_minute > self.config.blink_rate_warning {
            reasons.insert("blink_rate_high".to_string());
            level = RiskLevel::Warning;
        }
        if status.yawn_count >= self.config.yawn_count_warning {
            reasons.insert("frequent_yawning".to_string());
            level = RiskLevel::Warning;
        }
        level
    }
}
