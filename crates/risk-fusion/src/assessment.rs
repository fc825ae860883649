//! Risk assessment output type

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use vitals_classifier::RiskLevel;

/// The engine's sole output: one assessment per decision tick
///
/// Assessments are superseded by the next tick, never mutated. `reasons`
/// holds the trigger tokens that contributed to the level this tick, e.g.
/// "eyes_closed_20f", "hr_145", "no_signal".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Accepted risk level after hysteresis
    pub level: RiskLevel,

    /// Triggering signals for this tick
    pub reasons: BTreeSet<String>,

    /// Tick timestamp (epoch milliseconds)
    pub timestamp_ms: u64,

    /// True only when the accepted level differs from the previous tick's;
    /// alert consumers subscribe to transitions
    pub is_transition: bool,
}

impl RiskAssessment {
    /// Whether this assessment warrants an alert event
    pub fn is_alert_worthy(&self) -> bool {
        self.is_transition
    }
}
