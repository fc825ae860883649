//! Session alert log

use serde::{Deserialize, Serialize};

use vitals_classifier::RiskLevel;

use crate::dispatcher::Alert;

/// Session summary counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total_alerts: usize,
    pub critical: usize,
    pub warnings: usize,
    pub normal: usize,
}

/// Keeps a session log of all fired alerts
#[derive(Debug, Default)]
pub struct AlertLog {
    entries: Vec<Alert>,
}

impl AlertLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fired alert
    pub fn add(&mut self, alert: Alert) {
        self.entries.push(alert);
    }

    /// Most recent `n` alerts, newest last
    pub fn recent(&self, n: usize) -> &[Alert] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Session summary counts per level
    pub fn summary(&self) -> AlertSummary {
        let critical = self
            .entries
            .iter()
            .filter(|a| a.level == RiskLevel::Critical)
            .count();
        let warnings = self
            .entries
            .iter()
            .filter(|a| a.level == RiskLevel::Warning)
            .count();
        AlertSummary {
            total_alerts: self.entries.len(),
            critical,
            warnings,
            normal: self.entries.len() - critical - warnings,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear the session log
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{AlertConfig, AlertDispatcher};
    use risk_fusion::RiskAssessment;
    use std::collections::BTreeSet;

    fn fire(dispatcher: &mut AlertDispatcher, level: RiskLevel) -> Alert {
        dispatcher
            .dispatch(&RiskAssessment {
                level,
                reasons: BTreeSet::new(),
                timestamp_ms: 0,
                is_transition: true,
            })
            .unwrap()
    }

    #[test]
    fn test_summary_counts_by_level() {
        let config = AlertConfig {
            normal_cooldown_s: 0,
            warning_cooldown_s: 0,
            critical_cooldown_s: 0,
            ..Default::default()
        };
        let mut dispatcher = AlertDispatcher::new(config);
        let mut log = AlertLog::new();

        log.add(fire(&mut dispatcher, RiskLevel::Critical));
        log.add(fire(&mut dispatcher, RiskLevel::Warning));
        log.add(fire(&mut dispatcher, RiskLevel::Warning));
        log.add(fire(&mut dispatcher, RiskLevel::Normal));

        let summary = log.summary();
        assert_eq!(summary.total_alerts, 4);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.warnings, 2);
        assert_eq!(summary.normal, 1);
    }

    #[test]
    fn test_recent_returns_tail() {
        let config = AlertConfig {
            critical_cooldown_s: 0,
            ..Default::default()
        };
        let mut dispatcher = AlertDispatcher::new(config);
        let mut log = AlertLog::new();
        for _ in 0..5 {
            log.add(fire(&mut dispatcher, RiskLevel::Critical));
        }
        assert_eq!(log.recent(2).len(), 2);
        assert_eq!(log.recent(10).len(), 5);
    }

    #[test]
    fn test_clear() {
        let mut dispatcher = AlertDispatcher::default();
        let mut log = AlertLog::new();
        log.add(fire(&mut dispatcher, RiskLevel::Critical));
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
    }
}
