//! Alert dispatcher implementation

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use risk_fusion::RiskAssessment;
use vitals_classifier::RiskLevel;

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Cooldown after a Normal alert (seconds)
    pub normal_cooldown_s: u64,
    /// Cooldown after a Warning alert (seconds)
    pub warning_cooldown_s: u64,
    /// Cooldown after a Critical alert (seconds)
    pub critical_cooldown_s: u64,
    /// Maximum alerts per hour before throttling
    pub max_alerts_per_hour: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            normal_cooldown_s: 5,
            warning_cooldown_s: 10,
            critical_cooldown_s: 3,
            max_alerts_per_hour: 30,
        }
    }
}

/// One alert event delivered to presentation/playback collaborators
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: RiskLevel,
    /// Originating subsystem
    pub source: &'static str,
    pub message: &'static str,
    /// Recommended driver action
    pub action: &'static str,
    /// Trigger tokens copied from the assessment
    pub reasons: BTreeSet<String>,
}

/// Dispatcher applying cooldowns and throttling to risk transitions
pub struct AlertDispatcher {
    config: AlertConfig,
    /// Last fire time per level
    last_fired: HashMap<RiskLevel, Instant>,
    hourly_count: usize,
    hour_start: Instant,
}

impl AlertDispatcher {
    /// Create a new dispatcher
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert dispatcher with config: {:?}", config);
        Self {
            config,
            last_fired: HashMap::new(),
            hourly_count: 0,
            hour_start: Instant::now(),
        }
    }

    /// Turn an assessment into an alert event, if one is due
    ///
    /// Fires only on accepted transitions; duplicate levels inside their
    /// cooldown window and anything beyond the hourly cap are suppressed.
    pub fn dispatch(&mut self, assessment: &RiskAssessment) -> Option<Alert> {
        if !assessment.is_transition {
            return None;
        }

        if !self.should_fire(assessment.level) {
            return None;
        }

        self.record_fire(assessment.level);

        let alert = Alert {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level: assessment.level,
            source: "FUSION",
            message: level_message(assessment.level),
            action: level_action(assessment.level),
            reasons: assessment.reasons.clone(),
        };

        info!(
            "alert fired: {} (reasons: {:?})",
            alert.level.as_str(),
            alert.reasons
        );

        Some(alert)
    }

    fn should_fire(&mut self, level: RiskLevel) -> bool {
        // Reset hourly counter if needed
        if self.hour_start.elapsed() > Duration::from_secs(3600) {
            self.hourly_count = 0;
            self.hour_start = Instant::now();
        }

        if self.hourly_count >= self.config.max_alerts_per_hour {
            warn!("alert throttled: max alerts per hour reached");
            return false;
        }

        if let Some(last) = self.last_fired.get(&level) {
            let cooldown = Duration::from_secs(self.cooldown_seconds(level));
            if last.elapsed() < cooldown {
                debug!("alert suppressed: {} in cooldown", level.as_str());
                return false;
            }
        }

        true
    }

    fn record_fire(&mut self, level: RiskLevel) {
        self.hourly_count += 1;
        self.last_fired.insert(level, Instant::now());
    }

    fn cooldown_seconds(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::Normal => self.config.normal_cooldown_s,
            RiskLevel::Warning => self.config.warning_cooldown_s,
            RiskLevel::Critical => self.config.critical_cooldown_s,
        }
    }

    /// Alerts fired in the current hour
    pub fn hourly_count(&self) -> usize {
        self.hourly_count
    }
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

fn level_message(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Normal => "Driver status is NORMAL. All readings within safe range.",
        RiskLevel::Warning => "WARNING! Signs of fatigue or health anomaly detected.",
        RiskLevel::Critical => "CRITICAL ALERT! Immediate danger, pull over now!",
    }
}

fn level_action(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Normal => "Continue monitoring.",
        RiskLevel::Warning => "Recommend rest break in 15 minutes.",
        RiskLevel::Critical => "STOP VEHICLE IMMEDIATELY. Sound alarm.",
    }
}
