//! Monitor configuration

use serde::{Deserialize, Serialize};

use alerting::AlertConfig;
use ocular_tracker::TrackerConfig;
use risk_fusion::FusionConfig;
use vitals_classifier::ClassifierConfig;

use crate::simulator::Scenario;

/// Top-level configuration for the driver monitor
///
/// Every threshold the pipeline uses lives here; sections default to the
/// values each crate ships with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Address the dashboard API listens on
    pub listen_addr: String,

    /// Fusion tick rate; matches the camera frame cadence
    pub tick_hz: f64,

    /// Simulated sensor scenario for the demo binary
    pub scenario: Scenario,

    pub tracker: TrackerConfig,
    pub classifier: ClassifierConfig,
    pub fusion: FusionConfig,
    pub alerts: AlertConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            tick_hz: 15.0,
            scenario: Scenario::Normal,
            tracker: TrackerConfig::default(),
            classifier: ClassifierConfig::default(),
            fusion: FusionConfig::default(),
            alerts: AlertConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load from an optional `driver-monitor.toml` plus `DRIVER_MONITOR_*`
    /// environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("driver-monitor").required(false))
            .add_source(
                config::Environment::with_prefix("DRIVER_MONITOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
