//! Alerting System
//!
//! Turns accepted risk-level transitions into alert events: per-level
//! cooldowns, hourly throttling, message/action mapping, and a session
//! alert log.

mod dispatcher;
mod log;

pub use dispatcher::{Alert, AlertConfig, AlertDispatcher};
pub use log::{AlertLog, AlertSummary};
