//! Ocular State Tracker
//!
//! Converts per-frame eye/mouth aspect ratios into driver eye state:
//! - Eye closure detection (consecutive closed-frame counting)
//! - Blink rate over a sliding 60-second window
//! - Yawn detection with sustained-frame gating
//!
//! The tracker consumes derived ratios only (Eye Aspect Ratio, mouth-opening
//! ratio), never pixels. Landmark extraction happens upstream.

pub mod config;
pub mod state;
pub mod tracker;

pub use config::TrackerConfig;
pub use state::{EyeState, OcularSample, OcularStatus};
pub use tracker::OcularTracker;
