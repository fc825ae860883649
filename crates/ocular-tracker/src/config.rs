//! Tracker configuration

use serde::{Deserialize, Serialize};

/// Ocular tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// EAR below this value counts as a closed-eye sample
    pub closure_threshold: f32,

    /// Minimum consecutive closed frames for a reopen to count as a blink
    pub min_blink_frames: u32,

    /// Mouth-opening ratio above this value counts toward a yawn
    pub yawn_threshold: f32,

    /// Consecutive above-threshold frames before a yawn is registered
    pub min_yawn_frames: u32,

    /// Consecutive closed frames before the eye state becomes Closed
    pub closed_frames_threshold: u32,

    /// Sliding window for blink-rate computation (milliseconds)
    pub blink_window_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            closure_threshold: 0.21,
            min_blink_frames: 3,
            yawn_threshold: 0.6,
            min_yawn_frames: 3,
            closed_frames_threshold: 20,
            blink_window_ms: 60_000,
        }
    }
}

impl TrackerConfig {
    /// Create strict config (more sensitive detection)
    pub fn strict() -> Self {
        Self {
            closure_threshold: 0.25,
            closed_frames_threshold: 15,
            min_yawn_frames: 2,
            ..Default::default()
        }
    }

    /// Create lenient config (fewer false positives)
    pub fn lenient() -> Self {
        Self {
            closure_threshold: 0.18,
            closed_frames_threshold: 30,
            min_yawn_frames: 5,
            ..Default::default()
        }
    }
}
