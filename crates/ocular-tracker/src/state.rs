//! Ocular sample and status types

use serde::{Deserialize, Serialize};

/// Discrete eye state derived from the EAR stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EyeState {
    /// Eyes open, no yawn in progress
    #[default]
    Open,
    /// Below closure threshold, not yet long enough to be Closed
    Closing,
    /// Below closure threshold for the configured consecutive-frame count
    Closed,
    /// Yawn in progress while the eyes are open
    Yawning,
}

/// One processed video frame's derived ratios
///
/// Both ratios are nominally in [0, 1]; out-of-range values are clamped on
/// ingest rather than rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OcularSample {
    /// Capture timestamp (epoch milliseconds)
    pub timestamp_ms: u64,
    /// Eye Aspect Ratio, averaged over both eyes; drops when the eye closes
    pub eye_aspect_ratio: f32,
    /// Mouth-opening ratio; rises when yawning
    pub mouth_open_ratio: f32,
}

/// Rolling ocular aggregate, recomputed on every sample
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcularStatus {
    /// Current eye state
    pub eye_state: EyeState,

    /// Consecutive frames below the closure threshold
    pub consecutive_closed_frames: u32,

    /// Blinks in the sliding window, normalized to per-minute
    pub blink_rate_per_minute: f32,

    /// Total yawns registered this session
    pub yawn_count: u32,

    /// Whether a yawn is currently in progress (tracked independently of
    /// eye closure; a yawn never masks closing eyes)
    pub yawn_in_progress: bool,

    /// Timestamp of the sample that produced this status (epoch ms)
    pub last_updated_ms: u64,
}
