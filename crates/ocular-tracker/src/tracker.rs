//! Ocular state machine and rolling counters

use std::collections::VecDeque;

use tracing::debug;

use crate::config::TrackerConfig;
use crate::state::{EyeState, OcularSample, OcularStatus};

/// Stateful tracker over the per-frame ocular sample stream
///
/// Eye and mouth sub-states are tracked orthogonally: the consecutive-closed
/// counter keeps running during a yawn, and the yawn flag survives eye
/// closure. The reported `EyeState` gives closure precedence over yawning.
pub struct OcularTracker {
    config: TrackerConfig,
    consecutive_closed: u32,
    yawn_frames: u32,
    yawning: bool,
    yawn_count: u32,
    /// Timestamps (ms) of blinks inside the sliding window
    blink_events: VecDeque<u64>,
    status: OcularStatus,
}

impl OcularTracker {
    /// Create a new tracker with the given config
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            consecutive_closed: 0,
            yawn_frames: 0,
            yawning: false,
            yawn_count: 0,
            blink_events: VecDeque::new(),
            status: OcularStatus::default(),
        }
    }

    /// Process one frame's sample and return the updated status
    ///
    /// Never fails: out-of-range ratios are clamped, non-finite ratios fall
    /// back to their neutral value (eyes open, mouth closed).
    pub fn update(&mut self, sample: OcularSample) -> OcularStatus {
        let ear = clamp_ratio(sample.eye_aspect_ratio, 1.0);
        let mar = clamp_ratio(sample.mouth_open_ratio, 0.0);

        // Eye closure
        if ear < self.config.closure_threshold {
            self.consecutive_closed += 1;
        } else {
            if self.consecutive_closed >= self.config.min_blink_frames {
                self.blink_events.push_back(sample.timestamp_ms);
                debug!(
                    "blink registered after {} closed frames",
                    self.consecutive_closed
                );
            }
            self.consecutive_closed = 0;
        }

        // Age out blinks older than the window
        let cutoff = sample.timestamp_ms.saturating_sub(self.config.blink_window_ms);
        while self.blink_events.front().is_some_and(|&t| t < cutoff) {
            self.blink_events.pop_front();
        }

        // Yawn detection, gated on sustained frames
        if mar > self.config.yawn_threshold {
            self.yawn_frames += 1;
            if self.yawn_frames == self.config.min_yawn_frames {
                self.yawn_count += 1;
                debug!("yawn registered (total {})", self.yawn_count);
            }
            self.yawning = self.yawn_frames >= self.config.min_yawn_frames;
        } else {
            self.yawn_frames = 0;
            self.yawning = false;
        }

        let eye_state = if self.consecutive_closed >= self.config.closed_frames_threshold {
            EyeState::Closed
        } else if self.consecutive_closed > 0 {
            EyeState::Closing
        } else if self.yawning {
            EyeState::Yawning
        } else {
            EyeState::Open
        };

        if eye_state != self.status.eye_state {
            debug!("eye state {:?} -> {:?}", self.status.eye_state, eye_state);
        }

        self.status = OcularStatus {
            eye_state,
            consecutive_closed_frames: self.consecutive_closed,
            blink_rate_per_minute: self.blink_rate(),
            yawn_count: self.yawn_count,
            yawn_in_progress: self.yawning,
            last_updated_ms: sample.timestamp_ms,
        };

        self.status.clone()
    }

    /// Latest status without processing a new sample
    pub fn status(&self) -> &OcularStatus {
        &self.status
    }

    /// Reset all rolling state (on driver change)
    pub fn reset(&mut self) {
        let config = self.config.clone();
        *self = Self::new(config);
    }

    fn blink_rate(&self) -> f32 {
        self.blink_events.len() as f32 * 60_000.0 / self.config.blink_window_ms as f32
    }
}

/// Clamp a ratio to [0, 1]; non-finite input falls back to `neutral`
fn clamp_ratio(value: f32, neutral: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FRAME_MS: u64 = 66; // ~15 fps

    fn sample(ts: u64, ear: f32, mar: f32) -> OcularSample {
        OcularSample {
            timestamp_ms: ts,
            eye_aspect_ratio: ear,
            mouth_open_ratio: mar,
        }
    }

    fn feed(tracker: &mut OcularTracker, start: u64, n: u64, ear: f32, mar: f32) -> OcularStatus {
        let mut status = tracker.status().clone();
        for i in 0..n {
            status = tracker.update(sample(start + i * FRAME_MS, ear, mar));
        }
        status
    }

    #[test]
    fn test_open_sample_keeps_counter_zero() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        let status = feed(&mut tracker, 0, 10, 0.35, 0.1);
        assert_eq!(status.eye_state, EyeState::Open);
        assert_eq!(status.consecutive_closed_frames, 0);
        assert_eq!(status.blink_rate_per_minute, 0.0);
    }

    #[test]
    fn test_closing_then_closed_at_threshold() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        let status = feed(&mut tracker, 0, 19, 0.15, 0.1);
        assert_eq!(status.eye_state, EyeState::Closing);
        assert_eq!(status.consecutive_closed_frames, 19);

        let status = tracker.update(sample(19 * FRAME_MS, 0.15, 0.1));
        assert_eq!(status.eye_state, EyeState::Closed);
        assert_eq!(status.consecutive_closed_frames, 20);
    }

    #[test]
    fn test_reopen_resets_counter() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        feed(&mut tracker, 0, 25, 0.15, 0.1);
        let status = tracker.update(sample(25 * FRAME_MS, 0.35, 0.1));
        assert_eq!(status.eye_state, EyeState::Open);
        assert_eq!(status.consecutive_closed_frames, 0);
    }

    #[test]
    fn test_blink_counted_after_min_frames() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        feed(&mut tracker, 0, 3, 0.15, 0.1);
        let status = tracker.update(sample(3 * FRAME_MS, 0.35, 0.1));
        assert_eq!(status.blink_rate_per_minute, 1.0);
    }

    #[test]
    fn test_short_closure_is_not_a_blink() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        feed(&mut tracker, 0, 2, 0.15, 0.1);
        let status = tracker.update(sample(2 * FRAME_MS, 0.35, 0.1));
        assert_eq!(status.blink_rate_per_minute, 0.0);
    }

    #[test]
    fn test_blinks_age_out_of_window() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        // One blink at the start of the session
        feed(&mut tracker, 0, 3, 0.15, 0.1);
        let status = tracker.update(sample(3 * FRAME_MS, 0.35, 0.1));
        assert_eq!(status.blink_rate_per_minute, 1.0);

        // 61 seconds later the blink has left the window
        let status = tracker.update(sample(61_000, 0.35, 0.1));
        assert_eq!(status.blink_rate_per_minute, 0.0);
    }

    #[test]
    fn test_yawn_requires_sustained_frames() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        let status = feed(&mut tracker, 0, 2, 0.35, 0.8);
        assert_eq!(status.yawn_count, 0);
        assert!(!status.yawn_in_progress);

        let status = tracker.update(sample(2 * FRAME_MS, 0.35, 0.8));
        assert_eq!(status.yawn_count, 1);
        assert!(status.yawn_in_progress);
        assert_eq!(status.eye_state, EyeState::Yawning);
    }

    #[test]
    fn test_yawn_counted_once_per_episode() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        let status = feed(&mut tracker, 0, 10, 0.35, 0.8);
        assert_eq!(status.yawn_count, 1);

        // Mouth closes, then a second sustained yawn
        feed(&mut tracker, 10 * FRAME_MS, 3, 0.35, 0.1);
        let status = feed(&mut tracker, 13 * FRAME_MS, 3, 0.35, 0.8);
        assert_eq!(status.yawn_count, 2);
    }

    #[test]
    fn test_yawn_does_not_mask_eye_closure() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        let status = feed(&mut tracker, 0, 5, 0.15, 0.8);
        assert_eq!(status.eye_state, EyeState::Closing);
        assert!(status.yawn_in_progress);
        assert_eq!(status.consecutive_closed_frames, 5);
    }

    #[test]
    fn test_out_of_range_ratios_are_clamped() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        // EAR below zero clamps to 0.0, which is a closed sample
        let status = tracker.update(sample(0, -0.3, 1.7));
        assert_eq!(status.eye_state, EyeState::Closing);
        assert_eq!(status.consecutive_closed_frames, 1);

        // EAR above one clamps to 1.0, which is open
        let status = tracker.update(sample(FRAME_MS, 1.5, -0.2));
        assert_eq!(status.consecutive_closed_frames, 0);
    }

    #[test]
    fn test_non_finite_input_is_neutral() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        let status = tracker.update(sample(0, f32::NAN, f32::INFINITY));
        assert_eq!(status.eye_state, EyeState::Open);
        assert_eq!(status.consecutive_closed_frames, 0);
        assert_eq!(status.yawn_count, 0);
    }

    #[test]
    fn test_reset_clears_rolling_state() {
        let mut tracker = OcularTracker::new(TrackerConfig::default());
        feed(&mut tracker, 0, 10, 0.15, 0.8);
        tracker.reset();
        assert_eq!(tracker.status().consecutive_closed_frames, 0);
        assert_eq!(tracker.status().yawn_count, 0);
    }

    proptest! {
        #[test]
        fn prop_update_never_panics_and_stays_bounded(
            ears in proptest::collection::vec(-10.0f32..10.0, 1..200),
            mars in proptest::collection::vec(-10.0f32..10.0, 1..200),
        ) {
            let mut tracker = OcularTracker::new(TrackerConfig::default());
            let n = ears.len().min(mars.len());
            for i in 0..n {
                let status = tracker.update(sample(i as u64 * FRAME_MS, ears[i], mars[i]));
                prop_assert!(status.consecutive_closed_frames <= n as u32);
                prop_assert!(status.blink_rate_per_minute >= 0.0);
                prop_assert!(status.yawn_count <= n as u32);
            }
        }
    }
}
