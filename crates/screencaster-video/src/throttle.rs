//! Frame Rate Throttle
//!
//! Screen capture delivers frames at the display's native refresh rate
//! (commonly 60 Hz) while the broadcast targets a lower, configured rate.
//! [`FrameThrottle`] decides per frame whether it should proceed, using only
//! presentation timestamps.
//!
//! # Tolerance
//!
//! Capture delivery is not perfectly periodic. A strict
//! `elapsed >= 1 / fps` test would reject frames that arrive a fraction of a
//! millisecond early and under-deliver. Frames are therefore admitted once
//! `elapsed >= 0.8 / fps` ([`JITTER_TOLERANCE`]).
//!
//! Only accepted frames move the baseline. A rejected frame leaves the
//! reference point where it was, so the effective rate cannot drift below
//! the target.
//!
//! # Usage
//!
//! ```rust
//! use screencaster_video::{FrameThrottle, MediaTime};
//!
//! let mut throttle = FrameThrottle::new();
//! assert!(throttle.accept(MediaTime::from_seconds(0.0), 30));
//! assert!(!throttle.accept(MediaTime::from_seconds(0.016), 30));
//! assert!(throttle.accept(MediaTime::from_seconds(0.033), 30));
//! ```

use crate::frame::MediaTime;

/// Fraction of the nominal frame interval a frame must wait before admission
pub const JITTER_TOLERANCE: f64 = 0.8;

/// Timestamp-based frame rate gate
#[derive(Debug, Clone, Default)]
pub struct FrameThrottle {
    /// Timestamp of the last accepted frame
    last_accepted: Option<MediaTime>,

    /// Frames admitted
    accepted: u64,

    /// Frames rejected
    rejected: u64,
}

impl FrameThrottle {
    /// Create a throttle with no baseline
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether the frame at `pts` should proceed at `target_fps`
    ///
    /// The first frame is always accepted. A `target_fps` of zero disables
    /// throttling.
    pub fn accept(&mut self, pts: MediaTime, target_fps: u32) -> bool {
        if !self.would_accept(pts, target_fps) {
            self.rejected += 1;
            return false;
        }
        self.admit(pts)
    }

    /// Same decision as [`accept`](Self::accept) without recording it
    ///
    /// Lets a caller that may still discard the frame leave the baseline
    /// untouched.
    #[must_use]
    pub fn would_accept(&self, pts: MediaTime, target_fps: u32) -> bool {
        let Some(last) = self.last_accepted else {
            return true;
        };
        if target_fps == 0 {
            return true;
        }

        let elapsed = pts.seconds_since(&last);
        let min_interval = 1.0 / f64::from(target_fps);
        elapsed >= min_interval * JITTER_TOLERANCE
    }

    fn admit(&mut self, pts: MediaTime) -> bool {
        self.last_accepted = Some(pts);
        self.accepted += 1;
        true
    }

    /// Timestamp of the last accepted frame, `None` before the first frame
    #[must_use]
    pub fn last_timestamp(&self) -> Option<MediaTime> {
        self.last_accepted
    }

    /// Number of frames accepted so far
    #[must_use]
    pub fn accepted_count(&self) -> u64 {
        self.accepted
    }

    /// Number of frames rejected so far
    #[must_use]
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    /// Forget the baseline; the next frame is accepted unconditionally
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(seconds: f64) -> MediaTime {
        MediaTime::from_seconds(seconds)
    }

    #[test]
    fn test_initial_baseline_unset() {
        let throttle = FrameThrottle::new();
        assert!(throttle.last_timestamp().is_none());
    }

    #[test]
    fn test_first_frame_always_accepted() {
        for fps in [1, 15, 30, 60, 240] {
            let mut throttle = FrameThrottle::new();
            assert!(throttle.accept(pts(123.456), fps));
        }
    }

    #[test]
    fn test_drops_early_frame_at_30fps() {
        let mut throttle = FrameThrottle::new();
        assert!(throttle.accept(pts(0.0), 30));
        // 16ms is below the 26.7ms admission threshold
        assert!(!throttle.accept(pts(0.016), 30));
    }

    #[test]
    fn test_accepts_after_interval_at_30fps() {
        let mut throttle = FrameThrottle::new();
        assert!(throttle.accept(pts(0.0), 30));
        assert!(throttle.accept(pts(0.033), 30));
    }

    #[test]
    fn test_accepts_slight_jitter() {
        let mut throttle = FrameThrottle::new();
        assert!(throttle.accept(pts(0.0), 30));
        // 1ms early is still well above the threshold
        assert!(throttle.accept(pts(0.032), 30));
    }

    #[test]
    fn test_all_frames_pass_at_60fps() {
        let mut throttle = FrameThrottle::new();
        for i in 0..10 {
            let t = f64::from(i) * 0.016;
            assert!(throttle.accept(pts(t), 60), "frame {i} at {t}s should pass");
        }
    }

    #[test]
    fn test_rate_approximation_60_to_15() {
        let mut throttle = FrameThrottle::new();
        let accepted = (0..60)
            .filter(|i| throttle.accept(pts(f64::from(*i) / 60.0), 15))
            .count();
        assert!((13..=17).contains(&accepted), "accepted {accepted}");
        assert_eq!(throttle.accepted_count() + throttle.rejected_count(), 60);
    }

    #[test]
    fn test_rejection_preserves_baseline() {
        let mut throttle = FrameThrottle::new();
        assert!(throttle.accept(pts(0.0), 30));
        assert_eq!(throttle.last_timestamp(), Some(pts(0.0)));

        assert!(!throttle.accept(pts(0.010), 30));
        assert_eq!(throttle.last_timestamp(), Some(pts(0.0)));

        assert!(throttle.accept(pts(0.034), 30));
        assert_eq!(throttle.last_timestamp(), Some(pts(0.034)));
    }

    #[test]
    fn test_accepted_gaps_respect_tolerance() {
        let fps = 24;
        let min_gap = JITTER_TOLERANCE / f64::from(fps);
        let mut throttle = FrameThrottle::new();
        let mut accepted = Vec::new();

        // Irregular but strictly increasing arrivals, 90 ticks per second
        let mut tick = 0i64;
        for step in (0..500).map(|i| 1 + (i * 7919) % 5) {
            tick += step;
            let t = MediaTime::new(tick, 90);
            if throttle.accept(t, fps) {
                accepted.push(t);
            }
        }

        assert!(accepted.len() > 1);
        for pair in accepted.windows(2) {
            assert!(pair[1].seconds_since(&pair[0]) >= min_gap - 1e-12);
        }
    }

    #[test]
    fn test_would_accept_leaves_state_untouched() {
        let mut throttle = FrameThrottle::new();
        assert!(throttle.would_accept(pts(0.0), 30));
        assert!(throttle.last_timestamp().is_none());

        assert!(throttle.accept(pts(0.0), 30));
        assert!(!throttle.would_accept(pts(0.010), 30));
        assert!(throttle.would_accept(pts(0.034), 30));
        assert_eq!(throttle.last_timestamp(), Some(pts(0.0)));
        assert_eq!(throttle.accepted_count(), 1);
        assert_eq!(throttle.rejected_count(), 0);
    }

    #[test]
    fn test_zero_fps_disables_throttling() {
        let mut throttle = FrameThrottle::new();
        assert!(throttle.accept(pts(0.0), 0));
        assert!(throttle.accept(pts(0.0001), 0));
    }

    #[test]
    fn test_reset() {
        let mut throttle = FrameThrottle::new();
        assert!(throttle.accept(pts(1.0), 30));
        throttle.reset();
        assert!(throttle.last_timestamp().is_none());
        assert!(throttle.accept(pts(1.001), 30));
    }
}
