//! Frame-driven tweens
//!
//! A `Tween` is a fixed-duration timeline advanced by frame deltas. Each
//! sample carries both the linear progress (time elapsed / duration) and the
//! eased progress, since launch animations drive geometry with the latter and
//! cross-fades with the former.

use crate::easing::Easing;

/// Progress of a tween at one point in time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweenSample {
    /// Eased progress (0.0 to 1.0)
    pub progress: f32,
    /// Linear progress (0.0 to 1.0)
    pub linear_progress: f32,
    /// Whether the tween reached its end
    pub finished: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct Tween {
    duration_ms: f32,
    easing: Easing,
    elapsed_ms: f32,
}

impl Tween {
    pub fn new(duration_ms: u32, easing: Easing) -> Self {
        Self {
            duration_ms: duration_ms as f32,
            easing,
            elapsed_ms: 0.0,
        }
    }

    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Get linear progress (0.0 to 1.0)
    pub fn linear_progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.linear_progress() >= 1.0
    }

    /// Current sample without advancing
    pub fn sample(&self) -> TweenSample {
        let linear_progress = self.linear_progress();
        TweenSample {
            progress: self.easing.apply(linear_progress),
            linear_progress,
            finished: linear_progress >= 1.0,
        }
    }

    /// Advance by delta time (in milliseconds) and sample
    pub fn advance(&mut self, dt_ms: f32) -> TweenSample {
        self.elapsed_ms = (self.elapsed_ms + dt_ms.max(0.0)).min(self.duration_ms.max(0.0));
        self.sample()
    }

    /// Rewind to the start
    pub fn reset(&mut self) {
        self.elapsed_ms = 0.0;
    }
}

/// Progress of a sub-segment `[start, end]` of a linear timeline, clamped to `[0, 1]`
///
/// Segments with `end <= start` report 0 before `start` and 1 from `start` on.
pub fn segment_progress(progress: f32, start: f32, end: f32) -> f32 {
    if end <= start {
        return if progress >= start { 1.0 } else { 0.0 };
    }
    ((progress - start) / (end - start)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_reaches_end() {
        let mut tween = Tween::new(100, Easing::Linear);
        let first = tween.advance(40.0);
        assert!((first.linear_progress - 0.4).abs() < 1e-6);
        assert!(!first.finished);

        let last = tween.advance(1000.0);
        assert_eq!(last.linear_progress, 1.0);
        assert_eq!(last.progress, 1.0);
        assert!(last.finished);
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let mut tween = Tween::new(0, Easing::standard());
        assert!(tween.advance(0.0).finished);
    }

    #[test]
    fn test_eased_progress_differs_from_linear() {
        let mut tween = Tween::new(100, Easing::standard());
        let sample = tween.advance(50.0);
        assert!(sample.progress > sample.linear_progress);
    }

    #[test]
    fn test_segment_progress() {
        assert_eq!(segment_progress(0.1, 0.3, 0.6), 0.0);
        assert!((segment_progress(0.45, 0.3, 0.6) - 0.5).abs() < 1e-6);
        assert_eq!(segment_progress(0.9, 0.3, 0.6), 1.0);
        assert_eq!(segment_progress(0.2, 0.3, 0.3), 0.0);
        assert_eq!(segment_progress(0.3, 0.3, 0.3), 1.0);
    }
}
