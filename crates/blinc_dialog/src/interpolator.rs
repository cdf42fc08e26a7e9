//! Launch state interpolation
//!
//! A pure mapping from `(start, end, progress, linear_progress)` to the
//! intermediate state of a launch morph. Geometry follows the eased
//! `progress`; the content cross-fade follows `linear_progress` so the fade is
//! not eased a second time.

use blinc_animation::{segment_progress, Interpolate};
use blinc_core::{Color, CornerRadius, Rect};

/// Geometric and visual state of one side of a launch morph
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionState {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
    pub corners: CornerRadius,
    /// Opacity of the visible content
    pub alpha: f32,
    /// Whether the start side content is the one drawn
    pub visible: bool,
    pub background: Color,
}

impl Default for TransitionState {
    fn default() -> Self {
        Self::new(Rect::ZERO, CornerRadius::ZERO, Color::BLACK)
    }
}

impl TransitionState {
    pub fn new(rect: Rect, corners: CornerRadius, background: Color) -> Self {
        Self {
            top: rect.top(),
            bottom: rect.bottom(),
            left: rect.left(),
            right: rect.right(),
            corners,
            alpha: 1.0,
            visible: true,
            background,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_edges(self.left, self.top, self.right, self.bottom)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.top = rect.top();
        self.bottom = rect.bottom();
        self.left = rect.left();
        self.right = rect.right();
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Cross-fade segments as fractions of the linear timeline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Crossfade {
    pub fade_out_start: f32,
    pub fade_out_end: f32,
    pub fade_in_start: f32,
    pub fade_in_end: f32,
}

/// Interpolate between two launch states
///
/// Edges and corner radii use `progress`. Visibility and alpha use
/// `linear_progress`: the start content is visible (fading out) until the
/// fade-out segment completes, then the end content fades in. The background
/// color blends linearly as well.
pub fn interpolate(
    start: &TransitionState,
    end: &TransitionState,
    progress: f32,
    linear_progress: f32,
    crossfade: &Crossfade,
) -> TransitionState {
    let fade_out = segment_progress(
        linear_progress,
        crossfade.fade_out_start,
        crossfade.fade_out_end,
    );
    let visible = fade_out < 1.0;
    let alpha = if visible {
        1.0 - fade_out
    } else {
        segment_progress(linear_progress, crossfade.fade_in_start, crossfade.fade_in_end)
    };

    TransitionState {
        top: start.top.lerp(&end.top, progress),
        bottom: start.bottom.lerp(&end.bottom, progress),
        left: start.left.lerp(&end.left, progress),
        right: start.right.lerp(&end.right, progress),
        corners: start.corners.lerp(&end.corners, progress),
        alpha,
        visible,
        background: start.background.lerp(&end.background, linear_progress),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blinc_animation::Easing;

    fn crossfade() -> Crossfade {
        Crossfade {
            fade_out_start: 0.0,
            fade_out_end: 0.3,
            fade_in_start: 0.3,
            fade_in_end: 0.666,
        }
    }

    fn states() -> (TransitionState, TransitionState) {
        let start = TransitionState::new(
            Rect::new(150.3, 700.7, 100.1, 40.9),
            CornerRadius::uniform(4.0),
            Color::BLACK,
        );
        let end = TransitionState::new(
            Rect::new(100.0, 250.0, 200.0, 300.0),
            CornerRadius::uniform(28.0),
            Color::WHITE,
        );
        (start, end)
    }

    #[test]
    fn test_boundaries_are_exact() {
        let (start, end) = states();
        let at_start = interpolate(&start, &end, 0.0, 0.0, &crossfade());
        let at_end = interpolate(&start, &end, 1.0, 1.0, &crossfade());

        assert_eq!(at_start.rect(), start.rect());
        assert_eq!(at_start.corners, start.corners);
        assert_eq!(at_end.rect(), end.rect());
        assert_eq!(at_end.corners, end.corners);
        assert_eq!(at_end.background, end.background);
    }

    #[test]
    fn test_crossfade_follows_linear_progress() {
        let (start, end) = states();
        let easing = Easing::emphasized();

        for step in 0..=20 {
            let linear = step as f32 / 20.0;
            let eased = easing.apply(linear);
            let state = interpolate(&start, &end, eased, linear, &crossfade());
            let reference = interpolate(&start, &end, linear, linear, &crossfade());

            assert_eq!(state.visible, linear < 0.3);
            assert_eq!(state.alpha, reference.alpha);
        }

        let mid_fade_out = interpolate(&start, &end, easing.apply(0.15), 0.15, &crossfade());
        assert!(mid_fade_out.visible);
        assert!((mid_fade_out.alpha - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_geometry_follows_eased_progress() {
        let (start, end) = states();
        let state = interpolate(&start, &end, 0.8, 0.2, &crossfade());
        let expected = start.top + (end.top - start.top) * 0.8;
        assert!((state.top - expected).abs() < 1e-3);
    }

    #[test]
    fn test_interpolation_is_idempotent() {
        let (start, end) = states();
        let a = interpolate(&start, &end, 0.42, 0.37, &crossfade());
        let b = interpolate(&start, &end, 0.42, 0.37, &crossfade());
        assert_eq!(a, b);
    }
}
