//! Animatable value types
//!
//! Linear interpolation for the values a launch animation moves between.

use blinc_core::{Color, CornerRadius, Rect};

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Interpolate between self and other by factor t (0.0 to 1.0)
    ///
    /// Implementations return exactly `self` at 0 and exactly `other` at 1.
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool;
}

// ============================================================================
// f32 Implementation
// ============================================================================

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon
    }
}

// ============================================================================
// Color Implementation
// ============================================================================

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Color::rgba(
            self.r.lerp(&other.r, t),
            self.g.lerp(&other.g, t),
            self.b.lerp(&other.b, t),
            self.a.lerp(&other.a, t),
        )
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.r - other.r).abs() < epsilon
            && (self.g - other.g).abs() < epsilon
            && (self.b - other.b).abs() < epsilon
            && (self.a - other.a).abs() < epsilon
    }
}

// ============================================================================
// Rect / CornerRadius Implementation
// ============================================================================

impl Interpolate for Rect {
    /// Interpolates the four edges independently
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Rect::from_edges(
            self.left().lerp(&other.left(), t),
            self.top().lerp(&other.top(), t),
            self.right().lerp(&other.right(), t),
            self.bottom().lerp(&other.bottom(), t),
        )
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.left() - other.left()).abs() < epsilon
            && (self.top() - other.top()).abs() < epsilon
            && (self.right() - other.right()).abs() < epsilon
            && (self.bottom() - other.bottom()).abs() < epsilon
    }
}

impl Interpolate for CornerRadius {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        CornerRadius::new(
            self.top_left.lerp(&other.top_left, t),
            self.top_right.lerp(&other.top_right, t),
            self.bottom_right.lerp(&other.bottom_right, t),
            self.bottom_left.lerp(&other.bottom_left, t),
        )
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.top_left - other.top_left).abs() < epsilon
            && (self.top_right - other.top_right).abs() < epsilon
            && (self.bottom_right - other.bottom_right).abs() < epsilon
            && (self.bottom_left - other.bottom_left).abs() < epsilon
    }
}
