//! Blinc Animation System
//!
//! Easing curves, interpolation, and frame-driven tweens.
//!
//! # Features
//!
//! - **Easing**: named curves plus arbitrary cubic-bezier timing functions
//! - **Interpolation**: `Interpolate` for floats, colors, rects and corner radii
//! - **Tweens**: fixed-duration timelines advanced by frame deltas, reporting
//!   both eased and linear progress

pub mod easing;
pub mod tween;
pub mod values;

pub use easing::Easing;
pub use tween::{segment_progress, Tween, TweenSample};
pub use values::Interpolate;
