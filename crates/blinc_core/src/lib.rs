//! Blinc Core
//!
//! Foundational primitives shared by the other Blinc crates:
//!
//! - **Geometry**: points, sizes, rectangles, colors and corner radii
//! - **Surface Tree**: retained surfaces grouped into windows, with layout,
//!   pre-draw, draw and animation-frame hooks plus surface ghosting
//! - **Main Thread**: a guard for APIs that must run on the UI thread
//!
//! # Example
//!
//! ```rust
//! use blinc_core::{LayoutParams, Rect, Size, SurfaceTree};
//!
//! let mut tree = SurfaceTree::new(Size::new(400.0, 800.0));
//! let window = tree.create_window("app", tree.screen());
//! tree.attach_window(window);
//!
//! let button = tree.create("button");
//! tree.set_layout_params(button, LayoutParams::fixed(100.0, 40.0));
//! tree.add_child(window, button);
//!
//! tree.frame(16.0);
//! assert_eq!(tree.bounds(button), Rect::new(150.0, 380.0, 100.0, 40.0));
//! assert_eq!(tree.draw_count(window), 1);
//! ```

pub mod geometry;
pub mod surface;
pub mod thread;

pub use geometry::{Color, CornerRadius, Point, Rect, Size};
pub use surface::{
    Background, Dimension, DrawCallbackId, Gravity, LayoutChange, LayoutListenerId,
    LayoutParams, ListenerControl, PreDraw, PreDrawListenerId, SurfaceId, SurfaceTree,
    Visibility,
};
pub use thread::MainThread;
