//! Blinc Dialog Launch Animations
//!
//! Grows a dialog out of the surface that opened it, and shrinks it back into
//! that surface when the dialog is dismissed.
//!
//! # Overview
//!
//! The original dialog is never drawn. Its content is stolen on the first
//! frame and re-parented into a fullscreen host dialog, where a morph between
//! the trigger surface and the dialog's background surface animates bounds,
//! corner radii and colors while cross-fading the two contents. The original
//! dialog stays the handle callers hold: its `show`, `hide` and `dismiss` are
//! routed to the host.
//!
//! # Modules
//!
//! - [`registry`]: [`DialogLaunchAnimator`], the entry point
//! - [`transition`]: per-dialog lifecycle (launching, shown, dismissing)
//! - [`launch`], [`interpolator`], [`morph`]: the frame-driven morph
//! - [`dialog`], [`host`]: dialog and host dialog abstractions plus
//!   surface-backed implementations
//! - [`bounds`]: animated resizing of a shown dialog
//! - [`config`]: TOML-loadable timings and easings

pub mod bounds;
pub mod config;
pub mod dialog;
pub mod error;
pub mod ghost;
pub mod host;
pub mod interpolator;
pub mod launch;
pub mod morph;
pub mod registry;
mod router;
pub mod stealer;
pub mod transition;

#[cfg(test)]
mod tests;

pub use bounds::AnimatedBoundsListener;
pub use config::{DialogLaunchConfig, LaunchTiming};
pub use dialog::{
    Dialog, DialogListener, DialogListenerId, DismissReason, ListenableDialog, SurfaceDialog,
    WindowAttributes,
};
pub use error::{DialogLaunchError, Result};
pub use host::{
    ActualDismiss, DismissOverride, FullscreenHostProvider, HostDialog, HostProvider,
    OnHostCreated, SurfaceHostDialog,
};
pub use interpolator::{interpolate, Crossfade, TransitionState};
pub use launch::{FrameLaunchAnimator, LaunchAnimator, LaunchController};
pub use morph::{MorphHook, MorphSide, PairedMorph, SurfaceMorph};
pub use registry::{DialogLaunchAnimator, Launch};
pub use transition::{ExitPath, TransitionId, TransitionPhase, DIALOG_CONTENT_PARENT};
