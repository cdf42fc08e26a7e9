//! Launch animation engine
//!
//! A [`LaunchAnimator`] drives a [`LaunchController`] from a start state (read
//! from the controller) to an end state. [`FrameLaunchAnimator`] samples a
//! tween once per surface-tree animation frame.

use blinc_animation::{Easing, Tween};
use blinc_core::SurfaceTree;

use crate::config::{DialogLaunchConfig, LaunchTiming};
use crate::interpolator::{interpolate, Crossfade, TransitionState};

/// Receives the samples of one launch animation
pub trait LaunchController {
    /// State the animation starts from
    fn create_state(&mut self, tree: &SurfaceTree) -> TransitionState;

    fn on_start(&mut self, tree: &mut SurfaceTree, expanding_upward: bool);

    fn on_progress(
        &mut self,
        tree: &mut SurfaceTree,
        state: &TransitionState,
        progress: f32,
        linear_progress: f32,
    );

    fn on_end(&mut self, tree: &mut SurfaceTree, expanding_upward: bool);

    /// Update the end state after each sample
    ///
    /// Lets the target follow a surface whose layout changes mid-flight.
    fn refresh_end_state(&mut self, _tree: &SurfaceTree, _end: &mut TransitionState) {}
}

/// Interpolation engine that owns timing and easing
pub trait LaunchAnimator {
    fn start(
        &self,
        tree: &mut SurfaceTree,
        controller: Box<dyn LaunchController>,
        end: TransitionState,
    );
}

/// Launch animator driven by [`SurfaceTree::request_animation_frame`]
///
/// The first sample (progress 0) is delivered synchronously from `start`;
/// every following frame advances the tween by the frame delta until it ends.
#[derive(Clone, Copy, Debug)]
pub struct FrameLaunchAnimator {
    timing: LaunchTiming,
    easing: Easing,
}

impl Default for FrameLaunchAnimator {
    fn default() -> Self {
        Self::from_config(&DialogLaunchConfig::default())
    }
}

impl FrameLaunchAnimator {
    pub fn new(timing: LaunchTiming, easing: Easing) -> Self {
        Self { timing, easing }
    }

    pub fn from_config(config: &DialogLaunchConfig) -> Self {
        Self::new(config.timing, config.position_easing)
    }

    pub fn timing(&self) -> LaunchTiming {
        self.timing
    }
}

impl LaunchAnimator for FrameLaunchAnimator {
    fn start(
        &self,
        tree: &mut SurfaceTree,
        mut controller: Box<dyn LaunchController>,
        end: TransitionState,
    ) {
        let start = controller.create_state(tree);
        let expanding_upward = end.top < start.top;
        controller.on_start(tree, expanding_upward);

        let run = AnimationRun {
            controller,
            start,
            end,
            tween: Tween::new(self.timing.total_duration_ms, self.easing),
            crossfade: self.timing.crossfade(),
            expanding_upward,
        };
        run.step(tree, 0.0);
    }
}

struct AnimationRun {
    controller: Box<dyn LaunchController>,
    start: TransitionState,
    end: TransitionState,
    tween: Tween,
    crossfade: Crossfade,
    expanding_upward: bool,
}

impl AnimationRun {
    fn step(mut self, tree: &mut SurfaceTree, dt_ms: f32) {
        let sample = self.tween.advance(dt_ms);
        let state = interpolate(
            &self.start,
            &self.end,
            sample.progress,
            sample.linear_progress,
            &self.crossfade,
        );
        self.controller
            .on_progress(tree, &state, sample.progress, sample.linear_progress);
        self.controller.refresh_end_state(tree, &mut self.end);

        if sample.finished {
            self.controller.on_end(tree, self.expanding_upward);
        } else {
            tree.request_animation_frame(move |tree, dt_ms| self.step(tree, dt_ms));
        }
    }
}
