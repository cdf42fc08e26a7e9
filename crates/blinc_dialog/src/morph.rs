//! Paired surface morph
//!
//! A launch animation moves pixels from a start surface to an end surface.
//! Each side is drawn by a ghost in the host container; [`PairedMorph`] fans
//! every progress sample out to both ghosts, and the end side shows exactly
//! when the start side does not.

use blinc_core::{Background, Color, CornerRadius, SurfaceId, SurfaceTree, Visibility};

use crate::interpolator::TransitionState;
use crate::launch::LaunchController;

/// Which end of the morph a surface is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MorphSide {
    Start,
    End,
}

/// Hook run at the start or end of a morph
pub type MorphHook = Box<dyn FnOnce(&mut SurfaceTree)>;

/// One side of a morph: a surface drawn through a ghost in `container`
#[derive(Debug)]
pub struct SurfaceMorph {
    side: MorphSide,
    surface: SurfaceId,
    container: SurfaceId,
    ghost: Option<SurfaceId>,
    /// Background color when the surface has no background of its own
    fallback_color: Color,
}

impl SurfaceMorph {
    pub fn new(side: MorphSide, surface: SurfaceId, container: SurfaceId, fallback_color: Color) -> Self {
        Self {
            side,
            surface,
            container,
            ghost: None,
            fallback_color,
        }
    }

    pub fn side(&self) -> MorphSide {
        self.side
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn ghost(&self) -> Option<SurfaceId> {
        self.ghost
    }

    /// Overwrite geometry and background of `state` with the surface's current ones
    pub fn fill_state(&self, tree: &SurfaceTree, state: &mut TransitionState) {
        let background = tree.background(self.surface);
        state.set_rect(tree.bounds(self.surface));
        state.corners = background.map_or(CornerRadius::ZERO, |b| b.corner_radius);
        state.background = background.map_or(self.fallback_color, |b| b.color);
    }

    pub fn create_state(&self, tree: &SurfaceTree) -> TransitionState {
        let mut state = TransitionState::default();
        self.fill_state(tree, &mut state);
        state
    }

    pub fn on_start(&mut self, tree: &mut SurfaceTree) {
        self.ghost = tree.add_ghost(self.surface, self.container);
    }

    pub fn on_progress(&mut self, tree: &mut SurfaceTree, state: &TransitionState) {
        let Some(ghost) = self.ghost else {
            return;
        };
        let visible = match self.side {
            MorphSide::Start => state.visible,
            MorphSide::End => !state.visible,
        };
        if !visible {
            tree.force_visibility(ghost, Visibility::Invisible);
            return;
        }

        tree.force_visibility(ghost, Visibility::Visible);
        tree.set_bounds(ghost, state.rect());
        tree.set_alpha(ghost, state.alpha);
        tree.set_background(
            ghost,
            Some(Background {
                color: state.background,
                corner_radius: state.corners,
            }),
        );
    }

    pub fn on_end(&mut self, tree: &mut SurfaceTree) {
        if self.ghost.take().is_some() {
            tree.remove_ghost(self.surface);
        }
    }
}

/// Two morph sides driven by a single launch animation
pub struct PairedMorph {
    start: SurfaceMorph,
    end: SurfaceMorph,
    on_start: Option<MorphHook>,
    on_end: Option<MorphHook>,
}

impl PairedMorph {
    pub fn new(start: SurfaceMorph, end: SurfaceMorph) -> Self {
        debug_assert_eq!(start.side(), MorphSide::Start);
        debug_assert_eq!(end.side(), MorphSide::End);
        Self {
            start,
            end,
            on_start: None,
            on_end: None,
        }
    }

    /// Run `hook` before the ghosts are created
    pub fn with_on_start(mut self, hook: MorphHook) -> Self {
        self.on_start = Some(hook);
        self
    }

    /// Run `hook` after the ghosts are removed
    pub fn with_on_end(mut self, hook: MorphHook) -> Self {
        self.on_end = Some(hook);
        self
    }

    /// Current state of the end surface
    pub fn end_state(&self, tree: &SurfaceTree) -> TransitionState {
        self.end.create_state(tree)
    }
}

impl LaunchController for PairedMorph {
    fn create_state(&mut self, tree: &SurfaceTree) -> TransitionState {
        self.start.create_state(tree)
    }

    fn on_start(&mut self, tree: &mut SurfaceTree, _expanding_upward: bool) {
        if let Some(hook) = self.on_start.take() {
            hook(tree);
        }
        self.start.on_start(tree);
        self.end.on_start(tree);
    }

    fn on_progress(
        &mut self,
        tree: &mut SurfaceTree,
        state: &TransitionState,
        _progress: f32,
        _linear_progress: f32,
    ) {
        self.start.on_progress(tree, state);
        self.end.on_progress(tree, state);
    }

    fn on_end(&mut self, tree: &mut SurfaceTree, _expanding_upward: bool) {
        self.start.on_end(tree);
        self.end.on_end(tree);
        if let Some(hook) = self.on_end.take() {
            hook(tree);
        }
    }

    fn refresh_end_state(&mut self, tree: &SurfaceTree, end: &mut TransitionState) {
        self.end.fill_state(tree, end);
    }
}
