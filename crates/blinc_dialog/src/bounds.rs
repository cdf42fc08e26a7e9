//! Animated background bounds
//!
//! Once a dialog is shown, layout changes of its background surface animate
//! from the last displayed bounds to the new ones instead of jumping. A new
//! change cancels the running animation and restarts from wherever it was.

use std::cell::RefCell;
use std::rc::Rc;

use blinc_animation::{Easing, Interpolate, Tween};
use blinc_core::{LayoutChange, LayoutListenerId, ListenerControl, Rect, SurfaceId, SurfaceTree};

#[derive(Debug, Default)]
struct BoundsState {
    last_bounds: Option<Rect>,
    /// Bumped on every restart; stale frames compare and bail out
    generation: u64,
}

/// Layout listener animating the bounds of one surface
#[derive(Debug)]
pub struct AnimatedBoundsListener {
    duration_ms: u32,
    easing: Easing,
    state: Rc<RefCell<BoundsState>>,
    listener: Option<LayoutListenerId>,
}

impl AnimatedBoundsListener {
    pub fn new(duration_ms: u32, easing: Easing) -> Self {
        Self {
            duration_ms,
            easing,
            state: Rc::new(RefCell::new(BoundsState::default())),
            listener: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    /// Bounds last applied by the animation
    pub fn last_bounds(&self) -> Option<Rect> {
        self.state.borrow().last_bounds
    }

    /// Start animating layout changes of `surface`
    pub fn attach(&mut self, tree: &mut SurfaceTree, surface: SurfaceId) {
        self.detach(tree);
        let state = Rc::clone(&self.state);
        let (duration_ms, easing) = (self.duration_ms, self.easing);
        self.listener = Some(tree.add_layout_listener(surface, move |tree, change| {
            on_layout_change(tree, &state, change, duration_ms, easing);
            ListenerControl::Keep
        }));
    }

    /// Stop listening and cancel any running animation
    pub fn detach(&mut self, tree: &mut SurfaceTree) {
        if let Some(id) = self.listener.take() {
            tree.remove_layout_listener(id);
        }
        self.state.borrow_mut().generation += 1;
    }
}

fn on_layout_change(
    tree: &mut SurfaceTree,
    state: &Rc<RefCell<BoundsState>>,
    change: &LayoutChange,
    duration_ms: u32,
    easing: Easing,
) {
    if !change.is_resize_or_move() {
        // Keep the layout pass from overriding the animated bounds
        if let Some(bounds) = state.borrow().last_bounds {
            tree.set_bounds(change.surface, bounds);
        }
        return;
    }

    let (start, generation) = {
        let mut state = state.borrow_mut();
        let start = *state.last_bounds.get_or_insert(change.old);
        state.generation += 1;
        (start, state.generation)
    };

    tree.set_bounds(change.surface, start);
    let animation = BoundsAnimation {
        state: Rc::clone(state),
        surface: change.surface,
        start,
        target: change.new,
        tween: Tween::new(duration_ms, easing),
        generation,
    };
    tree.request_animation_frame(move |tree, dt_ms| animation.step(tree, dt_ms));
}

struct BoundsAnimation {
    state: Rc<RefCell<BoundsState>>,
    surface: SurfaceId,
    start: Rect,
    target: Rect,
    tween: Tween,
    generation: u64,
}

impl BoundsAnimation {
    fn step(mut self, tree: &mut SurfaceTree, dt_ms: f32) {
        if self.state.borrow().generation != self.generation {
            return;
        }

        let sample = self.tween.advance(dt_ms);
        let bounds = self.start.lerp(&self.target, sample.progress).round();
        self.state.borrow_mut().last_bounds = Some(bounds);
        tree.set_bounds(self.surface, bounds);

        if !sample.finished {
            tree.request_animation_frame(move |tree, dt_ms| self.step(tree, dt_ms));
        }
    }
}
