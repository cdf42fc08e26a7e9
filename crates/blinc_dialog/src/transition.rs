//! Transition controller
//!
//! One [`Transition`] per show-then-dismiss lifecycle of an animated dialog.
//!
//! ```text
//! Launching ──(ghost drawn ∧ content laid out, morph ends)──▶ Shown
//!     │ dismiss: deferred                                        │ dismiss
//!     └───────────────(applied on Shown)────────────────────────▶ Dismissing
//!                                                                  │ animated or skipped
//!                                                                  ▼
//!                                                              Dismissed
//! ```
//!
//! All state lives behind a `RefCell` that is never borrowed across calls into
//! dialogs, hosts or the animator: those call back into the transition.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use blinc_core::{
    Color, LayoutParams, ListenerControl, PreDraw, SurfaceId, SurfaceTree, Visibility,
};
use slotmap::new_key_type;

use crate::bounds::AnimatedBoundsListener;
use crate::config::DialogLaunchConfig;
use crate::dialog::{Dialog, WindowAttributes};
use crate::error::{DialogLaunchError, Result};
use crate::ghost;
use crate::host::{ActualDismiss, DismissOverride, HostDialog, HostProvider, OnHostCreated};
use crate::launch::LaunchAnimator;
use crate::morph::{MorphHook, MorphSide, PairedMorph, SurfaceMorph};
use crate::registry::Registry;
use crate::stealer;

new_key_type! {
    /// Handle to a live transition in a [`DialogLaunchAnimator`](crate::DialogLaunchAnimator)
    pub struct TransitionId;
}

/// Label of the surface standing in for a windowed dialog's window
pub const DIALOG_CONTENT_PARENT: &str = "dialog_content_parent";

/// Lifecycle phase of a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
    Launching,
    Shown,
    Dismissing,
    Dismissed,
}

/// How a transition was torn down
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExitPath {
    /// The dialog morphed back into its trigger (instant dismiss)
    Animated,
    /// The exit animation was skipped
    Skipped,
}

/// One-shot suppression of lifecycle echoes between the original dialog and its host
#[derive(Debug, Default)]
pub(crate) struct Suppression {
    ignore_next_hide: bool,
}

impl Suppression {
    pub(crate) fn arm_hide(&mut self) {
        self.ignore_next_hide = true;
    }

    /// Consume the armed hide, if any
    pub(crate) fn absorb_hide(&mut self) -> bool {
        std::mem::take(&mut self.ignore_next_hide)
    }
}

/// Join of the two conditions the launch animation waits for
#[derive(Debug, Default)]
struct LaunchBarrier {
    trigger_ghost_drawn: bool,
    content_laid_out: bool,
    released: bool,
}

impl LaunchBarrier {
    /// True exactly once, when both conditions hold
    fn release(&mut self) -> bool {
        if self.released || !(self.trigger_ghost_drawn && self.content_laid_out) {
            return false;
        }
        self.released = true;
        true
    }
}

pub(crate) struct TransitionParams {
    pub trigger: SurfaceId,
    pub original: Rc<dyn Dialog>,
    pub window: WindowAttributes,
    pub parent: Option<TransitionId>,
    pub animate_background_bounds: bool,
}

struct TransitionState {
    id: TransitionId,
    phase: TransitionPhase,
    trigger: SurfaceId,
    /// Surface holding the busy marker; the trigger may change for stacked dismissal
    busy_surface: SurfaceId,
    window: WindowAttributes,
    content_with_background: Option<SurfaceId>,
    background_color: Color,
    parent: Option<TransitionId>,
    exit_animation_disabled: bool,
    dismiss_requested: bool,
    suppression: Suppression,
    barrier: LaunchBarrier,
    bounds_listener: Option<AnimatedBoundsListener>,
}

struct TransitionShared {
    state: RefCell<TransitionState>,
    original: Rc<dyn Dialog>,
    host: Rc<dyn HostDialog>,
    host_root: SurfaceId,
    animator: Rc<dyn LaunchAnimator>,
    registry: Weak<RefCell<Registry>>,
}

/// Shared handle to a transition
#[derive(Clone)]
pub(crate) struct Transition(Rc<TransitionShared>);

/// Non-owning handle to a transition
#[derive(Clone)]
pub(crate) struct WeakTransition(Weak<TransitionShared>);

impl WeakTransition {
    pub(crate) fn upgrade(&self) -> Option<Transition> {
        self.0.upgrade().map(Transition)
    }
}

impl Transition {
    /// Create the transition and its host dialog
    pub(crate) fn new(
        tree: &mut SurfaceTree,
        params: TransitionParams,
        host_provider: &dyn HostProvider,
        config: &DialogLaunchConfig,
        animator: Rc<dyn LaunchAnimator>,
        registry: Weak<RefCell<Registry>>,
    ) -> Result<Self> {
        let host_root = tree.create("host_root");
        let bounds_listener = params.animate_background_bounds.then(|| {
            AnimatedBoundsListener::new(config.bounds_animation_duration_ms, config.bounds_easing)
        });

        let shared = Rc::new_cyclic(|weak: &Weak<TransitionShared>| {
            let created = WeakTransition(weak.clone());
            let on_created: OnHostCreated = Box::new(move |tree: &mut SurfaceTree| {
                if let Some(transition) = created.upgrade() {
                    transition.on_host_created(tree);
                }
            });

            let dismissed = WeakTransition(weak.clone());
            let dismiss_override: DismissOverride =
                Rc::new(move |tree: &mut SurfaceTree, actual: ActualDismiss| {
                    match dismissed.upgrade() {
                        Some(transition) => transition.on_host_dismissed(tree, actual),
                        None => actual(tree),
                    }
                });

            let host =
                host_provider.create_host(tree, &config.host_theme, on_created, dismiss_override);

            TransitionShared {
                state: RefCell::new(TransitionState {
                    id: TransitionId::default(),
                    phase: TransitionPhase::Launching,
                    trigger: params.trigger,
                    busy_surface: params.trigger,
                    window: params.window,
                    content_with_background: None,
                    background_color: Color::BLACK,
                    parent: params.parent,
                    exit_animation_disabled: false,
                    dismiss_requested: false,
                    suppression: Suppression::default(),
                    barrier: LaunchBarrier::default(),
                    bounds_listener,
                }),
                original: params.original,
                host,
                host_root,
                animator,
                registry,
            }
        });

        if shared.host.window_root().is_none() {
            tree.destroy(host_root);
            return Err(DialogLaunchError::MissingHostWindow);
        }
        Ok(Transition(shared))
    }

    pub(crate) fn downgrade(&self) -> WeakTransition {
        WeakTransition(Rc::downgrade(&self.0))
    }

    pub(crate) fn id(&self) -> TransitionId {
        self.0.state.borrow().id
    }

    pub(crate) fn set_id(&self, id: TransitionId) {
        self.0.state.borrow_mut().id = id;
    }

    pub(crate) fn phase(&self) -> TransitionPhase {
        self.0.state.borrow().phase
    }

    pub(crate) fn trigger(&self) -> SurfaceId {
        self.0.state.borrow().trigger
    }

    pub(crate) fn set_trigger(&self, trigger: SurfaceId) {
        self.0.state.borrow_mut().trigger = trigger;
    }

    pub(crate) fn content_with_background(&self) -> Option<SurfaceId> {
        self.0.state.borrow().content_with_background
    }

    pub(crate) fn host(&self) -> Rc<dyn HostDialog> {
        Rc::clone(&self.0.host)
    }

    pub(crate) fn original(&self) -> Rc<dyn Dialog> {
        Rc::clone(&self.0.original)
    }

    pub(crate) fn is_hosted_by(&self, host: &Rc<dyn HostDialog>) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0.host) as *const (),
            Rc::as_ptr(host) as *const (),
        )
    }

    pub(crate) fn disable_exit_animation(&self) {
        self.0.state.borrow_mut().exit_animation_disabled = true;
    }

    pub(crate) fn is_exit_animation_disabled(&self) -> bool {
        self.0.state.borrow().exit_animation_disabled
    }

    pub(crate) fn arm_hide(&self) {
        self.0.state.borrow_mut().suppression.arm_hide();
    }

    pub(crate) fn absorb_hide(&self) -> bool {
        self.0.state.borrow_mut().suppression.absorb_hide()
    }

    // =========================================================================
    // Launch
    // =========================================================================

    /// Show the host and start stealing the original dialog's content
    pub(crate) fn start(&self, tree: &mut SurfaceTree, content_root: SurfaceId) {
        self.0.host.show(tree);

        let arm = self.downgrade();
        let stolen = self.downgrade();
        stealer::steal_content(
            tree,
            &self.0.original,
            content_root,
            move || {
                if let Some(transition) = arm.upgrade() {
                    transition.arm_hide();
                }
            },
            move |tree, content| {
                if let Some(transition) = stolen.upgrade() {
                    transition.on_content_stolen(tree, content);
                }
            },
        );
    }

    fn on_host_created(&self, tree: &mut SurfaceTree) {
        let host_root = self.0.host_root;
        self.0.host.set_content_view(tree, host_root);

        // Dim only once the animation starts
        self.0.host.set_dim_behind(false);

        let weak = self.downgrade();
        tree.add_pre_draw_listener(host_root, move |tree| {
            if let Some(transition) = weak.upgrade() {
                transition.add_temporary_trigger_ghost(tree);
            }
            PreDraw::ProceedOnce
        });
    }

    fn add_temporary_trigger_ghost(&self, tree: &mut SurfaceTree) {
        let trigger = self.trigger();
        let ghost = if tree.is_drawable(trigger) {
            let weak = self.downgrade();
            ghost::swap_for_ghost(tree, trigger, self.0.host_root, move |tree| {
                if let Some(transition) = weak.upgrade() {
                    transition.on_trigger_ghost_drawn(tree);
                }
            })
        } else {
            None
        };
        if ghost.is_some() {
            return;
        }

        tracing::warn!(
            "transition {:?}: trigger surface {:?} will not draw, launching without it",
            self.id(),
            trigger
        );
        // Still inside a pre-draw pass, continue on the next frame
        let weak = self.downgrade();
        tree.request_animation_frame(move |tree, _| {
            if let Some(transition) = weak.upgrade() {
                transition.on_trigger_ghost_drawn(tree);
            }
        });
    }

    fn on_trigger_ghost_drawn(&self, tree: &mut SurfaceTree) {
        self.0.state.borrow_mut().barrier.trigger_ghost_drawn = true;
        self.maybe_start_launch(tree);
    }

    fn on_content_stolen(&self, tree: &mut SurfaceTree, content: SurfaceId) {
        let window = self.0.state.borrow().window;
        let host_root = self.0.host_root;

        let content_with_background = if window.is_fullscreen() {
            let Some(with_background) = tree.find_first_with_background(content) else {
                panic!("unable to find a surface with a background in fullscreen dialog content");
            };
            tree.set_layout_params(content, LayoutParams::match_parent());
            tree.add_child(host_root, content);
            with_background
        } else {
            // Stands in for the dialog window: its size, gravity and background
            let parent = tree.create(DIALOG_CONTENT_PARENT);
            tree.set_background(parent, window.background);
            tree.set_layout_params(content, LayoutParams::match_parent());
            tree.add_child(parent, content);
            tree.set_layout_params(parent, window.layout_params());
            tree.add_child(host_root, parent);
            parent
        };

        tree.force_visibility(content_with_background, Visibility::Invisible);
        let background_color = tree
            .background(content_with_background)
            .map_or(Color::BLACK, |background| background.color);
        {
            let mut state = self.0.state.borrow_mut();
            state.content_with_background = Some(content_with_background);
            state.background_color = background_color;
        }

        tree.request_layout(content_with_background);
        let weak = self.downgrade();
        tree.add_layout_listener(content_with_background, move |tree, _| {
            if let Some(transition) = weak.upgrade() {
                transition.0.state.borrow_mut().barrier.content_laid_out = true;
                transition.maybe_start_launch(tree);
            }
            ListenerControl::Remove
        });
    }

    fn maybe_start_launch(&self, tree: &mut SurfaceTree) {
        if !self.0.state.borrow_mut().barrier.release() {
            return;
        }

        self.0.host.set_dim_behind(true);
        let trigger = self.trigger();
        if !tree.is_drawable(trigger) {
            self.show_without_animation(tree);
            return;
        }
        tracing::debug!("transition {:?}: starting launch animation", self.id());

        // The morph ghosts the trigger itself from here on
        let on_start: MorphHook = Box::new(move |tree: &mut SurfaceTree| {
            ghost::remove_ghost(tree, trigger);
        });
        let weak = self.downgrade();
        let on_end: MorphHook = Box::new(move |tree: &mut SurfaceTree| {
            if let Some(transition) = weak.upgrade() {
                transition.on_launch_finished(tree);
            }
        });
        self.start_animation(tree, true, on_start, on_end);
    }

    /// Show the stolen content in place, there is no trigger left to morph from
    fn show_without_animation(&self, tree: &mut SurfaceTree) {
        tracing::debug!(
            "transition {:?}: trigger no longer drawn, showing dialog without animation",
            self.id()
        );
        let (trigger, content_with_background) = {
            let state = self.0.state.borrow();
            (state.trigger, state.content_with_background)
        };
        ghost::remove_ghost(tree, trigger);
        if let Some(surface) = content_with_background {
            tree.force_visibility(surface, Visibility::Visible);
        }
        self.on_launch_finished(tree);
    }

    fn start_animation(
        &self,
        tree: &mut SurfaceTree,
        launching: bool,
        on_start: MorphHook,
        on_end: MorphHook,
    ) {
        let (trigger, content_with_background, background_color) = {
            let state = self.0.state.borrow();
            (
                state.trigger,
                state.content_with_background,
                state.background_color,
            )
        };
        let Some(content_with_background) = content_with_background else {
            return;
        };

        let (start, end) = if launching {
            (trigger, content_with_background)
        } else {
            (content_with_background, trigger)
        };
        let host_root = self.0.host_root;
        let controller = PairedMorph::new(
            SurfaceMorph::new(MorphSide::Start, start, host_root, background_color),
            SurfaceMorph::new(MorphSide::End, end, host_root, background_color),
        )
        .with_on_start(on_start)
        .with_on_end(on_end);

        let end_state = controller.end_state(tree);
        self.0.animator.start(tree, Box::new(controller), end_state);
    }

    fn on_launch_finished(&self, tree: &mut SurfaceTree) {
        let (trigger, dismiss_requested) = {
            let mut state = self.0.state.borrow_mut();
            state.phase = TransitionPhase::Shown;
            let content_with_background = state.content_with_background;
            if let (Some(listener), Some(surface)) =
                (state.bounds_listener.as_mut(), content_with_background)
            {
                listener.attach(tree, surface);
            }
            (state.trigger, std::mem::take(&mut state.dismiss_requested))
        };

        // Hidden for as long as the dialog is shown
        tree.force_visibility(trigger, Visibility::Invisible);
        tracing::debug!("transition {:?}: launch animation finished", self.id());

        if dismiss_requested {
            tracing::debug!("transition {:?}: applying deferred dismiss", self.id());
            self.0.host.dismiss(tree);
        }
    }

    // =========================================================================
    // Dismiss
    // =========================================================================

    fn on_host_dismissed(&self, tree: &mut SurfaceTree, actual: ActualDismiss) {
        match self.phase() {
            TransitionPhase::Launching => {
                self.0.state.borrow_mut().dismiss_requested = true;
                tracing::debug!(
                    "transition {:?}: dismiss requested while launching, deferring",
                    self.id()
                );
            }
            TransitionPhase::Dismissing | TransitionPhase::Dismissed => {
                tracing::trace!("transition {:?}: already dismissing", self.id());
            }
            TransitionPhase::Shown => {
                self.0.state.borrow_mut().phase = TransitionPhase::Dismissing;
                self.hide_into_trigger(tree, actual);
            }
        }
    }

    fn hide_into_trigger(&self, tree: &mut SurfaceTree, actual: ActualDismiss) {
        let original = self.original();
        let host = self.host();
        let dismiss_dialogs = move |tree: &mut SurfaceTree, instant_dismiss: bool| {
            if instant_dismiss {
                original.hide(tree);
                host.hide(tree);
            }
            original.dismiss(tree);
            actual(tree);
        };

        if !self.should_animate_into_trigger(tree) {
            tracing::info!(
                "transition {:?}: skipping animation of dialog into the trigger surface",
                self.id()
            );
            let trigger = self.trigger();
            tree.set_visibility_locked(trigger, false);
            if tree.visibility(trigger) == Visibility::Invisible {
                tree.force_visibility(trigger, Visibility::Visible);
            }
            self.detach_bounds_listener(tree);

            dismiss_dialogs(tree, false);
            self.finish(ExitPath::Skipped);
            return;
        }

        let host = self.host();
        let on_start: MorphHook = Box::new(move |_: &mut SurfaceTree| host.set_dim_behind(false));
        let weak = self.downgrade();
        let on_end: MorphHook = Box::new(move |tree: &mut SurfaceTree| {
            if let Some(transition) = weak.upgrade() {
                transition.on_exit_animation_finished(tree, Box::new(dismiss_dialogs));
            }
        });
        self.start_animation(tree, false, on_start, on_end);
    }

    fn on_exit_animation_finished(
        &self,
        tree: &mut SurfaceTree,
        dismiss_dialogs: Box<dyn FnOnce(&mut SurfaceTree, bool)>,
    ) {
        let (trigger, content_with_background) = {
            let state = self.0.state.borrow();
            (state.trigger, state.content_with_background)
        };

        tree.set_visibility_locked(trigger, false);
        tree.force_visibility(trigger, Visibility::Visible);
        if let Some(surface) = content_with_background {
            tree.force_visibility(surface, Visibility::Invisible);
        }
        self.detach_bounds_listener(tree);

        // Keep the trigger pixels in the host until the trigger itself has drawn
        ghost::add_ghost(tree, trigger, self.0.host_root);
        let weak = self.downgrade();
        ghost::when_drawn_or_detached(tree, trigger, move |tree| {
            ghost::remove_ghost(tree, trigger);
            dismiss_dialogs(tree, true);
            if let Some(transition) = weak.upgrade() {
                transition.finish(ExitPath::Animated);
            }
        });
    }

    fn should_animate_into_trigger(&self, tree: &SurfaceTree) -> bool {
        let (disabled, trigger) = {
            let state = self.0.state.borrow();
            (state.exit_animation_disabled, state.trigger)
        };
        if disabled || !self.0.host.is_showing(tree) {
            return false;
        }

        // Anything else making the trigger visible means we should not animate into it
        if tree.visibility(trigger) != Visibility::Invisible {
            return false;
        }
        if !tree.is_attached(trigger) {
            return false;
        }
        tree.parent(trigger).map_or(true, |parent| tree.is_shown(parent))
    }

    fn detach_bounds_listener(&self, tree: &mut SurfaceTree) {
        if let Some(listener) = self.0.state.borrow_mut().bounds_listener.as_mut() {
            listener.detach(tree);
        }
    }

    fn finish(&self, path: ExitPath) {
        let (id, busy_surface) = {
            let mut state = self.0.state.borrow_mut();
            state.phase = TransitionPhase::Dismissed;
            (state.id, state.busy_surface)
        };
        tracing::debug!("transition {:?}: finished ({:?})", id, path);

        if let Some(registry) = self.0.registry.upgrade() {
            Registry::finish(&registry, id, busy_surface, path);
        }
    }

    // =========================================================================
    // Lifecycle of the original dialog
    // =========================================================================

    /// Re-apply the original window size to the hosted content
    pub(crate) fn on_original_dialog_size_changed(&self, tree: &mut SurfaceTree) {
        let Some(window) = self.0.original.window_attributes() else {
            return;
        };
        self.0.state.borrow_mut().window = window;

        let host_root = self.0.host_root;
        let mut hosted = tree
            .children(host_root)
            .iter()
            .copied()
            .filter(|child| tree.ghosted_surface(*child).is_none());
        let (Some(content), None) = (hosted.next(), hosted.next()) else {
            return;
        };
        let Some(mut params) = tree.layout_params(content) else {
            return;
        };
        params.width = window.width;
        params.height = window.height;
        tree.set_layout_params(content, params);
    }

    /// Tear down every ancestor transition and return the root trigger
    ///
    /// Ancestors lose their exit animation and their dialogs are hidden then
    /// dismissed, so only the topmost dialog animates, straight into the
    /// surface the first dialog was launched from.
    pub(crate) fn prepare_for_stack_dismiss(&self, tree: &mut SurfaceTree) -> SurfaceId {
        let (parent, trigger) = {
            let state = self.0.state.borrow();
            (state.parent, state.trigger)
        };
        let Some(parent) = parent.and_then(|id| Registry::lookup(&self.0.registry, id)) else {
            return trigger;
        };

        parent.disable_exit_animation();
        parent.original().hide(tree);
        let surface = parent.prepare_for_stack_dismiss(tree);
        parent.original().dismiss(tree);
        parent.host().dismiss(tree);

        // Invisible, so the topmost dialog animates into it
        tree.force_visibility(surface, Visibility::Invisible);
        surface
    }
}
