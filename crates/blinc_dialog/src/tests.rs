//! End-to-end launch and dismiss scenarios on a headless surface tree

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blinc_core::{
    Background, Color, Dimension, Gravity, LayoutParams, Rect, Size, SurfaceId, SurfaceTree,
    Visibility,
};

use crate::dialog::{Dialog, DismissReason, SurfaceDialog, WindowAttributes};
use crate::error::DialogLaunchError;
use crate::host::{FullscreenHostProvider, HostDialog};
use crate::interpolator::TransitionState;
use crate::launch::{FrameLaunchAnimator, LaunchAnimator, LaunchController};
use crate::registry::{DialogLaunchAnimator, Launch};
use crate::transition::{ExitPath, TransitionId, TransitionPhase, DIALOG_CONTENT_PARENT};

const FRAME_MS: f32 = 16.0;

/// Counts the morphs started through it
#[derive(Default)]
struct CountingAnimator {
    inner: FrameLaunchAnimator,
    starts: Cell<usize>,
}

impl LaunchAnimator for CountingAnimator {
    fn start(
        &self,
        tree: &mut SurfaceTree,
        controller: Box<dyn LaunchController>,
        end: TransitionState,
    ) {
        self.starts.set(self.starts.get() + 1);
        self.inner.start(tree, controller, end);
    }
}

struct Fixture {
    tree: SurfaceTree,
    app: SurfaceId,
    trigger: SurfaceId,
    animator: DialogLaunchAnimator,
    counting: Rc<CountingAnimator>,
    finished: Rc<RefCell<Vec<(TransitionId, ExitPath)>>>,
}

impl Fixture {
    fn new() -> Self {
        let mut tree = SurfaceTree::new(Size::new(400.0, 800.0));
        let app = tree.create_window("app", tree.screen());
        tree.attach_window(app);
        let trigger = tree.create("trigger");
        tree.set_layout_params(
            trigger,
            LayoutParams::fixed(100.0, 40.0).with_gravity(Gravity::Bottom),
        );
        tree.add_child(app, trigger);
        tree.frame(FRAME_MS);

        let counting = Rc::new(CountingAnimator::default());
        let animator = DialogLaunchAnimator::new(Rc::new(FullscreenHostProvider::new()))
            .with_launch_animator(counting.clone());

        let finished = Rc::new(RefCell::new(Vec::new()));
        let finished_clone = Rc::clone(&finished);
        animator.on_transition_finished(move |id, path| finished_clone.borrow_mut().push((id, path)));

        Self {
            tree,
            app,
            trigger,
            animator,
            counting,
            finished,
        }
    }

    fn dialog(&mut self, label: &str) -> Rc<SurfaceDialog> {
        let content = self.tree.create(format!("{}/body", label));
        self.tree.set_content_size(content, Size::new(200.0, 300.0));
        let attributes = WindowAttributes::fixed(200.0, 300.0)
            .with_background(Background::new(Color::WHITE, 28.0));
        SurfaceDialog::new(&mut self.tree, label, content, attributes)
    }

    fn launch(&mut self, dialog: &Rc<SurfaceDialog>, animate_bounds: bool) -> Launch {
        let dialog: Rc<dyn Dialog> = dialog.clone();
        self.animator
            .show_from_surface(&mut self.tree, dialog, self.trigger, animate_bounds)
            .unwrap()
    }

    fn frames(&mut self, count: usize) {
        for _ in 0..count {
            self.tree.frame(FRAME_MS);
        }
    }

    fn settle(&mut self) {
        self.frames(60);
    }

    fn starts(&self) -> usize {
        self.counting.starts.get()
    }

    fn finished(&self) -> Vec<(TransitionId, ExitPath)> {
        self.finished.borrow().clone()
    }
}

#[test]
fn test_animated_launch_and_dismiss() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let launch = fx.launch(&dialog, false);
    let id = launch.id().unwrap();
    let host = launch.host().unwrap().clone();
    assert_eq!(fx.animator.phase(id), Some(TransitionPhase::Launching));
    assert!(fx.animator.is_busy(fx.trigger));

    fx.settle();
    let content = fx.animator.content_with_background(id).unwrap();
    assert_eq!(fx.animator.phase(id), Some(TransitionPhase::Shown));
    assert_eq!(fx.tree.label(content), Some(DIALOG_CONTENT_PARENT));
    assert_eq!(fx.tree.bounds(content), Rect::new(100.0, 250.0, 200.0, 300.0));
    assert_eq!(fx.tree.visibility(fx.trigger), Visibility::Invisible);
    assert!(fx.tree.is_visibility_locked(fx.trigger));
    assert!(fx.tree.is_shown(content));
    assert!(host.is_showing(&fx.tree));
    assert!(host.is_dimming_behind());
    // The original window never drew
    assert_eq!(fx.tree.draw_count(dialog.window()), 0);
    assert_eq!(fx.starts(), 1);

    dialog.dismiss(&mut fx.tree);
    assert_eq!(fx.animator.phase(id), Some(TransitionPhase::Dismissing));
    assert!(!host.is_dimming_behind());

    fx.settle();
    assert_eq!(fx.finished(), vec![(id, ExitPath::Animated)]);
    assert_eq!(fx.starts(), 2);
    assert_eq!(fx.tree.visibility(fx.trigger), Visibility::Visible);
    assert!(!fx.tree.is_visibility_locked(fx.trigger));
    assert_eq!(fx.tree.ghost(fx.trigger), None);
    assert_eq!(fx.tree.visibility(content), Visibility::Invisible);
    assert!(!host.is_showing(&fx.tree));
    assert_eq!(fx.animator.transition_count(), 0);
    assert!(!fx.animator.is_busy(fx.trigger));
    assert_eq!(dialog.listener_count(), 0);
}

#[test]
fn test_original_hide_and_show_are_routed_to_host() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let launch = fx.launch(&dialog, false);
    let host = launch.host().unwrap().clone();
    fx.settle();

    dialog.hide(&mut fx.tree);
    assert!(!host.is_showing(&fx.tree));

    dialog.show(&mut fx.tree);
    assert!(host.is_showing(&fx.tree));
    // Showing the original again must not bring its window back
    assert!(!dialog.is_showing(&fx.tree));
    assert_eq!(fx.tree.visibility(dialog.window()), Visibility::Gone);
    assert_eq!(fx.starts(), 1);
}

#[test]
fn test_dismiss_skips_animation_when_trigger_detached() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let id = fx.launch(&dialog, false).id().unwrap();
    fx.settle();

    fx.tree.remove_from_parent(fx.trigger);
    dialog.dismiss(&mut fx.tree);

    assert_eq!(fx.finished(), vec![(id, ExitPath::Skipped)]);
    assert_eq!(fx.starts(), 1);
    assert_eq!(fx.tree.visibility(fx.trigger), Visibility::Visible);
    assert!(!fx.tree.is_visibility_locked(fx.trigger));
    assert!(!fx.animator.is_busy(fx.trigger));
    assert_eq!(fx.animator.transition_count(), 0);
}

fn assert_skipped_exit(fx: &Fixture, id: TransitionId, starts: usize) {
    assert_eq!(fx.finished(), vec![(id, ExitPath::Skipped)]);
    assert_eq!(fx.starts(), starts);
    assert_eq!(fx.tree.visibility(fx.trigger), Visibility::Visible);
    assert!(!fx.tree.is_visibility_locked(fx.trigger));
    assert!(!fx.animator.is_busy(fx.trigger));
    assert_eq!(fx.animator.transition_count(), 0);
}

#[test]
fn test_dismiss_skips_animation_when_trigger_ancestor_hidden() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let id = fx.launch(&dialog, false).id().unwrap();
    fx.settle();

    fx.tree.force_visibility(fx.app, Visibility::Invisible);
    dialog.dismiss(&mut fx.tree);
    assert_skipped_exit(&fx, id, 1);
}

#[test]
fn test_dismiss_skips_animation_when_host_hidden() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let launch = fx.launch(&dialog, false);
    let id = launch.id().unwrap();
    let host = launch.host().unwrap().clone();
    fx.settle();

    dialog.hide(&mut fx.tree);
    assert!(!host.is_showing(&fx.tree));
    dialog.dismiss(&mut fx.tree);
    assert_skipped_exit(&fx, id, 1);
}

#[test]
fn test_dismiss_skips_animation_when_trigger_shown_elsewhere() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let id = fx.launch(&dialog, false).id().unwrap();
    fx.settle();

    // The lock only stops set_visibility
    assert!(!fx.tree.set_visibility(fx.trigger, Visibility::Visible));
    fx.tree.force_visibility(fx.trigger, Visibility::Visible);
    dialog.dismiss(&mut fx.tree);
    assert_skipped_exit(&fx, id, 1);
}

#[test]
fn test_trigger_detached_during_launch_shows_without_animation() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let launch = fx.launch(&dialog, false);
    let id = launch.id().unwrap();
    let host = launch.host().unwrap().clone();

    fx.tree.remove_from_parent(fx.trigger);
    fx.settle();
    let content = fx.animator.content_with_background(id).unwrap();
    assert_eq!(fx.animator.phase(id), Some(TransitionPhase::Shown));
    assert_eq!(fx.starts(), 0);
    assert!(fx.tree.is_shown(content));
    assert!(host.is_dimming_behind());
    assert_eq!(fx.tree.pending_draw_callbacks(), 0);

    dialog.dismiss(&mut fx.tree);
    assert_skipped_exit(&fx, id, 0);
    assert!(!host.is_showing(&fx.tree));
    fx.settle();
    assert_eq!(fx.tree.pending_draw_callbacks(), 0);
}

#[test]
fn test_trigger_detached_after_ghost_swap_shows_without_animation() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let id = fx.launch(&dialog, false).id().unwrap();
    fx.frames(1);

    fx.tree.remove_from_parent(fx.trigger);
    fx.settle();
    assert_eq!(fx.animator.phase(id), Some(TransitionPhase::Shown));
    assert_eq!(fx.starts(), 0);
    assert_eq!(fx.tree.ghost(fx.trigger), None);
    assert_eq!(fx.tree.pending_draw_callbacks(), 0);

    dialog.dismiss(&mut fx.tree);
    assert_skipped_exit(&fx, id, 0);
}

#[test]
fn test_dismiss_requested_then_trigger_detached_during_launch() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let launch = fx.launch(&dialog, false);
    let id = launch.id().unwrap();
    let host = launch.host().unwrap().clone();

    fx.tree.remove_from_parent(fx.trigger);
    dialog.dismiss(&mut fx.tree);
    fx.settle();

    assert_skipped_exit(&fx, id, 0);
    assert!(!host.is_showing(&fx.tree));
    assert_eq!(fx.tree.pending_draw_callbacks(), 0);
}

#[test]
fn test_trigger_detached_during_exit_animation_still_finishes() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let launch = fx.launch(&dialog, false);
    let id = launch.id().unwrap();
    let host = launch.host().unwrap().clone();
    fx.settle();

    dialog.dismiss(&mut fx.tree);
    fx.frames(2);
    fx.tree.remove_from_parent(fx.trigger);
    fx.settle();

    assert_eq!(fx.finished(), vec![(id, ExitPath::Animated)]);
    assert_eq!(fx.starts(), 2);
    assert_eq!(fx.tree.visibility(fx.trigger), Visibility::Visible);
    assert_eq!(fx.tree.ghost(fx.trigger), None);
    assert!(!host.is_showing(&fx.tree));
    assert_eq!(fx.animator.transition_count(), 0);
    assert_eq!(fx.tree.pending_draw_callbacks(), 0);
}

#[test]
fn test_dismiss_during_launch_is_deferred() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let id = fx.launch(&dialog, false).id().unwrap();
    fx.frames(2);
    assert_eq!(fx.animator.phase(id), Some(TransitionPhase::Launching));

    dialog.dismiss(&mut fx.tree);
    assert_eq!(fx.animator.phase(id), Some(TransitionPhase::Launching));
    assert!(fx.finished().is_empty());

    fx.settle();
    fx.settle();
    assert_eq!(fx.finished(), vec![(id, ExitPath::Animated)]);
    assert_eq!(fx.starts(), 2);
    assert_eq!(fx.tree.visibility(fx.trigger), Visibility::Visible);
}

#[test]
fn test_busy_trigger_shows_dialog_directly() {
    let mut fx = Fixture::new();
    let first = fx.dialog("first");
    let id = fx.launch(&first, false).id().unwrap();

    let second = fx.dialog("second");
    let launch = fx.launch(&second, false);
    assert!(!launch.is_animated());
    assert!(second.is_showing(&fx.tree));
    assert_eq!(second.listener_count(), 0);

    fx.settle();
    assert_eq!(fx.animator.transition_count(), 1);
    assert_eq!(fx.animator.phase(id), Some(TransitionPhase::Shown));
    assert_eq!(fx.starts(), 1);
}

#[test]
fn test_stack_dismiss_animates_top_dialog_into_first_trigger() {
    let mut fx = Fixture::new();
    let first = fx.dialog("first");
    let launch_a = fx.launch(&first, false);
    let id_a = launch_a.id().unwrap();
    fx.settle();

    let second = fx.dialog("second");
    let host_a = launch_a.host().unwrap().clone();
    let launch_b = fx
        .animator
        .show_from_dialog(&mut fx.tree, second.clone(), &host_a, false)
        .unwrap();
    let id_b = launch_b.id().unwrap();
    assert_eq!(
        fx.animator.trigger(id_b),
        fx.animator.content_with_background(id_a)
    );
    fx.settle();

    let third = fx.dialog("third");
    let host_b = launch_b.host().unwrap().clone();
    let id_c = fx
        .animator
        .show_from_dialog(&mut fx.tree, third.clone(), &host_b, false)
        .unwrap()
        .id()
        .unwrap();
    fx.settle();
    assert_eq!(fx.starts(), 3);

    third.dismiss_stack(&mut fx.tree);
    assert_eq!(
        fx.finished(),
        vec![(id_a, ExitPath::Skipped), (id_b, ExitPath::Skipped)]
    );
    assert_eq!(fx.animator.trigger(id_c), Some(fx.trigger));
    assert!(first.is_dismissed());
    assert!(second.is_dismissed());

    fx.settle();
    assert_eq!(
        fx.finished(),
        vec![
            (id_a, ExitPath::Skipped),
            (id_b, ExitPath::Skipped),
            (id_c, ExitPath::Animated)
        ]
    );
    assert_eq!(fx.starts(), 4);
    assert_eq!(fx.tree.visibility(fx.trigger), Visibility::Visible);
    assert!(!fx.tree.is_visibility_locked(fx.trigger));
    assert_eq!(fx.animator.transition_count(), 0);
}

#[test]
fn test_device_locked_dismiss_skips_animation() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let id = fx.launch(&dialog, false).id().unwrap();
    fx.settle();

    dialog.dismiss_with_reason(&mut fx.tree, DismissReason::DeviceLocked);
    assert_eq!(fx.finished(), vec![(id, ExitPath::Skipped)]);
    assert_eq!(fx.starts(), 1);
    assert_eq!(fx.tree.visibility(fx.trigger), Visibility::Visible);
}

#[test]
fn test_disabled_exit_animations_skip() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let id = fx.launch(&dialog, false).id().unwrap();
    fx.settle();

    fx.animator.disable_all_current_exit_animations();
    assert_eq!(fx.animator.is_exit_animation_disabled(id), Some(true));
    dialog.dismiss(&mut fx.tree);
    assert_eq!(fx.finished(), vec![(id, ExitPath::Skipped)]);
}

#[test]
fn test_outside_tap_dismisses_through_host() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let id = fx.launch(&dialog, false).id().unwrap();
    fx.settle();

    assert!(fx.animator.dismiss_on_outside_tap(&mut fx.tree, id));
    fx.settle();
    assert_eq!(fx.finished(), vec![(id, ExitPath::Animated)]);
    assert!(dialog.is_dismissed());
    assert!(!fx.animator.dismiss_on_outside_tap(&mut fx.tree, id));
}

#[test]
fn test_resize_during_launch_retargets_morph() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let id = fx.launch(&dialog, false).id().unwrap();
    fx.frames(10);

    dialog.set_window_size(&mut fx.tree, Dimension::Fixed(300.0), Dimension::Fixed(400.0));
    fx.settle();

    let content = fx.animator.content_with_background(id).unwrap();
    assert_eq!(fx.starts(), 1);
    assert_eq!(fx.animator.phase(id), Some(TransitionPhase::Shown));
    assert_eq!(fx.tree.bounds(content), Rect::new(50.0, 200.0, 300.0, 400.0));
}

#[test]
fn test_resize_when_shown_animates_background_bounds() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let id = fx.launch(&dialog, true).id().unwrap();
    fx.settle();
    let content = fx.animator.content_with_background(id).unwrap();

    dialog.set_window_size(&mut fx.tree, Dimension::Fixed(300.0), Dimension::Fixed(400.0));
    fx.frames(1);
    assert_eq!(fx.tree.bounds(content), Rect::new(100.0, 250.0, 200.0, 300.0));

    fx.settle();
    assert_eq!(fx.tree.bounds(content), Rect::new(50.0, 200.0, 300.0, 400.0));
    assert_eq!(fx.starts(), 1);
}

#[test]
fn test_missing_background_is_rejected() {
    let mut fx = Fixture::new();
    let content = fx.tree.create("bare/body");
    let dialog = SurfaceDialog::new(
        &mut fx.tree,
        "bare",
        content,
        WindowAttributes::fixed(200.0, 300.0),
    );

    let result = fx
        .animator
        .show_from_surface(&mut fx.tree, dialog.clone(), fx.trigger, false);
    assert!(matches!(result, Err(DialogLaunchError::MissingBackground)));
    assert!(!fx.animator.is_busy(fx.trigger));
    assert_eq!(fx.animator.transition_count(), 0);
    assert!(!dialog.is_showing(&fx.tree));
}

struct ShellDialog;

impl Dialog for ShellDialog {
    fn show(&self, _tree: &mut SurfaceTree) {}
    fn hide(&self, _tree: &mut SurfaceTree) {}
    fn dismiss(&self, _tree: &mut SurfaceTree) {}

    fn is_showing(&self, _tree: &SurfaceTree) -> bool {
        false
    }

    fn content_root(&self) -> Option<SurfaceId> {
        None
    }

    fn window_root(&self) -> Option<SurfaceId> {
        None
    }

    fn window_attributes(&self) -> Option<WindowAttributes> {
        Some(WindowAttributes::fullscreen())
    }
}

#[test]
fn test_missing_content_root_is_rejected() {
    let mut fx = Fixture::new();
    let result = fx
        .animator
        .show_from_surface(&mut fx.tree, Rc::new(ShellDialog), fx.trigger, false);
    assert!(matches!(result, Err(DialogLaunchError::MissingContentRoot)));
    assert!(!fx.animator.is_busy(fx.trigger));
}

#[test]
fn test_show_from_unknown_host_has_no_content() {
    let mut fx = Fixture::new();
    let dialog = fx.dialog("dialog");
    let stray: Rc<dyn HostDialog> = crate::host::SurfaceHostDialog::new(
        &mut fx.tree,
        "stray",
        Box::new(|_: &mut SurfaceTree| {}),
        Rc::new(|tree: &mut SurfaceTree, actual: crate::host::ActualDismiss| actual(tree)),
    );

    let result = fx
        .animator
        .show_from_dialog(&mut fx.tree, dialog.clone(), &stray, false);
    assert!(matches!(result, Err(DialogLaunchError::NoDialogContent)));
}
