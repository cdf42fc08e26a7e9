//! Dialog launch animator
//!
//! Entry point of the crate. Owns the registry of live transitions and the
//! busy markers that keep one surface from launching two dialogs at once.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use blinc_core::{MainThread, SurfaceId, SurfaceTree};
use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::config::DialogLaunchConfig;
use crate::dialog::Dialog;
use crate::error::{DialogLaunchError, Result};
use crate::host::{HostDialog, HostProvider};
use crate::launch::{FrameLaunchAnimator, LaunchAnimator};
use crate::router::LifecycleRouter;
use crate::transition::{ExitPath, Transition, TransitionId, TransitionParams, TransitionPhase};

type FinishedObserver = Rc<dyn Fn(TransitionId, ExitPath)>;

#[derive(Default)]
pub(crate) struct Registry {
    transitions: SlotMap<TransitionId, Transition>,
    busy: FxHashSet<SurfaceId>,
    observers: SmallVec<[FinishedObserver; 2]>,
}

impl Registry {
    pub(crate) fn lookup(registry: &Weak<RefCell<Registry>>, id: TransitionId) -> Option<Transition> {
        let registry = registry.upgrade()?;
        let transition = registry.borrow().transitions.get(id).cloned();
        transition
    }

    /// Drop a finished transition and release its busy marker
    pub(crate) fn finish(
        registry: &Rc<RefCell<Registry>>,
        id: TransitionId,
        busy_surface: SurfaceId,
        path: ExitPath,
    ) {
        let observers = {
            let mut registry = registry.borrow_mut();
            registry.transitions.remove(id);
            registry.busy.remove(&busy_surface);
            registry.observers.clone()
        };
        for observer in observers {
            observer(id, path);
        }
    }
}

/// Outcome of a launch request
#[derive(Clone)]
pub enum Launch {
    /// The dialog is being animated out of its trigger inside `host`
    Animated {
        id: TransitionId,
        host: Rc<dyn HostDialog>,
    },
    /// The trigger was busy; the dialog was shown without animation
    ShownDirectly,
}

impl Launch {
    pub fn id(&self) -> Option<TransitionId> {
        match self {
            Launch::Animated { id, .. } => Some(*id),
            Launch::ShownDirectly => None,
        }
    }

    /// Host showing the dialog content, for chaining with
    /// [`DialogLaunchAnimator::show_from_dialog`]
    pub fn host(&self) -> Option<&Rc<dyn HostDialog>> {
        match self {
            Launch::Animated { host, .. } => Some(host),
            Launch::ShownDirectly => None,
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Launch::Animated { .. })
    }
}

impl std::fmt::Debug for Launch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Launch::Animated { id, .. } => f.debug_struct("Animated").field("id", id).finish(),
            Launch::ShownDirectly => f.write_str("ShownDirectly"),
        }
    }
}

/// Animates dialogs out of the surface that opened them
///
/// ```ignore
/// let animator = DialogLaunchAnimator::new(Rc::new(FullscreenHostProvider::new()));
/// let launch = animator.show_from_surface(&mut tree, dialog, button, false)?;
/// ```
///
/// Must be created and used on the UI thread.
pub struct DialogLaunchAnimator {
    main_thread: MainThread,
    config: DialogLaunchConfig,
    animator: Rc<dyn LaunchAnimator>,
    host_provider: Rc<dyn HostProvider>,
    registry: Rc<RefCell<Registry>>,
}

impl DialogLaunchAnimator {
    pub fn new(host_provider: Rc<dyn HostProvider>) -> Self {
        Self::with_config(DialogLaunchConfig::default(), host_provider)
    }

    pub fn with_config(config: DialogLaunchConfig, host_provider: Rc<dyn HostProvider>) -> Self {
        let animator = Rc::new(FrameLaunchAnimator::from_config(&config));
        Self {
            main_thread: MainThread::current(),
            config,
            animator,
            host_provider,
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    /// Replace the animator driving the morph
    pub fn with_launch_animator(mut self, animator: Rc<dyn LaunchAnimator>) -> Self {
        self.animator = animator;
        self
    }

    pub fn config(&self) -> &DialogLaunchConfig {
        &self.config
    }

    /// Show `dialog` growing out of `surface`
    ///
    /// If `surface` is inside a dialog this animator is currently showing, the
    /// animation starts from that dialog's background surface instead. When
    /// `animate_background_bounds` is set, later size changes of the dialog
    /// are animated too.
    ///
    /// Returns [`Launch::ShownDirectly`] without animating if the surface is
    /// already running a launch animation.
    pub fn show_from_surface(
        &self,
        tree: &mut SurfaceTree,
        dialog: Rc<dyn Dialog>,
        surface: SurfaceId,
        animate_background_bounds: bool,
    ) -> Result<Launch> {
        self.main_thread
            .assert_current("DialogLaunchAnimator::show_from_surface");

        let parent = self.find_parent(tree, surface);
        let animate_from = parent.map_or(surface, |(_, content)| content);

        if self.registry.borrow().busy.contains(&animate_from) {
            tracing::error!(
                "not running dialog launch animation from {:?} as there is already one running",
                animate_from
            );
            dialog.show(tree);
            return Ok(Launch::ShownDirectly);
        }

        let content_root = dialog
            .content_root()
            .ok_or(DialogLaunchError::MissingContentRoot)?;
        let window = dialog
            .window_attributes()
            .ok_or(DialogLaunchError::MissingWindow)?;
        if !window.is_fullscreen() && window.background.is_none() {
            return Err(DialogLaunchError::MissingBackground);
        }

        self.registry.borrow_mut().busy.insert(animate_from);
        let params = TransitionParams {
            trigger: animate_from,
            original: Rc::clone(&dialog),
            window,
            parent: parent.map(|(id, _)| id),
            animate_background_bounds,
        };
        let transition = match Transition::new(
            tree,
            params,
            self.host_provider.as_ref(),
            &self.config,
            Rc::clone(&self.animator),
            Rc::downgrade(&self.registry),
        ) {
            Ok(transition) => transition,
            Err(err) => {
                self.registry.borrow_mut().busy.remove(&animate_from);
                return Err(err);
            }
        };

        let id = self
            .registry
            .borrow_mut()
            .transitions
            .insert(transition.clone());
        transition.set_id(id);
        tracing::debug!("transition {:?}: launching dialog from {:?}", id, animate_from);

        transition.start(tree, content_root);
        // After start: the show issued while stealing must not be routed back
        LifecycleRouter::register(&transition, &dialog);

        Ok(Launch::Animated {
            id,
            host: transition.host(),
        })
    }

    /// Show `dialog` growing out of the dialog currently shown by `parent_host`
    pub fn show_from_dialog(
        &self,
        tree: &mut SurfaceTree,
        dialog: Rc<dyn Dialog>,
        parent_host: &Rc<dyn HostDialog>,
        animate_background_bounds: bool,
    ) -> Result<Launch> {
        self.main_thread
            .assert_current("DialogLaunchAnimator::show_from_dialog");

        let content_with_background = {
            let registry = self.registry.borrow();
            registry
                .transitions
                .values()
                .find(|transition| transition.is_hosted_by(parent_host))
                .and_then(|transition| transition.content_with_background())
        };
        let surface = content_with_background
            .and_then(|content| tree.child_at(content, 0))
            .ok_or(DialogLaunchError::NoDialogContent)?;

        self.show_from_surface(tree, dialog, surface, animate_background_bounds)
    }

    /// Make every currently shown dialog dismiss without animating
    pub fn disable_all_current_exit_animations(&self) {
        self.main_thread
            .assert_current("DialogLaunchAnimator::disable_all_current_exit_animations");
        for transition in self.registry.borrow().transitions.values() {
            transition.disable_exit_animation();
        }
    }

    /// Prepare the stack ending in `id` for dismissal, see
    /// [`DialogListener::prepare_for_stack_dismiss`](crate::DialogListener::prepare_for_stack_dismiss)
    ///
    /// For dialogs that cannot be listened to. Returns the surface the
    /// transition will now animate into.
    pub fn prepare_for_stack_dismiss(
        &self,
        tree: &mut SurfaceTree,
        id: TransitionId,
    ) -> Option<SurfaceId> {
        self.main_thread
            .assert_current("DialogLaunchAnimator::prepare_for_stack_dismiss");
        let transition = self.get(id)?;
        let trigger = transition.prepare_for_stack_dismiss(tree);
        transition.set_trigger(trigger);
        Some(trigger)
    }

    /// Dismiss the dialog of `id` as if its scrim was tapped
    ///
    /// Returns false if the transition is gone.
    pub fn dismiss_on_outside_tap(&self, tree: &mut SurfaceTree, id: TransitionId) -> bool {
        self.main_thread
            .assert_current("DialogLaunchAnimator::dismiss_on_outside_tap");
        let Some(transition) = self.get(id) else {
            return false;
        };
        transition.host().dismiss(tree);
        true
    }

    /// Register a callback run each time a transition is torn down
    pub fn on_transition_finished<F>(&self, callback: F)
    where
        F: Fn(TransitionId, ExitPath) + 'static,
    {
        self.registry.borrow_mut().observers.push(Rc::new(callback));
    }

    /// Number of live transitions
    pub fn transition_count(&self) -> usize {
        self.registry.borrow().transitions.len()
    }

    pub fn contains(&self, id: TransitionId) -> bool {
        self.registry.borrow().transitions.contains_key(id)
    }

    pub fn phase(&self, id: TransitionId) -> Option<TransitionPhase> {
        self.get(id).map(|transition| transition.phase())
    }

    /// Surface the transition currently animates from and into
    pub fn trigger(&self, id: TransitionId) -> Option<SurfaceId> {
        self.get(id).map(|transition| transition.trigger())
    }

    /// Dialog content surface carrying the window background
    pub fn content_with_background(&self, id: TransitionId) -> Option<SurfaceId> {
        self.get(id)?.content_with_background()
    }

    pub fn is_exit_animation_disabled(&self, id: TransitionId) -> Option<bool> {
        self.get(id).map(|transition| transition.is_exit_animation_disabled())
    }

    pub fn original_dialog(&self, id: TransitionId) -> Option<Rc<dyn Dialog>> {
        self.get(id).map(|transition| transition.original())
    }

    /// Whether `surface` is running a launch animation
    pub fn is_busy(&self, surface: SurfaceId) -> bool {
        self.registry.borrow().busy.contains(&surface)
    }

    fn get(&self, id: TransitionId) -> Option<Transition> {
        let transition = self.registry.borrow().transitions.get(id).cloned();
        transition
    }

    /// Transition showing the dialog that contains `surface`, with its
    /// background surface
    fn find_parent(
        &self,
        tree: &SurfaceTree,
        surface: SurfaceId,
    ) -> Option<(TransitionId, SurfaceId)> {
        let parent_surface = tree.parent(surface);
        let registry = self.registry.borrow();
        let found = registry.transitions.iter().find_map(|(id, transition)| {
            let content = transition.content_with_background()?;
            (content == surface || Some(content) == parent_surface).then_some((id, content))
        });
        found
    }
}
