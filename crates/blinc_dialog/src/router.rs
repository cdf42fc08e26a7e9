//! Lifecycle routing from the original dialog to its host
//!
//! Once its content is stolen the original dialog is an invisible shell, but
//! callers keep driving it (`dismiss`, `hide`, `show`). The router mirrors
//! those calls onto the host dialog that actually shows the content.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use blinc_core::SurfaceTree;

use crate::dialog::{Dialog, DialogListener, DialogListenerId, DismissReason};
use crate::transition::{Transition, WeakTransition};

pub(crate) struct LifecycleRouter {
    transition: WeakTransition,
    dialog: Weak<dyn Dialog>,
    id: Cell<Option<DialogListenerId>>,
}

impl LifecycleRouter {
    /// Route the lifecycle of `dialog` to the host of `transition`
    ///
    /// Returns false when the dialog cannot be listened to; its host then has
    /// to be driven directly.
    pub(crate) fn register(transition: &Transition, dialog: &Rc<dyn Dialog>) -> bool {
        let Some(listenable) = dialog.as_listenable() else {
            tracing::debug!("dialog is not listenable, lifecycle will not be routed");
            return false;
        };
        let router = Rc::new(LifecycleRouter {
            transition: transition.downgrade(),
            dialog: Rc::downgrade(dialog),
            id: Cell::new(None),
        });
        let id = listenable.add_listener(router.clone());
        router.id.set(Some(id));
        true
    }

    fn unregister(&self) {
        let (Some(id), Some(dialog)) = (self.id.take(), self.dialog.upgrade()) else {
            return;
        };
        if let Some(listenable) = dialog.as_listenable() {
            listenable.remove_listener(id);
        }
    }
}

impl DialogListener for LifecycleRouter {
    fn on_dismiss(&self, tree: &mut SurfaceTree, reason: DismissReason) {
        self.unregister();
        let Some(transition) = self.transition.upgrade() else {
            return;
        };

        // Animating into a locked screen is wasted work
        if reason == DismissReason::DeviceLocked {
            transition.disable_exit_animation();
        }
        transition.host().dismiss(tree);
    }

    fn on_hide(&self, tree: &mut SurfaceTree) {
        let Some(transition) = self.transition.upgrade() else {
            return;
        };
        if transition.absorb_hide() {
            tracing::trace!("ignoring hide caused by the launch animator");
            return;
        }
        transition.host().hide(tree);
    }

    fn on_show(&self, tree: &mut SurfaceTree) {
        let Some(transition) = self.transition.upgrade() else {
            return;
        };
        transition.host().show(tree);

        // The original must stay hidden; its hide is our own doing
        transition.arm_hide();
        if let Some(dialog) = self.dialog.upgrade() {
            dialog.hide(tree);
        }
    }

    fn on_size_changed(&self, tree: &mut SurfaceTree) {
        if let Some(transition) = self.transition.upgrade() {
            transition.on_original_dialog_size_changed(tree);
        }
    }

    fn prepare_for_stack_dismiss(&self, tree: &mut SurfaceTree) {
        if let Some(transition) = self.transition.upgrade() {
            let trigger = transition.prepare_for_stack_dismiss(tree);
            transition.set_trigger(trigger);
        }
    }
}
