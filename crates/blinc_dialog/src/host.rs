//! Host dialogs
//!
//! The launch animator shows stolen dialog content in a transient fullscreen
//! host dialog. A [`HostProvider`] creates hosts that:
//!
//! 1. run the `on_created` callback once, the first time they are shown
//! 2. route every dismiss request through the `dismiss_override`, which
//!    decides when the [`ActualDismiss`] really runs
//! 3. are fullscreen

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use blinc_core::{LayoutParams, SurfaceId, SurfaceTree, Visibility};

use crate::dialog::{Dialog, WindowAttributes};

/// Called once when the host is created
pub type OnHostCreated = Box<dyn FnOnce(&mut SurfaceTree)>;

/// Performs the real dismissal of a host
pub type ActualDismiss = Box<dyn FnOnce(&mut SurfaceTree)>;

/// Receives every dismiss request of a host
pub type DismissOverride = Rc<dyn Fn(&mut SurfaceTree, ActualDismiss)>;

/// Creates the host dialogs launch animations run in
pub trait HostProvider {
    fn create_host(
        &self,
        tree: &mut SurfaceTree,
        theme: &str,
        on_created: OnHostCreated,
        dismiss_override: DismissOverride,
    ) -> Rc<dyn HostDialog>;
}

/// Fullscreen dialog hosting stolen content
pub trait HostDialog: Dialog {
    /// Replace the content of the host window
    fn set_content_view(&self, tree: &mut SurfaceTree, root: SurfaceId);

    fn set_dim_behind(&self, dim: bool);

    fn is_dimming_behind(&self) -> bool;

    fn theme(&self) -> &str;
}

/// Provider of [`SurfaceHostDialog`]s
#[derive(Debug, Default)]
pub struct FullscreenHostProvider {
    created: Cell<usize>,
}

impl FullscreenHostProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hosts created so far
    pub fn hosts_created(&self) -> usize {
        self.created.get()
    }
}

impl HostProvider for FullscreenHostProvider {
    fn create_host(
        &self,
        tree: &mut SurfaceTree,
        theme: &str,
        on_created: OnHostCreated,
        dismiss_override: DismissOverride,
    ) -> Rc<dyn HostDialog> {
        self.created.set(self.created.get() + 1);
        SurfaceHostDialog::new(tree, theme, on_created, dismiss_override)
    }
}

/// Host dialog owning a fullscreen window
pub struct SurfaceHostDialog {
    weak_self: Weak<SurfaceHostDialog>,
    theme: String,
    window: SurfaceId,
    content: Cell<Option<SurfaceId>>,
    on_created: RefCell<Option<OnHostCreated>>,
    dismiss_override: DismissOverride,
    showing: Cell<bool>,
    dismissed: Cell<bool>,
    dim_behind: Cell<bool>,
}

impl SurfaceHostDialog {
    pub fn new(
        tree: &mut SurfaceTree,
        theme: &str,
        on_created: OnHostCreated,
        dismiss_override: DismissOverride,
    ) -> Rc<Self> {
        let window = tree.create_window(format!("host[{}]", theme), tree.screen());
        Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            theme: theme.to_string(),
            window,
            content: Cell::new(None),
            on_created: RefCell::new(Some(on_created)),
            dismiss_override,
            showing: Cell::new(false),
            dismissed: Cell::new(false),
            dim_behind: Cell::new(true),
        })
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed.get()
    }

    fn finish_dismiss(&self, tree: &mut SurfaceTree) {
        if self.dismissed.replace(true) {
            return;
        }
        self.showing.set(false);
        tree.detach_window(self.window);
        tracing::trace!("host dialog '{}' dismissed", self.theme);
    }
}

impl Dialog for SurfaceHostDialog {
    fn show(&self, tree: &mut SurfaceTree) {
        if self.dismissed.get() {
            return;
        }
        let on_created = self.on_created.borrow_mut().take();
        if let Some(on_created) = on_created {
            on_created(tree);
        }
        tree.attach_window(self.window);
        tree.force_visibility(self.window, Visibility::Visible);
        self.showing.set(true);
    }

    fn hide(&self, tree: &mut SurfaceTree) {
        tree.force_visibility(self.window, Visibility::Gone);
        self.showing.set(false);
    }

    fn dismiss(&self, tree: &mut SurfaceTree) {
        if self.dismissed.get() {
            return;
        }
        let weak = self.weak_self.clone();
        let actual: ActualDismiss = Box::new(move |tree: &mut SurfaceTree| {
            if let Some(host) = weak.upgrade() {
                host.finish_dismiss(tree);
            }
        });
        (self.dismiss_override)(tree, actual);
    }

    fn is_showing(&self, _tree: &SurfaceTree) -> bool {
        self.showing.get()
    }

    fn content_root(&self) -> Option<SurfaceId> {
        self.content.get()
    }

    fn window_root(&self) -> Option<SurfaceId> {
        Some(self.window)
    }

    fn window_attributes(&self) -> Option<WindowAttributes> {
        Some(WindowAttributes::fullscreen())
    }
}

impl HostDialog for SurfaceHostDialog {
    fn set_content_view(&self, tree: &mut SurfaceTree, root: SurfaceId) {
        tree.remove_all_children(self.window);
        tree.set_layout_params(root, LayoutParams::match_parent());
        tree.add_child(self.window, root);
        self.content.set(Some(root));
    }

    fn set_dim_behind(&self, dim: bool) {
        self.dim_behind.set(dim);
    }

    fn is_dimming_behind(&self) -> bool {
        self.dim_behind.get()
    }

    fn theme(&self) -> &str {
        &self.theme
    }
}
