//! Dialog collaborators
//!
//! [`Dialog`] is what the launch animator needs from an application dialog;
//! [`ListenableDialog`] lets the animator follow the dialog's lifecycle.
//! [`SurfaceDialog`] is a window-backed implementation of both.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blinc_core::{
    Background, Dimension, Gravity, LayoutParams, SurfaceId, SurfaceTree, Visibility,
};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a listener registered on a [`ListenableDialog`]
    pub struct DialogListenerId;
}

/// Size, placement and background of a dialog window
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowAttributes {
    pub width: Dimension,
    pub height: Dimension,
    pub gravity: Gravity,
    pub background: Option<Background>,
}

impl WindowAttributes {
    pub fn new(width: Dimension, height: Dimension, gravity: Gravity) -> Self {
        Self {
            width,
            height,
            gravity,
            background: None,
        }
    }

    /// Window matching the screen in both directions
    pub fn fullscreen() -> Self {
        Self::new(Dimension::MatchParent, Dimension::MatchParent, Gravity::Center)
    }

    /// Centered window of a fixed size
    pub fn fixed(width: f32, height: f32) -> Self {
        Self::new(Dimension::Fixed(width), Dimension::Fixed(height), Gravity::Center)
    }

    pub fn with_gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    pub fn is_fullscreen(&self) -> bool {
        self.width == Dimension::MatchParent && self.height == Dimension::MatchParent
    }

    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams::new(self.width, self.height, self.gravity)
    }
}

/// Why a dialog was dismissed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DismissReason {
    #[default]
    Unknown,
    /// The device was locked, which dismissed the dialog
    DeviceLocked,
}

/// A modal dialog backed by a window in the surface tree
pub trait Dialog {
    fn show(&self, tree: &mut SurfaceTree);
    fn hide(&self, tree: &mut SurfaceTree);
    fn dismiss(&self, tree: &mut SurfaceTree);
    fn is_showing(&self, tree: &SurfaceTree) -> bool;

    /// Surface the dialog content is attached to once shown
    fn content_root(&self) -> Option<SurfaceId>;

    fn window_root(&self) -> Option<SurfaceId>;

    fn window_attributes(&self) -> Option<WindowAttributes>;

    /// Lifecycle listeners, for dialogs that support them
    fn as_listenable(&self) -> Option<&dyn ListenableDialog> {
        None
    }
}

/// A dialog to/from which lifecycle listeners can be added/removed
pub trait ListenableDialog {
    fn add_listener(&self, listener: Rc<dyn DialogListener>) -> DialogListenerId;
    fn remove_listener(&self, id: DialogListenerId);
}

/// Lifecycle notifications of a [`ListenableDialog`]
pub trait DialogListener {
    fn on_dismiss(&self, tree: &mut SurfaceTree, reason: DismissReason);
    fn on_hide(&self, tree: &mut SurfaceTree);
    fn on_show(&self, tree: &mut SurfaceTree);
    /// The dialog size might have changed, for example after a configuration change
    fn on_size_changed(&self, tree: &mut SurfaceTree);
    /// A stack of dialogs is about to be dismissed from this one
    fn prepare_for_stack_dismiss(&self, tree: &mut SurfaceTree);
}

// =============================================================================
// SurfaceDialog
// =============================================================================

/// Listenable dialog showing one content surface in its own window
///
/// The content is attached to the content root the first time the dialog is
/// shown. Dismissing is final; a dismissed dialog ignores `show`.
pub struct SurfaceDialog {
    window: SurfaceId,
    content_root: SurfaceId,
    content: SurfaceId,
    content_installed: Cell<bool>,
    attributes: Cell<WindowAttributes>,
    showing: Cell<bool>,
    dismissed: Cell<bool>,
    listeners: RefCell<SlotMap<DialogListenerId, Rc<dyn DialogListener>>>,
}

impl SurfaceDialog {
    pub fn new(
        tree: &mut SurfaceTree,
        label: &str,
        content: SurfaceId,
        attributes: WindowAttributes,
    ) -> Rc<Self> {
        let window = tree.create_window(label, tree.screen());
        let frame = tree.create(format!("{}/frame", label));
        tree.set_layout_params(frame, attributes.layout_params());
        tree.set_background(frame, attributes.background);
        tree.add_child(window, frame);

        let content_root = tree.create(format!("{}/content", label));
        tree.set_layout_params(content_root, LayoutParams::match_parent());
        tree.add_child(frame, content_root);

        Rc::new(Self {
            window,
            content_root,
            content,
            content_installed: Cell::new(false),
            attributes: Cell::new(attributes),
            showing: Cell::new(false),
            dismissed: Cell::new(false),
            listeners: RefCell::new(SlotMap::with_key()),
        })
    }

    pub fn window(&self) -> SurfaceId {
        self.window
    }

    pub fn content(&self) -> SurfaceId {
        self.content
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Dismiss, telling listeners why
    pub fn dismiss_with_reason(&self, tree: &mut SurfaceTree, reason: DismissReason) {
        if self.dismissed.replace(true) {
            return;
        }
        for listener in self.listeners() {
            listener.on_dismiss(tree, reason);
        }
        self.showing.set(false);
        tree.detach_window(self.window);
    }

    /// Dismiss this dialog and every dialog it was launched from
    pub fn dismiss_stack(&self, tree: &mut SurfaceTree) {
        for listener in self.listeners() {
            listener.prepare_for_stack_dismiss(tree);
        }
        self.dismiss(tree);
    }

    /// Change the window size, e.g. after a configuration change
    pub fn set_window_size(&self, tree: &mut SurfaceTree, width: Dimension, height: Dimension) {
        let mut attributes = self.attributes.get();
        attributes.width = width;
        attributes.height = height;
        self.attributes.set(attributes);

        if let Some(frame) = tree.parent(self.content_root) {
            tree.set_layout_params(frame, attributes.layout_params());
        }
        for listener in self.listeners() {
            listener.on_size_changed(tree);
        }
    }

    /// Snapshot of the listeners, so callbacks may add or remove listeners
    fn listeners(&self) -> Vec<Rc<dyn DialogListener>> {
        self.listeners.borrow().values().cloned().collect()
    }
}

impl Dialog for SurfaceDialog {
    fn show(&self, tree: &mut SurfaceTree) {
        if self.dismissed.get() {
            return;
        }
        if !self.content_installed.replace(true) {
            tree.add_child(self.content_root, self.content);
        }
        tree.attach_window(self.window);
        tree.force_visibility(self.window, Visibility::Visible);
        self.showing.set(true);

        for listener in self.listeners() {
            listener.on_show(tree);
        }
    }

    fn hide(&self, tree: &mut SurfaceTree) {
        tree.force_visibility(self.window, Visibility::Gone);
        self.showing.set(false);

        for listener in self.listeners() {
            listener.on_hide(tree);
        }
    }

    fn dismiss(&self, tree: &mut SurfaceTree) {
        self.dismiss_with_reason(tree, DismissReason::Unknown);
    }

    fn is_showing(&self, _tree: &SurfaceTree) -> bool {
        self.showing.get()
    }

    fn content_root(&self) -> Option<SurfaceId> {
        Some(self.content_root)
    }

    fn window_root(&self) -> Option<SurfaceId> {
        Some(self.window)
    }

    fn window_attributes(&self) -> Option<WindowAttributes> {
        Some(self.attributes.get())
    }

    fn as_listenable(&self) -> Option<&dyn ListenableDialog> {
        Some(self)
    }
}

impl ListenableDialog for SurfaceDialog {
    fn add_listener(&self, listener: Rc<dyn DialogListener>) -> DialogListenerId {
        self.listeners.borrow_mut().insert(listener)
    }

    fn remove_listener(&self, id: DialogListenerId) {
        self.listeners.borrow_mut().remove(id);
    }
}
