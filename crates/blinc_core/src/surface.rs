//! Retained surface tree
//!
//! A small arena of rectangular surfaces grouped into windows. It is the part
//! of the view system the dialog launch machinery talks to:
//!
//! - **Hierarchy**: parent/child surfaces, window roots that can be attached
//!   (on screen) or detached
//! - **Visibility**: visible / invisible / gone, with an optional lock that
//!   rejects application-level changes while an animation owns the surface
//! - **Layout**: frame-layout style `LayoutParams` resolved against the parent
//! - **Frame hooks**: animation-frame callbacks, layout listeners, pre-draw
//!   listeners (which may cancel a window's draw) and one-shot after-draw
//!   callbacks
//! - **Ghosts**: a drawn duplicate of a surface placed in another host
//!
//! Everything runs on one thread. Callbacks receive `&mut SurfaceTree` and may
//! freely mutate it; hooks registered while a phase is dispatching run on the
//! next frame.
//!
//! # Frame phases
//!
//! [`SurfaceTree::frame`] runs, in order:
//!
//! 1. animation-frame callbacks (with the frame delta)
//! 2. layout of every dirty, attached surface, then layout listeners
//! 3. pre-draw listeners for attached windows
//! 4. draw of every attached, visible window nobody cancelled
//! 5. after-draw callbacks for surfaces whose window just drew

use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::geometry::{Color, CornerRadius, Rect, Size};

new_key_type! {
    /// Handle to a surface in a [`SurfaceTree`]
    pub struct SurfaceId;
    /// Handle to a registered layout listener
    pub struct LayoutListenerId;
    /// Handle to a registered pre-draw listener
    pub struct PreDrawListenerId;
}

/// Handle to a pending after-draw callback
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DrawCallbackId(u64);

// =============================================================================
// Surface properties
// =============================================================================

/// Visibility of a single surface
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Drawn (if every ancestor is drawn too)
    #[default]
    Visible,
    /// Not drawn, but still takes part in layout
    Invisible,
    /// Not drawn and not laid out
    Gone,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

/// One axis of a layout request
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dimension {
    /// Fill the parent
    MatchParent,
    /// Size to the measured content
    WrapContent,
    /// Exact size in pixels
    Fixed(f32),
}

impl Dimension {
    fn resolve(self, available: f32, measured: f32) -> f32 {
        match self {
            Dimension::MatchParent => available,
            Dimension::WrapContent => measured.min(available),
            Dimension::Fixed(value) => value,
        }
    }
}

/// Vertical placement inside the parent; children are always centered horizontally
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Gravity {
    #[default]
    Center,
    Top,
    Bottom,
}

/// Frame-layout parameters of a surface inside its parent
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    pub width: Dimension,
    pub height: Dimension,
    pub gravity: Gravity,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self::match_parent()
    }
}

impl LayoutParams {
    pub fn new(width: Dimension, height: Dimension, gravity: Gravity) -> Self {
        Self {
            width,
            height,
            gravity,
        }
    }

    /// Fill the parent in both directions
    pub fn match_parent() -> Self {
        Self::new(Dimension::MatchParent, Dimension::MatchParent, Gravity::Center)
    }

    /// Fixed size, centered
    pub fn fixed(width: f32, height: f32) -> Self {
        Self::new(Dimension::Fixed(width), Dimension::Fixed(height), Gravity::Center)
    }

    pub fn with_gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }

    /// Whether both axes fill the parent
    pub fn is_match_parent(&self) -> bool {
        self.width == Dimension::MatchParent && self.height == Dimension::MatchParent
    }

    /// Resolve the bounds of a child laid out in `parent`
    pub fn resolve(&self, parent: Rect, measured: Size) -> Rect {
        let width = self.width.resolve(parent.width(), measured.width);
        let height = self.height.resolve(parent.height(), measured.height);
        let x = parent.x() + (parent.width() - width) / 2.0;
        let y = match self.gravity {
            Gravity::Center => parent.y() + (parent.height() - height) / 2.0,
            Gravity::Top => parent.y(),
            Gravity::Bottom => parent.bottom() - height,
        };
        Rect::new(x, y, width, height)
    }
}

/// Solid background with rounded corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Background {
    pub color: Color,
    pub corner_radius: CornerRadius,
}

impl Background {
    pub fn new(color: Color, corner_radius: impl Into<CornerRadius>) -> Self {
        Self {
            color,
            corner_radius: corner_radius.into(),
        }
    }
}

/// Bounds of a surface before and after a layout pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutChange {
    pub surface: SurfaceId,
    pub old: Rect,
    pub new: Rect,
}

impl LayoutChange {
    pub fn is_resize_or_move(&self) -> bool {
        self.old != self.new
    }
}

/// Result of a pre-draw listener
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreDraw {
    /// Let the window draw and keep listening
    Proceed,
    /// Let the window draw, then unregister
    ProceedOnce,
    /// Skip this window's draw and keep listening
    Cancel,
    /// Skip this window's draw, then unregister
    CancelOnce,
}

impl PreDraw {
    pub fn allows_draw(self) -> bool {
        matches!(self, PreDraw::Proceed | PreDraw::ProceedOnce)
    }

    pub fn keeps_listening(self) -> bool {
        matches!(self, PreDraw::Proceed | PreDraw::Cancel)
    }
}

/// Whether a persistent listener stays registered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerControl {
    Keep,
    Remove,
}

type LayoutCallback = Box<dyn FnMut(&mut SurfaceTree, &LayoutChange) -> ListenerControl>;
type PreDrawCallback = Box<dyn FnMut(&mut SurfaceTree) -> PreDraw>;
type DrawCallback = Box<dyn FnOnce(&mut SurfaceTree)>;
type FrameCallback = Box<dyn FnOnce(&mut SurfaceTree, f32)>;

struct LayoutListener {
    surface: SurfaceId,
    /// Taken out while the callback runs
    callback: Option<LayoutCallback>,
}

struct PreDrawListener {
    surface: SurfaceId,
    callback: Option<PreDrawCallback>,
}

#[derive(Clone, Copy, Debug, Default)]
struct WindowState {
    attached: bool,
    draw_count: u64,
}

struct SurfaceNode {
    label: String,
    parent: Option<SurfaceId>,
    children: SmallVec<[SurfaceId; 4]>,
    visibility: Visibility,
    visibility_locked: bool,
    alpha: f32,
    bounds: Rect,
    layout: Option<LayoutParams>,
    content_size: Size,
    background: Option<Background>,
    window: Option<WindowState>,
    /// Ghost currently drawing this surface elsewhere
    ghost: Option<SurfaceId>,
    /// Surface this ghost draws
    ghost_of: Option<SurfaceId>,
    needs_layout: bool,
}

impl SurfaceNode {
    fn new(label: String) -> Self {
        Self {
            label,
            parent: None,
            children: SmallVec::new(),
            visibility: Visibility::Visible,
            visibility_locked: false,
            alpha: 1.0,
            bounds: Rect::ZERO,
            layout: None,
            content_size: Size::ZERO,
            background: None,
            window: None,
            ghost: None,
            ghost_of: None,
            needs_layout: true,
        }
    }
}

// =============================================================================
// SurfaceTree
// =============================================================================

/// Arena of surfaces and the per-frame hooks attached to them
pub struct SurfaceTree {
    nodes: SlotMap<SurfaceId, SurfaceNode>,
    screen: Rect,
    layout_listeners: SlotMap<LayoutListenerId, LayoutListener>,
    pre_draw_listeners: SlotMap<PreDrawListenerId, PreDrawListener>,
    draw_callbacks: Vec<(DrawCallbackId, SurfaceId, DrawCallback)>,
    next_draw_callback: u64,
    frame_callbacks: Vec<FrameCallback>,
    frame_count: u64,
}

impl SurfaceTree {
    /// Create an empty tree for a screen of the given size
    pub fn new(screen: Size) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            screen: Rect::new(0.0, 0.0, screen.width, screen.height),
            layout_listeners: SlotMap::with_key(),
            pre_draw_listeners: SlotMap::with_key(),
            draw_callbacks: Vec::new(),
            next_draw_callback: 0,
            frame_callbacks: Vec::new(),
            frame_count: 0,
        }
    }

    /// Full screen bounds
    pub fn screen(&self) -> Rect {
        self.screen
    }

    /// Number of frames run so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Create a detached surface
    pub fn create(&mut self, label: impl Into<String>) -> SurfaceId {
        self.nodes.insert(SurfaceNode::new(label.into()))
    }

    /// Create a window root with fixed bounds; it starts detached
    pub fn create_window(&mut self, label: impl Into<String>, bounds: Rect) -> SurfaceId {
        let mut node = SurfaceNode::new(label.into());
        node.bounds = bounds;
        node.window = Some(WindowState::default());
        self.nodes.insert(node)
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Debug label of a surface
    pub fn label(&self, id: SurfaceId) -> Option<&str> {
        self.nodes.get(id).map(|node| node.label.as_str())
    }

    /// Put a window on screen
    pub fn attach_window(&mut self, window: SurfaceId) {
        if let Some(state) = self.nodes.get_mut(window).and_then(|n| n.window.as_mut()) {
            state.attached = true;
            self.request_layout(window);
        }
    }

    /// Take a window off screen; its surfaces stay alive
    pub fn detach_window(&mut self, window: SurfaceId) {
        if let Some(state) = self.nodes.get_mut(window).and_then(|n| n.window.as_mut()) {
            state.attached = false;
        }
    }

    /// Set the bounds of a window root
    pub fn set_window_bounds(&mut self, window: SurfaceId, bounds: Rect) {
        if let Some(node) = self.nodes.get_mut(window).filter(|n| n.window.is_some()) {
            node.bounds = bounds;
            node.needs_layout = true;
        }
    }

    /// How many times a window has drawn
    pub fn draw_count(&self, window: SurfaceId) -> u64 {
        self.nodes
            .get(window)
            .and_then(|n| n.window)
            .map_or(0, |state| state.draw_count)
    }

    /// Add `child` as the last child of `parent`, moving it out of its old parent
    pub fn add_child(&mut self, parent: SurfaceId, child: SurfaceId) {
        if parent == child || !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        self.remove_from_parent(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
            node.needs_layout = true;
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Detach a surface from its parent (it keeps its own subtree)
    pub fn remove_from_parent(&mut self, child: SurfaceId) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|c| *c != child);
        }
    }

    /// Remove every child of a surface from it
    pub fn remove_all_children(&mut self, parent: SurfaceId) {
        let children: SmallVec<[SurfaceId; 4]> = match self.nodes.get(parent) {
            Some(node) => node.children.clone(),
            None => return,
        };
        for child in children {
            self.remove_from_parent(child);
        }
    }

    pub fn parent(&self, id: SurfaceId) -> Option<SurfaceId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: SurfaceId) -> &[SurfaceId] {
        match self.nodes.get(id) {
            Some(node) => node.children.as_slice(),
            None => &[],
        }
    }

    pub fn child_count(&self, id: SurfaceId) -> usize {
        self.children(id).len()
    }

    pub fn child_at(&self, id: SurfaceId, index: usize) -> Option<SurfaceId> {
        self.children(id).get(index).copied()
    }

    /// Destroy a surface and its subtree
    ///
    /// Listeners and pending after-draw callbacks targeting destroyed
    /// surfaces are dropped without being invoked. Ghosts of destroyed
    /// surfaces are destroyed too.
    pub fn destroy(&mut self, id: SurfaceId) {
        if !self.nodes.contains_key(id) {
            return;
        }

        let mut doomed = FxHashSet::default();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !doomed.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().copied());
                stack.extend(node.ghost);
            }
        }

        for surface in &doomed {
            self.remove_from_parent(*surface);
        }
        for surface in &doomed {
            let Some(node) = self.nodes.remove(*surface) else {
                continue;
            };
            if let Some(target) = node.ghost_of.filter(|t| !doomed.contains(t)) {
                if let Some(target) = self.nodes.get_mut(target) {
                    target.ghost = None;
                }
            }
        }

        self.layout_listeners
            .retain(|_, listener| !doomed.contains(&listener.surface));
        self.pre_draw_listeners
            .retain(|_, listener| !doomed.contains(&listener.surface));
        self.draw_callbacks
            .retain(|(_, surface, _)| !doomed.contains(surface));
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    pub fn visibility(&self, id: SurfaceId) -> Visibility {
        self.nodes.get(id).map_or(Visibility::Gone, |n| n.visibility)
    }

    /// Application-level visibility change; rejected while the surface is locked
    pub fn set_visibility(&mut self, id: SurfaceId, visibility: Visibility) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        if node.visibility_locked {
            tracing::trace!(
                "set_visibility({:?}) on locked surface '{}' ignored",
                visibility,
                node.label
            );
            return false;
        }
        node.visibility = visibility;
        true
    }

    /// Visibility change that bypasses the lock
    pub fn force_visibility(&mut self, id: SurfaceId, visibility: Visibility) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.visibility = visibility;
        }
    }

    /// Lock or unlock application-level visibility changes
    pub fn set_visibility_locked(&mut self, id: SurfaceId, locked: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.visibility_locked = locked;
        }
    }

    pub fn is_visibility_locked(&self, id: SurfaceId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.visibility_locked)
    }

    /// Window root of the tree a surface belongs to
    pub fn window_of(&self, id: SurfaceId) -> Option<SurfaceId> {
        let mut current = id;
        loop {
            let node = self.nodes.get(current)?;
            match node.parent {
                Some(parent) => current = parent,
                None => return node.window.map(|_| current),
            }
        }
    }

    /// Whether a surface belongs to an attached window
    pub fn is_attached(&self, id: SurfaceId) -> bool {
        self.window_of(id)
            .and_then(|window| self.nodes.get(window))
            .and_then(|node| node.window)
            .is_some_and(|state| state.attached)
    }

    /// Whether the next frame draws the window a surface belongs to
    pub fn is_drawable(&self, id: SurfaceId) -> bool {
        self.window_of(id)
            .and_then(|window| self.nodes.get(window))
            .is_some_and(|node| {
                node.visibility.is_visible() && node.window.is_some_and(|state| state.attached)
            })
    }

    /// Whether a surface and all of its ancestors are visible in an attached window
    pub fn is_shown(&self, id: SurfaceId) -> bool {
        if !self.is_attached(id) {
            return false;
        }
        let mut current = Some(id);
        while let Some(surface) = current {
            let Some(node) = self.nodes.get(surface) else {
                return false;
            };
            if !node.visibility.is_visible() {
                return false;
            }
            current = node.parent;
        }
        true
    }

    // =========================================================================
    // Geometry & appearance
    // =========================================================================

    /// Bounds in screen coordinates
    pub fn bounds(&self, id: SurfaceId) -> Rect {
        self.nodes.get(id).map_or(Rect::ZERO, |n| n.bounds)
    }

    /// Move a surface directly, without a layout pass
    pub fn set_bounds(&mut self, id: SurfaceId, bounds: Rect) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.bounds = bounds;
        }
    }

    pub fn layout_params(&self, id: SurfaceId) -> Option<LayoutParams> {
        self.nodes.get(id).and_then(|n| n.layout)
    }

    pub fn set_layout_params(&mut self, id: SurfaceId, params: LayoutParams) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.layout = Some(params);
            node.needs_layout = true;
        }
    }

    pub fn content_size(&self, id: SurfaceId) -> Size {
        self.nodes.get(id).map_or(Size::ZERO, |n| n.content_size)
    }

    /// Change the intrinsic size of a surface; ancestors are laid out again
    pub fn set_content_size(&mut self, id: SurfaceId, size: Size) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.content_size = size;
        }
        self.request_layout(id);
    }

    /// Mark a surface and its ancestors for layout on the next frame
    pub fn request_layout(&mut self, id: SurfaceId) {
        let mut current = Some(id);
        while let Some(surface) = current {
            let Some(node) = self.nodes.get_mut(surface) else {
                return;
            };
            node.needs_layout = true;
            current = node.parent;
        }
    }

    pub fn alpha(&self, id: SurfaceId) -> f32 {
        self.nodes.get(id).map_or(0.0, |n| n.alpha)
    }

    pub fn set_alpha(&mut self, id: SurfaceId, alpha: f32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.alpha = alpha.clamp(0.0, 1.0);
        }
    }

    pub fn background(&self, id: SurfaceId) -> Option<Background> {
        self.nodes.get(id).and_then(|n| n.background)
    }

    pub fn set_background(&mut self, id: SurfaceId, background: Option<Background>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.background = background;
        }
    }

    /// Depth-first search for the first surface (including `id`) with a background
    pub fn find_first_with_background(&self, id: SurfaceId) -> Option<SurfaceId> {
        let node = self.nodes.get(id)?;
        if node.background.is_some() {
            return Some(id);
        }
        node.children
            .iter()
            .find_map(|child| self.find_first_with_background(*child))
    }

    // =========================================================================
    // Ghosts
    // =========================================================================

    /// Draw `view` inside `host` without reparenting it
    ///
    /// Creating a ghost hides the original surface (it is drawn by the ghost
    /// from now on). Adding a ghost to an already ghosted surface returns the
    /// existing ghost.
    pub fn add_ghost(&mut self, view: SurfaceId, host: SurfaceId) -> Option<SurfaceId> {
        if !self.nodes.contains_key(host) {
            return None;
        }
        let node = self.nodes.get(view)?;
        if let Some(existing) = node.ghost {
            self.force_visibility(view, Visibility::Invisible);
            return Some(existing);
        }

        let mut ghost = SurfaceNode::new(format!("ghost({})", node.label));
        ghost.bounds = node.bounds;
        ghost.background = node.background;
        ghost.ghost_of = Some(view);
        let ghost = self.nodes.insert(ghost);

        self.add_child(host, ghost);
        if let Some(node) = self.nodes.get_mut(view) {
            node.ghost = Some(ghost);
            node.visibility = Visibility::Invisible;
        }
        Some(ghost)
    }

    /// Destroy the ghost of `view` and make `view` visible again
    pub fn remove_ghost(&mut self, view: SurfaceId) {
        let Some(ghost) = self.nodes.get_mut(view).and_then(|n| n.ghost.take()) else {
            return;
        };
        self.destroy(ghost);
        self.force_visibility(view, Visibility::Visible);
    }

    /// Ghost currently drawing `view`
    pub fn ghost(&self, view: SurfaceId) -> Option<SurfaceId> {
        self.nodes.get(view).and_then(|n| n.ghost)
    }

    /// Surface drawn by a ghost
    pub fn ghosted_surface(&self, ghost: SurfaceId) -> Option<SurfaceId> {
        self.nodes.get(ghost).and_then(|n| n.ghost_of)
    }

    // =========================================================================
    // Frame hooks
    // =========================================================================

    /// Run `callback` after every layout pass of `surface`
    pub fn add_layout_listener<F>(&mut self, surface: SurfaceId, callback: F) -> LayoutListenerId
    where
        F: FnMut(&mut SurfaceTree, &LayoutChange) -> ListenerControl + 'static,
    {
        self.layout_listeners.insert(LayoutListener {
            surface,
            callback: Some(Box::new(callback)),
        })
    }

    pub fn remove_layout_listener(&mut self, id: LayoutListenerId) {
        self.layout_listeners.remove(id);
    }

    /// Run `callback` right before the window of `surface` draws
    pub fn add_pre_draw_listener<F>(&mut self, surface: SurfaceId, callback: F) -> PreDrawListenerId
    where
        F: FnMut(&mut SurfaceTree) -> PreDraw + 'static,
    {
        self.pre_draw_listeners.insert(PreDrawListener {
            surface,
            callback: Some(Box::new(callback)),
        })
    }

    pub fn remove_pre_draw_listener(&mut self, id: PreDrawListenerId) {
        self.pre_draw_listeners.remove(id);
    }

    /// Run `callback` once, after the next draw of the window containing `surface`
    ///
    /// The callback is dropped without running if `surface` is destroyed first.
    /// It stays pending for as long as that window does not draw.
    pub fn when_next_drawn<F>(&mut self, surface: SurfaceId, callback: F) -> DrawCallbackId
    where
        F: FnOnce(&mut SurfaceTree) + 'static,
    {
        let id = DrawCallbackId(self.next_draw_callback);
        self.next_draw_callback += 1;
        if self.nodes.contains_key(surface) {
            self.draw_callbacks.push((id, surface, Box::new(callback)));
        }
        id
    }

    /// Drop a pending after-draw callback, returns whether it was still pending
    pub fn cancel_draw_callback(&mut self, id: DrawCallbackId) -> bool {
        let before = self.draw_callbacks.len();
        self.draw_callbacks.retain(|(pending, _, _)| *pending != id);
        self.draw_callbacks.len() != before
    }

    /// Run `callback` at the start of the next frame with the frame delta in ms
    pub fn request_animation_frame<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut SurfaceTree, f32) + 'static,
    {
        self.frame_callbacks.push(Box::new(callback));
    }

    pub fn has_pending_animation_frames(&self) -> bool {
        !self.frame_callbacks.is_empty()
    }

    /// Number of after-draw callbacks still waiting
    pub fn pending_draw_callbacks(&self) -> usize {
        self.draw_callbacks.len()
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Run one frame: animation, layout, pre-draw, draw, after-draw
    pub fn frame(&mut self, dt_ms: f32) {
        self.frame_count += 1;

        let callbacks = std::mem::take(&mut self.frame_callbacks);
        for callback in callbacks {
            callback(self, dt_ms);
        }

        let changes = self.run_layout_pass();
        self.dispatch_layout_changes(&changes);

        let cancelled = self.run_pre_draw();
        let drawn = self.draw_windows(&cancelled);
        self.run_after_draw(&drawn);
    }

    fn depth(&self, id: SurfaceId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    fn measure(&self, id: SurfaceId) -> Size {
        let Some(node) = self.nodes.get(id) else {
            return Size::ZERO;
        };
        node.children.iter().fold(node.content_size, |acc, child| {
            let Some(child_node) = self.nodes.get(*child) else {
                return acc;
            };
            if child_node.visibility == Visibility::Gone || child_node.ghost_of.is_some() {
                return acc;
            }
            let measured = self.measure(*child);
            let (width, height) = match child_node.layout {
                Some(params) => (
                    match params.width {
                        Dimension::Fixed(value) => value,
                        _ => measured.width,
                    },
                    match params.height {
                        Dimension::Fixed(value) => value,
                        _ => measured.height,
                    },
                ),
                None => (measured.width, measured.height),
            };
            acc.max(Size::new(width, height))
        })
    }

    fn run_layout_pass(&mut self) -> Vec<LayoutChange> {
        let mut dirty: Vec<SurfaceId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.needs_layout)
            .map(|(id, _)| id)
            .filter(|id| self.is_attached(*id))
            .collect();
        dirty.sort_by_key(|id| self.depth(*id));

        let mut visited = FxHashSet::default();
        let mut changes = Vec::new();
        for id in dirty {
            self.layout_subtree(id, &mut visited, &mut changes);
        }
        changes
    }

    fn layout_subtree(
        &mut self,
        id: SurfaceId,
        visited: &mut FxHashSet<SurfaceId>,
        changes: &mut Vec<LayoutChange>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let parent_bounds = self.parent(id).map(|parent| self.bounds(parent));
        let measured = self.measure(id);
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };

        let old = node.bounds;
        let new = match (node.layout, parent_bounds) {
            (Some(params), Some(parent)) if node.visibility != Visibility::Gone => {
                params.resolve(parent, measured)
            }
            _ => old,
        };
        node.bounds = new;
        node.needs_layout = false;
        changes.push(LayoutChange {
            surface: id,
            old,
            new,
        });

        let children = node.children.clone();
        for child in children {
            let follows_parent = self
                .nodes
                .get(child)
                .is_some_and(|c| c.layout.is_some() || c.needs_layout);
            if follows_parent {
                self.layout_subtree(child, visited, changes);
            }
        }
    }

    fn dispatch_layout_changes(&mut self, changes: &[LayoutChange]) {
        for change in changes {
            let ids: Vec<LayoutListenerId> = self
                .layout_listeners
                .iter()
                .filter(|(_, listener)| listener.surface == change.surface)
                .map(|(id, _)| id)
                .collect();

            for id in ids {
                let Some(mut callback) = self
                    .layout_listeners
                    .get_mut(id)
                    .and_then(|listener| listener.callback.take())
                else {
                    continue;
                };
                let control = callback(self, change);
                match control {
                    ListenerControl::Keep => {
                        if let Some(listener) = self.layout_listeners.get_mut(id) {
                            listener.callback = Some(callback);
                        }
                    }
                    ListenerControl::Remove => {
                        self.layout_listeners.remove(id);
                    }
                }
            }
        }
    }

    /// Returns the windows whose draw was cancelled
    fn run_pre_draw(&mut self) -> FxHashSet<SurfaceId> {
        let ids: Vec<PreDrawListenerId> = self.pre_draw_listeners.keys().collect();
        let mut cancelled = FxHashSet::default();

        for id in ids {
            let Some(surface) = self.pre_draw_listeners.get(id).map(|l| l.surface) else {
                continue;
            };
            let Some(window) = self.window_of(surface).filter(|w| self.is_attached(*w)) else {
                continue;
            };
            let Some(mut callback) = self
                .pre_draw_listeners
                .get_mut(id)
                .and_then(|listener| listener.callback.take())
            else {
                continue;
            };

            let action = callback(self);
            if !action.allows_draw() {
                cancelled.insert(window);
            }
            if action.keeps_listening() {
                if let Some(listener) = self.pre_draw_listeners.get_mut(id) {
                    listener.callback = Some(callback);
                }
            } else {
                self.pre_draw_listeners.remove(id);
            }
        }
        cancelled
    }

    fn draw_windows(&mut self, cancelled: &FxHashSet<SurfaceId>) -> FxHashSet<SurfaceId> {
        let mut drawn = FxHashSet::default();
        for (id, node) in self.nodes.iter_mut() {
            let Some(state) = node.window.as_mut() else {
                continue;
            };
            if !state.attached || !node.visibility.is_visible() || cancelled.contains(&id) {
                continue;
            }
            state.draw_count += 1;
            drawn.insert(id);
        }
        drawn
    }

    fn run_after_draw(&mut self, drawn: &FxHashSet<SurfaceId>) {
        let pending = std::mem::take(&mut self.draw_callbacks);
        let mut ready = Vec::new();
        for (id, surface, callback) in pending {
            match self.window_of(surface) {
                Some(window) if drawn.contains(&window) => ready.push(callback),
                _ => self.draw_callbacks.push((id, surface, callback)),
            }
        }
        for callback in ready {
            callback(self);
        }
    }
}
