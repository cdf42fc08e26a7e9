//! Ghost coordination
//!
//! Wraps the surface tree's ghosting primitive. Creating a ghost hides the
//! ghosted surface immediately, which would leave a frame where neither the
//! surface nor its ghost has pixels. The helpers here keep the original
//! visible until the ghost has actually been drawn.

use std::cell::RefCell;
use std::rc::Rc;

use blinc_core::{DrawCallbackId, SurfaceId, SurfaceTree, Visibility};

/// Ghost `surface` into `host` and keep `surface` itself visible
pub fn add_ghost(tree: &mut SurfaceTree, surface: SurfaceId, host: SurfaceId) -> Option<SurfaceId> {
    let ghost = tree.add_ghost(surface, host)?;
    tree.force_visibility(surface, Visibility::Visible);
    Some(ghost)
}

/// Destroy the ghost of `surface`, restoring its visibility
pub fn remove_ghost(tree: &mut SurfaceTree, surface: SurfaceId) {
    tree.remove_ghost(surface);
}

/// Run `callback` once after the next draw of `surface`
///
/// Dropped without running if the surface is destroyed first.
pub fn when_next_drawn<F>(tree: &mut SurfaceTree, surface: SurfaceId, callback: F)
where
    F: FnOnce(&mut SurfaceTree) + 'static,
{
    tree.when_next_drawn(surface, callback);
}

/// Run `callback` once after the next draw of `surface`, or as soon as a frame
/// starts in which its window will not draw
///
/// Unlike [`when_next_drawn`] this never strands the callback on a surface
/// that was detached, destroyed or hidden with its window.
pub fn when_drawn_or_detached<F>(tree: &mut SurfaceTree, surface: SurfaceId, callback: F)
where
    F: FnOnce(&mut SurfaceTree) + 'static,
{
    let pending = Rc::new(RefCell::new(Some(callback)));
    let on_draw = Rc::clone(&pending);
    let id = tree.when_next_drawn(surface, move |tree| {
        let callback = on_draw.borrow_mut().take();
        if let Some(callback) = callback {
            callback(tree);
        }
    });

    fn poll<F>(
        tree: &mut SurfaceTree,
        surface: SurfaceId,
        id: DrawCallbackId,
        pending: Rc<RefCell<Option<F>>>,
    ) where
        F: FnOnce(&mut SurfaceTree) + 'static,
    {
        if pending.borrow().is_none() {
            return;
        }
        if tree.is_drawable(surface) {
            tree.request_animation_frame(move |tree, _| poll(tree, surface, id, pending));
            return;
        }
        tree.cancel_draw_callback(id);
        let callback = pending.borrow_mut().take();
        if let Some(callback) = callback {
            tracing::debug!("surface {:?} will not draw, running its after-draw callback now", surface);
            callback(tree);
        }
    }

    tree.request_animation_frame(move |tree, _| poll(tree, surface, id, pending));
}

/// Hand the pixels of `surface` over to a ghost in `host`
///
/// 1. a ghost is added while `surface` stays visible
/// 2. once the ghost is drawn, `surface` is hidden and its visibility locked
/// 3. once `surface` has drawn hidden, `then` runs
///
/// Step 3 also completes when the window of `surface` stops drawing. Returns
/// the ghost, or `None` if `surface` or `host` no longer exist.
pub fn swap_for_ghost<F>(
    tree: &mut SurfaceTree,
    surface: SurfaceId,
    host: SurfaceId,
    then: F,
) -> Option<SurfaceId>
where
    F: FnOnce(&mut SurfaceTree) + 'static,
{
    let ghost = add_ghost(tree, surface, host)?;
    when_next_drawn(tree, ghost, move |tree| {
        tree.force_visibility(surface, Visibility::Invisible);
        tree.set_visibility_locked(surface, true);
        when_drawn_or_detached(tree, surface, then);
    });
    Some(ghost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blinc_core::{Rect, Size};
    use std::cell::Cell;
    use std::rc::Rc;

    fn setup() -> (SurfaceTree, SurfaceId, SurfaceId) {
        let mut tree = SurfaceTree::new(Size::new(400.0, 800.0));
        let app = tree.create_window("app", tree.screen());
        tree.attach_window(app);
        let button = tree.create("button");
        tree.set_bounds(button, Rect::new(10.0, 10.0, 80.0, 40.0));
        tree.add_child(app, button);

        let host = tree.create_window("host", tree.screen());
        tree.attach_window(host);
        (tree, button, host)
    }

    #[test]
    fn test_add_ghost_keeps_original_visible() {
        let (mut tree, button, host) = setup();
        let ghost = add_ghost(&mut tree, button, host).unwrap();
        assert_eq!(tree.visibility(button), Visibility::Visible);
        assert_eq!(tree.visibility(ghost), Visibility::Visible);
    }

    #[test]
    fn test_swap_for_ghost_never_leaves_a_hole() {
        let (mut tree, button, host) = setup();
        let done = Rc::new(Cell::new(false));
        let done_clone = Rc::clone(&done);
        let ghost = swap_for_ghost(&mut tree, button, host, move |_| done_clone.set(true)).unwrap();

        // Before any frame both are drawable
        assert_eq!(tree.visibility(button), Visibility::Visible);

        tree.frame(16.0);
        assert_eq!(tree.visibility(button), Visibility::Invisible);
        assert!(tree.is_visibility_locked(button));
        assert!(tree.contains(ghost));
        assert!(!done.get());

        tree.frame(16.0);
        assert!(done.get());
    }

    #[test]
    fn test_swap_for_ghost_completes_when_surface_is_detached() {
        let (mut tree, button, host) = setup();
        let done = Rc::new(Cell::new(0));
        let done_clone = Rc::clone(&done);
        swap_for_ghost(&mut tree, button, host, move |_| {
            done_clone.set(done_clone.get() + 1)
        })
        .unwrap();

        tree.frame(16.0);
        tree.remove_from_parent(button);
        tree.frame(16.0);
        assert_eq!(done.get(), 1);
        assert_eq!(tree.pending_draw_callbacks(), 0);

        for _ in 0..3 {
            tree.frame(16.0);
        }
        assert_eq!(done.get(), 1);
        assert!(!tree.has_pending_animation_frames());
    }

    #[test]
    fn test_when_drawn_or_detached_prefers_the_draw() {
        let (mut tree, button, _) = setup();
        let done = Rc::new(Cell::new(0));
        let done_clone = Rc::clone(&done);
        when_drawn_or_detached(&mut tree, button, move |_| done_clone.set(done_clone.get() + 1));

        tree.frame(16.0);
        assert_eq!(done.get(), 1);
        tree.remove_from_parent(button);
        tree.frame(16.0);
        tree.frame(16.0);
        assert_eq!(done.get(), 1);
        assert!(!tree.has_pending_animation_frames());
    }

    #[test]
    fn test_swap_for_ghost_with_missing_host() {
        let (mut tree, button, host) = setup();
        tree.destroy(host);
        assert!(swap_for_ghost(&mut tree, button, host, |_| {}).is_none());
        assert_eq!(tree.visibility(button), Visibility::Visible);
    }
}
