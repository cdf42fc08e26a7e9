//! Dialog content stealing
//!
//! Shows a dialog without ever letting its window draw, waits until its
//! content root holds exactly one child, then hides the dialog and detaches
//! that child for the caller.

use std::rc::Rc;

use blinc_core::{PreDraw, SurfaceId, SurfaceTree};

use crate::dialog::Dialog;

/// Steal the content of `dialog` from `content_root`
///
/// `before_hide` runs right before the dialog is hidden, so the caller can
/// arm suppression of the resulting hide notification. `then` receives the
/// detached content surface.
pub fn steal_content<B, F>(
    tree: &mut SurfaceTree,
    dialog: &Rc<dyn Dialog>,
    content_root: SurfaceId,
    before_hide: B,
    then: F,
) where
    B: FnOnce() + 'static,
    F: FnOnce(&mut SurfaceTree, SurfaceId) + 'static,
{
    let weak_dialog = Rc::downgrade(dialog);
    let mut pending = Some((before_hide, then));

    tree.add_pre_draw_listener(content_root, move |tree| {
        if tree.child_count(content_root) != 1 {
            // Never draw the original dialog
            return PreDraw::Cancel;
        }
        let (Some((before_hide, then)), Some(content)) =
            (pending.take(), tree.child_at(content_root, 0))
        else {
            return PreDraw::CancelOnce;
        };

        before_hide();
        if let Some(dialog) = weak_dialog.upgrade() {
            dialog.hide(tree);
        }
        tree.remove_from_parent(content);
        then(tree, content);
        PreDraw::CancelOnce
    });

    dialog.show(tree);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{SurfaceDialog, WindowAttributes};
    use blinc_core::{Background, Color, Size};
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_steal_hides_dialog_without_drawing_it() {
        let mut tree = SurfaceTree::new(Size::new(400.0, 800.0));
        let content = tree.create("content");
        let dialog = SurfaceDialog::new(
            &mut tree,
            "dialog",
            content,
            WindowAttributes::fixed(200.0, 300.0)
                .with_background(Background::new(Color::WHITE, 28.0)),
        );
        let window = dialog.window();
        let dialog: Rc<dyn Dialog> = dialog;
        let content_root = dialog.content_root().unwrap();

        let armed = Rc::new(Cell::new(false));
        let stolen = Rc::new(RefCell::new(None));
        let armed_clone = Rc::clone(&armed);
        let stolen_clone = Rc::clone(&stolen);
        steal_content(
            &mut tree,
            &dialog,
            content_root,
            move || armed_clone.set(true),
            move |_, surface| *stolen_clone.borrow_mut() = Some(surface),
        );

        assert!(dialog.is_showing(&tree));
        tree.frame(16.0);
        tree.frame(16.0);

        assert!(armed.get());
        assert_eq!(*stolen.borrow(), Some(content));
        assert_eq!(tree.parent(content), None);
        assert!(!dialog.is_showing(&tree));
        assert_eq!(tree.draw_count(window), 0);
    }
}
