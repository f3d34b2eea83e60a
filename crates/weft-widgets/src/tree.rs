#![forbid(unsafe_code)]

//! Generic walkers over a widget tree.
//!
//! Nodes are addressed by *path*: the sequence of child indices from the
//! root. The empty path is the root itself. Paths are only stable until the
//! tree is restructured, so callers recompute them after `SetRoot`.

use crate::{MountContext, Widget};

/// Index path from the root to a node.
pub type WidgetPath = Vec<usize>;

/// Mount `node` and then its descendants (pre-order).
pub fn mount_tree(node: &mut dyn Widget, ctx: &MountContext) {
    node.mount(ctx);
    for child in node.children_mut() {
        mount_tree(child.as_mut(), ctx);
    }
}

/// Unmount the descendants of `node` and then `node` itself (post-order).
pub fn unmount_tree(node: &mut dyn Widget) {
    for child in node.children_mut() {
        unmount_tree(child.as_mut());
    }
    node.unmount();
}

/// Shared reference to the node at `path`.
pub fn widget_at_path<'a>(root: &'a dyn Widget, path: &[usize]) -> Option<&'a dyn Widget> {
    let mut node = root;
    for &index in path {
        node = node.children().get(index)?.as_ref();
    }
    Some(node)
}

/// Mutable reference to the node at `path`.
pub fn widget_at_path_mut<'a>(
    root: &'a mut dyn Widget,
    path: &[usize],
) -> Option<&'a mut dyn Widget> {
    let mut node = root;
    for &index in path {
        node = node.children_mut().get_mut(index)?.as_mut();
    }
    Some(node)
}

/// Path of the deepest node whose bounds contain `(x, y)`.
///
/// Later siblings are checked first since they paint over earlier ones.
/// Returns `None` when the root itself does not contain the point.
pub fn hit_test(root: &dyn Widget, x: u16, y: u16) -> Option<WidgetPath> {
    if !root.bounds().contains(x, y) {
        return None;
    }
    let mut path = Vec::new();
    let mut node = root;
    'descend: loop {
        for (index, child) in node.children().iter().enumerate().rev() {
            if child.bounds().contains(x, y) {
                path.push(index);
                node = child.as_ref();
                continue 'descend;
            }
        }
        return Some(path);
    }
}

/// Paths of every focusable node, in pre-order.
pub fn collect_focusable(root: &dyn Widget) -> Vec<WidgetPath> {
    fn walk(node: &dyn Widget, path: &mut WidgetPath, out: &mut Vec<WidgetPath>) {
        if node.is_focusable() {
            out.push(path.clone());
        }
        for (index, child) in node.children().iter().enumerate() {
            path.push(index);
            walk(child.as_ref(), path, out);
            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(root, &mut Vec::new(), &mut out);
    out
}

/// True if any node in the tree is dirty.
pub fn any_dirty(node: &dyn Widget) -> bool {
    node.is_dirty() || node.children().iter().any(|child| any_dirty(child.as_ref()))
}

/// Clear the dirty flag on every node.
pub fn clear_dirty_tree(node: &dyn Widget) {
    node.clear_dirty();
    for child in node.children() {
        clear_dirty_tree(child.as_ref());
    }
}
