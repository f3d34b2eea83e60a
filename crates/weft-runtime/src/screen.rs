#![forbid(unsafe_code)]

//! The screen: root widget, back buffer, focus, and message routing.
//!
//! # Routing
//!
//! [`Screen::handle_message`] offers a message to a specific target first and
//! then to the whole tree:
//!
//! 1. Mouse messages go to the deepest widget under the pointer.
//! 2. Key messages go to the focused widget when focus auto-registration is
//!    on.
//! 3. Unless step 1 or 2 handled it, the root gets the message and delegates
//!    down the tree.
//! 4. Unhandled Tab / BackTab move focus.
//!
//! A targeted widget that declines a message sees it again during step 3.
//! Commands it returned while declining are dropped; only the step 3 pass
//! contributes commands, so each one is returned once.
//!
//! # Rendering
//!
//! [`Screen::render`] repaints only when the invalidator fired or some widget
//! reports itself dirty. The buffer keeps its own per-cell dirty state, so an
//! unchanged repaint produces no terminal output.

use tracing::{debug, trace};
use weft_core::event::{KeyCode, KeyEventKind, Message, MouseAction};
use weft_core::geometry::Rect;
use weft_render::buffer::Buffer;
use weft_widgets::tree::{self, WidgetPath};
use weft_widgets::{HandleResult, Invalidator, MountContext, RenderContext, Widget};

use crate::focus::{FocusChange, FocusScope};

/// Owns the widget tree and the buffer it renders into.
pub struct Screen {
    root: Option<Box<dyn Widget>>,
    buffer: Buffer,
    invalidator: Invalidator,
    focus: FocusScope,
    auto_register_focus: bool,
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("width", &self.buffer.width())
            .field("height", &self.buffer.height())
            .field("has_root", &self.root.is_some())
            .field("focus", &self.focus)
            .field("auto_register_focus", &self.auto_register_focus)
            .finish_non_exhaustive()
    }
}

impl Screen {
    /// An empty screen of the given size with focus auto-registration on.
    pub fn new(width: u16, height: u16) -> Self {
        let invalidator = Invalidator::new();
        invalidator.invalidate();
        Self {
            root: None,
            buffer: Buffer::new(width, height),
            invalidator,
            focus: FocusScope::new(),
            auto_register_focus: true,
        }
    }

    #[must_use]
    pub fn with_auto_register_focus(mut self, enabled: bool) -> Self {
        self.auto_register_focus = enabled;
        self
    }

    /// Width and height in cells.
    pub fn size(&self) -> (u16, u16) {
        (self.buffer.width(), self.buffer.height())
    }

    fn area(&self) -> Rect {
        Rect::from_size(self.buffer.width(), self.buffer.height())
    }

    /// Replace the root widget.
    ///
    /// The old tree is unmounted, the new one laid out at full size and
    /// mounted, focus targets are re-collected, and everything is marked for
    /// repaint.
    pub fn set_root(&mut self, mut root: Box<dyn Widget>) {
        self.take_root();

        root.layout(self.area());
        tree::mount_tree(root.as_mut(), &MountContext::new(self.invalidator.clone()));
        if self.auto_register_focus {
            self.focus.rebuild(root.as_ref()).apply(root.as_mut());
        }
        debug!(focus_targets = self.focus.len(), "screen root replaced");

        self.root = Some(root);
        self.mark_all_dirty();
    }

    /// Detach and return the root widget, unmounting it first.
    pub fn take_root(&mut self) -> Option<Box<dyn Widget>> {
        let mut old = self.root.take()?;
        self.focus.clear().apply(old.as_mut());
        tree::unmount_tree(old.as_mut());
        self.invalidator.invalidate();
        Some(old)
    }

    pub fn root(&self) -> Option<&dyn Widget> {
        self.root.as_deref()
    }

    pub fn root_mut(&mut self) -> Option<&mut (dyn Widget + 'static)> {
        self.root.as_deref_mut()
    }

    /// Reallocate the buffer and lay the root out at the new size.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.buffer.resize(width, height);
        let area = self.area();
        if let Some(root) = self.root.as_deref_mut() {
            root.layout(area);
        }
        self.invalidator.invalidate();
        debug!(width, height, "screen resized");
    }

    /// Apply size bookkeeping for `msg`. Returns true for resize messages.
    pub fn observe(&mut self, msg: &Message) -> bool {
        match *msg {
            Message::Resize { width, height } => {
                self.resize(width, height);
                true
            }
            _ => false,
        }
    }

    /// Route `msg` through the tree. See the module docs for the order.
    pub fn handle_message(&mut self, msg: &Message) -> HandleResult {
        let targeted = self.deliver_targeted(msg);
        if targeted.handled {
            return targeted;
        }
        if !targeted.commands.is_empty() {
            trace!(
                dropped = targeted.commands.len(),
                "declined target commands superseded by tree pass"
            );
        }

        let Some(root) = self.root.as_deref_mut() else {
            return HandleResult::unhandled();
        };
        let mut result = root.handle_message(msg);

        if !result.handled
            && self.auto_register_focus
            && let Message::Key(key) = msg
            && key.kind != KeyEventKind::Release
        {
            let moved = match key.code {
                KeyCode::Tab => self.focus_next(),
                KeyCode::BackTab => self.focus_prev(),
                _ => false,
            };
            result.handled = moved;
        }
        result
    }

    /// Offer `msg` to the hit-tested or focused widget, if any.
    fn deliver_targeted(&mut self, msg: &Message) -> HandleResult {
        let mut result = HandleResult::unhandled();
        let Some(root) = self.root.as_deref_mut() else {
            return result;
        };

        match msg {
            Message::Mouse(mouse) => {
                if let Some(path) = tree::hit_test(root, mouse.x, mouse.y)
                    && !path.is_empty()
                {
                    if self.auto_register_focus
                        && mouse.action == MouseAction::Press
                        && let Some(change) = self.focus.focus_path(&path)
                    {
                        change.apply(root);
                        self.invalidator.invalidate();
                    }
                    if let Some(target) = tree::widget_at_path_mut(root, &path) {
                        result.merge(target.handle_message(msg));
                    }
                }
            }
            Message::Key(_) if self.auto_register_focus => {
                if let Some(path) = self.focus.focused()
                    && !path.is_empty()
                    && let Some(target) = tree::widget_at_path_mut(root, path)
                {
                    result.merge(target.handle_message(msg));
                }
            }
            _ => {}
        }
        result
    }

    /// Move focus forward. Returns false if there is nothing to focus.
    pub fn focus_next(&mut self) -> bool {
        let change = self.focus.next();
        self.apply_focus(change)
    }

    /// Move focus backward. Returns false if there is nothing to focus.
    pub fn focus_prev(&mut self) -> bool {
        let change = self.focus.prev();
        self.apply_focus(change)
    }

    /// Focus the widget at `path` if it is a focus target.
    pub fn focus_path(&mut self, path: &[usize]) -> bool {
        let change = self.focus.focus_path(path);
        self.apply_focus(change)
    }

    /// Re-collect focus targets after the tree changed shape.
    ///
    /// The focused widget keeps focus if it is still a target. Returns true
    /// if the focused path changed.
    pub fn refresh_focus(&mut self) -> bool {
        if !self.auto_register_focus {
            return false;
        }
        let Some(root) = self.root.as_deref_mut() else {
            return false;
        };
        let change = self.focus.rebuild(root);
        if change.from == change.to {
            // The same path may now address a different widget.
            if let Some(path) = &change.to
                && let Some(widget) = tree::widget_at_path_mut(root, path)
            {
                widget.set_focused(true);
            }
            return false;
        }
        change.apply(root);
        debug!(
            from = ?change.from,
            to = ?change.to,
            targets = self.focus.len(),
            "focus targets refreshed"
        );
        self.invalidator.invalidate();
        true
    }

    fn apply_focus(&mut self, change: Option<FocusChange>) -> bool {
        let Some(change) = change else {
            return false;
        };
        if let Some(root) = self.root.as_deref_mut() {
            change.apply(root);
        }
        debug!(from = ?change.from, to = ?change.to, "focus moved");
        self.invalidator.invalidate();
        true
    }

    /// Path of the focused widget, if any.
    pub fn focused_path(&self) -> Option<&WidgetPath> {
        self.focus.focused()
    }

    pub fn focus_scope(&self) -> &FocusScope {
        &self.focus
    }

    /// Force a full repaint on the next render and flush.
    pub fn mark_all_dirty(&mut self) {
        self.invalidator.invalidate();
        self.buffer.mark_all_dirty();
    }

    /// Handle widgets use to request a repaint.
    pub fn invalidator(&self) -> &Invalidator {
        &self.invalidator
    }

    /// Repaint the tree into the buffer if anything changed.
    ///
    /// Returns true if widgets were rendered.
    pub fn render(&mut self) -> bool {
        let Some(root) = self.root.as_deref() else {
            let invalidated = self.invalidator.take();
            if invalidated {
                self.buffer.clear();
            }
            return invalidated;
        };
        if !self.invalidator.is_invalidated() && !tree::any_dirty(root) {
            return false;
        }

        // Children may have been added or removed since the last frame.
        self.refresh_focus();
        self.invalidator.take();
        let Some(root) = self.root.as_deref_mut() else {
            return false;
        };
        root.layout(Rect::from_size(self.buffer.width(), self.buffer.height()));
        self.buffer.clear();
        RenderContext::new(&mut self.buffer).render_child(root);
        tree::clear_dirty_tree(root);
        trace!(dirty_cells = self.buffer.dirty_count(), "screen rendered");
        true
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    /// Buffer contents as text, rows trimmed.
    pub fn text(&self) -> String {
        self.buffer.to_text()
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        if let Some(mut root) = self.root.take() {
            tree::unmount_tree(root.as_mut());
        }
    }
}
