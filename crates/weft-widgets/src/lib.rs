#![forbid(unsafe_code)]

//! The widget contract and a small set of reference widgets.
//!
//! Every node in the UI tree implements [`Widget`]. Containers own their
//! children as `Box<dyn Widget>` and expose them through
//! [`Widget::children`] / [`Widget::children_mut`], which lets the screen walk
//! the tree for lifecycle, focus, and hit testing without bespoke glue.

pub mod context;
pub mod error_boundary;
pub mod label;
pub mod signal_label;
pub mod stack;
pub mod tree;

pub use context::{InvalidateHandle, Invalidator, MountContext, RenderContext, WidgetCore};
pub use error_boundary::ErrorBoundary;
pub use label::Label;
pub use signal_label::SignalLabel;
pub use stack::{Direction, Stack};

use weft_core::command::Command;
use weft_core::event::Message;
use weft_core::geometry::{Constraints, Rect, Size};

/// A node in the widget tree.
///
/// Only measurement, layout, rendering, message handling, and bounds are
/// required. Lifecycle hooks, child enumeration, and focus support default to
/// no-ops.
pub trait Widget {
    /// Desired size under `constraints`. Must be pure.
    fn measure(&self, constraints: Constraints) -> Size;

    /// Assign final bounds. Containers lay out their children inside them.
    ///
    /// Calling this twice with the same bounds must have no further effect.
    fn layout(&mut self, bounds: Rect);

    /// Paint into the context using the last assigned bounds.
    ///
    /// Implementations should return early when their bounds are empty.
    fn render(&self, ctx: &mut RenderContext<'_>);

    /// Try to consume `msg`.
    ///
    /// Commands are returned whether or not the message was handled.
    fn handle_message(&mut self, msg: &Message) -> HandleResult;

    /// Bounds from the last [`Widget::layout`].
    fn bounds(&self) -> Rect;

    /// Called once when the node enters the active tree.
    fn mount(&mut self, _ctx: &MountContext) {}

    /// Called once when the node leaves the active tree.
    fn unmount(&mut self) {}

    /// Owned children, in layout and dispatch order.
    fn children(&self) -> &[Box<dyn Widget>] {
        &[]
    }

    fn children_mut(&mut self) -> &mut [Box<dyn Widget>] {
        &mut []
    }

    /// Request a repaint of this node on the next render pass.
    fn invalidate(&self) {}

    /// Returns true if this node changed since the last render.
    fn is_dirty(&self) -> bool {
        false
    }

    /// Called by the screen after a render pass.
    fn clear_dirty(&self) {}

    /// Whether this node can hold keyboard focus.
    fn is_focusable(&self) -> bool {
        false
    }

    /// Focus gained or lost.
    fn set_focused(&mut self, _focused: bool) {}
}

/// Outcome of [`Widget::handle_message`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandleResult {
    /// True if the message was consumed and delegation should stop.
    pub handled: bool,
    /// Effects to apply, in order.
    pub commands: Vec<Command>,
}

impl HandleResult {
    /// Not handled, no commands.
    pub fn unhandled() -> Self {
        Self::default()
    }

    /// Handled, no commands.
    pub fn handled() -> Self {
        Self {
            handled: true,
            commands: Vec::new(),
        }
    }

    /// Handled, with one command.
    pub fn with_command(cmd: Command) -> Self {
        Self {
            handled: true,
            commands: vec![cmd],
        }
    }

    /// Append a command without changing `handled`.
    pub fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    /// Fold `other` into `self`: commands are appended and `handled` is or-ed.
    pub fn merge(&mut self, other: HandleResult) {
        self.handled |= other.handled;
        self.commands.extend(other.commands);
    }
}

/// Offer `msg` to each child in order until one handles it.
///
/// Delegation is depth-first because each child delegates to its own
/// children before answering. Commands from children that did not handle
/// the message are kept.
pub fn delegate_to_children(children: &mut [Box<dyn Widget>], msg: &Message) -> HandleResult {
    let mut result = HandleResult::unhandled();
    for child in children.iter_mut() {
        result.merge(child.handle_message(msg));
        if result.handled {
            break;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records its id when offered a message; handles it if `consume` is set.
    struct Tracer {
        id: &'static str,
        consume: bool,
        log: Rc<RefCell<Vec<&'static str>>>,
        children: Vec<Box<dyn Widget>>,
    }

    impl Tracer {
        fn boxed(
            id: &'static str,
            consume: bool,
            log: &Rc<RefCell<Vec<&'static str>>>,
            children: Vec<Box<dyn Widget>>,
        ) -> Box<dyn Widget> {
            Box::new(Self {
                id,
                consume,
                log: Rc::clone(log),
                children,
            })
        }
    }

    impl Widget for Tracer {
        fn measure(&self, constraints: Constraints) -> Size {
            constraints.min
        }

        fn layout(&mut self, _bounds: Rect) {}

        fn render(&self, _ctx: &mut RenderContext<'_>) {}

        fn handle_message(&mut self, msg: &Message) -> HandleResult {
            self.log.borrow_mut().push(self.id);
            let mut result = delegate_to_children(&mut self.children, msg);
            if !result.handled && self.consume {
                result.handled = true;
            }
            result
        }

        fn bounds(&self) -> Rect {
            Rect::default()
        }

        fn children(&self) -> &[Box<dyn Widget>] {
            &self.children
        }

        fn children_mut(&mut self) -> &mut [Box<dyn Widget>] {
            &mut self.children
        }
    }

    #[test]
    fn delegation_is_depth_first_left_to_right() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut children = vec![
            Tracer::boxed(
                "a",
                false,
                &log,
                vec![
                    Tracer::boxed("a1", false, &log, vec![]),
                    Tracer::boxed("a2", false, &log, vec![]),
                ],
            ),
            Tracer::boxed("b", false, &log, vec![Tracer::boxed("b1", false, &log, vec![])]),
        ];

        let result = delegate_to_children(&mut children, &Message::char('x'));
        assert!(!result.handled);
        assert_eq!(*log.borrow(), vec!["a", "a1", "a2", "b", "b1"]);
    }

    #[test]
    fn first_handled_child_short_circuits() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut children = vec![
            Tracer::boxed("a", false, &log, vec![]),
            Tracer::boxed("b", true, &log, vec![]),
            Tracer::boxed("c", true, &log, vec![]),
        ];

        let result = delegate_to_children(&mut children, &Message::char('x'));
        assert!(result.handled);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn merge_appends_commands_and_ors_handled() {
        let mut result = HandleResult::unhandled();
        result.push(Command::Refresh);
        result.merge(HandleResult::with_command(Command::Quit));
        assert!(result.handled);
        assert_eq!(result.commands, vec![Command::Refresh, Command::Quit]);
    }

    #[test]
    fn default_hooks_are_inert() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tracer = Tracer::boxed("p", false, &log, vec![]);
        tracer.mount(&MountContext::new(Invalidator::new()));
        tracer.invalidate();
        assert!(!tracer.is_dirty());
        assert!(!tracer.is_focusable());
        tracer.unmount();
    }
}
