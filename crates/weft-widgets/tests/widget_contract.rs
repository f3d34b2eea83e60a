#![forbid(unsafe_code)]

//! Contract checks across composed widgets: delegation order, lifecycle,
//! and layout containment.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use weft_core::command::Command;
use weft_core::event::{KeyCode, Message};
use weft_core::geometry::{Constraints, Rect, Size};
use weft_core::signal::Signal;
use weft_widgets::tree::{any_dirty, clear_dirty_tree, mount_tree, unmount_tree};
use weft_widgets::{
    Direction, HandleResult, Invalidator, Label, MountContext, RenderContext, SignalLabel, Stack, Widget,
    WidgetCore,
};

/// Logs every message offered to it and consumes one specific key.
struct KeySink {
    core: WidgetCore,
    name: &'static str,
    accepts: char,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl KeySink {
    fn new(name: &'static str, accepts: char, log: &Rc<RefCell<Vec<&'static str>>>) -> Self {
        Self {
            core: WidgetCore::new(),
            name,
            accepts,
            log: Rc::clone(log),
        }
    }
}

impl Widget for KeySink {
    fn measure(&self, constraints: Constraints) -> Size {
        constraints.constrain(Size::new(1, 1))
    }

    fn layout(&mut self, bounds: Rect) {
        self.core.set_bounds(bounds);
    }

    fn render(&self, _ctx: &mut RenderContext<'_>) {}

    fn handle_message(&mut self, msg: &Message) -> HandleResult {
        self.log.borrow_mut().push(self.name);
        match msg {
            Message::Key(key) if key.is_char(self.accepts) => {
                HandleResult::with_command(Command::send_custom(self.name))
            }
            _ => {
                let mut result = HandleResult::unhandled();
                result.push(Command::Refresh);
                result
            }
        }
    }

    fn bounds(&self) -> Rect {
        self.core.bounds()
    }
}

fn nested(log: &Rc<RefCell<Vec<&'static str>>>) -> Stack {
    Stack::vertical()
        .child(
            Stack::horizontal()
                .child(KeySink::new("a", 'a', log))
                .child(KeySink::new("b", 'b', log)),
        )
        .child(KeySink::new("c", 'c', log))
        .child(KeySink::new("d", 'b', log))
}

#[test]
fn first_handler_wins_and_later_siblings_are_skipped() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut root = nested(&log);

    let result = root.handle_message(&Message::char('b'));
    assert!(result.handled);
    assert_eq!(*log.borrow(), vec!["a", "b"]);
    // "a" declined but its command is kept, followed by the handler's.
    assert_eq!(result.commands.len(), 2);
    assert_eq!(result.commands[0], Command::Refresh);
}

#[test]
fn unhandled_message_visits_every_leaf_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut root = nested(&log);

    let result = root.handle_message(&Message::key(KeyCode::Enter));
    assert!(!result.handled);
    assert_eq!(*log.borrow(), vec!["a", "b", "c", "d"]);
    assert_eq!(result.commands, vec![Command::Refresh; 4]);
}

#[test]
fn unmounted_subtree_receives_no_signal_notifications() {
    let count = Signal::new(0_u32);
    let screen = Invalidator::new();
    let mut root = Stack::vertical()
        .child(Label::new("title"))
        .child(SignalLabel::new(&count, |n| format!("Count: {n}")));
    root.layout(Rect::from_size(12, 2));

    mount_tree(&mut root, &MountContext::new(screen.clone()));
    assert_eq!(count.subscriber_count(), 1);

    clear_dirty_tree(&root);
    screen.take();
    count.set(1);
    assert!(any_dirty(&root));
    assert!(screen.take());

    unmount_tree(&mut root);
    clear_dirty_tree(&root);
    assert_eq!(count.subscriber_count(), 0);
    count.set(2);
    assert!(!any_dirty(&root));
    assert!(!screen.is_invalidated());
}

fn stack_strategy() -> impl Strategy<Value = (bool, u16, Vec<String>)> {
    (
        any::<bool>(),
        0u16..4,
        prop::collection::vec("[a-z]{0,12}", 0..8),
    )
}

proptest! {
    #[test]
    fn children_stay_inside_parent_bounds(
        (vertical, gap, texts) in stack_strategy(),
        x in 0u16..50,
        y in 0u16..50,
        w in 0u16..40,
        h in 0u16..20,
    ) {
        let direction = if vertical { Direction::Vertical } else { Direction::Horizontal };
        let mut stack = Stack::new(direction).with_gap(gap);
        for text in &texts {
            stack.push(Box::new(Label::new(text.clone())));
        }
        let area = Rect::new(x, y, w, h);
        stack.layout(area);

        let mut previous_end = if vertical { area.y } else { area.x };
        for child in stack.children() {
            let b = child.bounds();
            if b.is_empty() {
                continue;
            }
            prop_assert_eq!(b.intersection(&area), b);
            let start = if vertical { b.y } else { b.x };
            prop_assert!(start >= previous_end);
            previous_end = if vertical { b.bottom() } else { b.right() };
        }
    }

    #[test]
    fn relayout_with_same_bounds_changes_nothing(
        texts in prop::collection::vec("[a-z]{1,6}", 1..6),
        w in 1u16..30,
        h in 1u16..10,
    ) {
        let mut stack = Stack::vertical();
        for text in &texts {
            stack.push(Box::new(Label::new(text.clone())));
        }
        let area = Rect::from_size(w, h);
        stack.layout(area);
        let first: Vec<Rect> = stack.children().iter().map(|c| c.bounds()).collect();
        clear_dirty_tree(&stack);

        stack.layout(area);
        let second: Vec<Rect> = stack.children().iter().map(|c| c.bounds()).collect();
        prop_assert_eq!(first, second);
        prop_assert!(!any_dirty(&stack));
    }
}
