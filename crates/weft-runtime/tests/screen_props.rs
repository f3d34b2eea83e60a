#![forbid(unsafe_code)]

//! Property tests for screen-level invariants: resize bookkeeping and focus
//! cycling.

use proptest::prelude::*;

use weft_core::event::{KeyCode, Message};
use weft_core::geometry::Rect;
use weft_runtime::{Screen, ScreenSimulator};
use weft_widgets::{Label, Stack};

fn labels(count: usize, focusable: bool) -> Stack {
    (0..count).fold(Stack::vertical(), |stack, i| {
        stack.child(Label::new(format!("item {i}")).focusable(focusable))
    })
}

proptest! {
    #[test]
    fn resize_sequence_tracks_last_size(
        sizes in prop::collection::vec((0u16..120, 0u16..60), 1..12)
    ) {
        let mut screen = Screen::new(10, 3);
        screen.set_root(Box::new(labels(3, false)));
        for &(w, h) in &sizes {
            screen.observe(&Message::Resize { width: w, height: h });
            screen.render();
        }
        let (w, h) = *sizes.last().unwrap();
        prop_assert_eq!(screen.size(), (w, h));
        prop_assert_eq!(screen.buffer().len(), w as usize * h as usize);
        prop_assert_eq!(screen.root().unwrap().bounds(), Rect::from_size(w, h));
        for child in screen.root().unwrap().children() {
            let b = child.bounds();
            prop_assert!(b.right() <= w && b.bottom() <= h);
        }
    }

    #[test]
    fn tab_cycles_focus_modulo_target_count(count in 1usize..6, presses in 0usize..20) {
        let mut sim = ScreenSimulator::new(12, 8, labels(count, true));
        for _ in 0..presses {
            sim.inject_event(Message::key(KeyCode::Tab));
        }
        prop_assert_eq!(sim.screen().focused_path(), Some(&vec![presses % count]));
    }

    #[test]
    fn backtab_undoes_tab(count in 1usize..6, presses in 0usize..10) {
        let mut sim = ScreenSimulator::new(12, 8, labels(count, true));
        for _ in 0..presses {
            sim.inject_event(Message::key(KeyCode::Tab));
        }
        for _ in 0..presses {
            sim.inject_event(Message::key(KeyCode::BackTab));
        }
        prop_assert_eq!(sim.screen().focused_path(), Some(&vec![0]));
    }

    #[test]
    fn focus_targets_match_focusable_children(focusable in prop::collection::vec(any::<bool>(), 0..8)) {
        let root = focusable.iter().enumerate().fold(Stack::vertical(), |stack, (i, &f)| {
            stack.child(Label::new(format!("{i}")).focusable(f))
        });
        let mut screen = Screen::new(10, 10);
        screen.set_root(Box::new(root));

        let expected: Vec<Vec<usize>> = focusable
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| vec![i])
            .collect();
        prop_assert_eq!(screen.focus_scope().targets(), expected.as_slice());
        prop_assert_eq!(screen.focused_path(), expected.first());
    }
}
