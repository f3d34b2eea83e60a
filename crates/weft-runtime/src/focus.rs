#![forbid(unsafe_code)]

//! Keyboard focus tracking for the screen.
//!
//! The scope holds the paths of every focusable widget in pre-order and an
//! index into that list. It does not touch widgets itself; callers apply the
//! returned [`FocusChange`] with [`FocusChange::apply`].

use weft_widgets::Widget;
use weft_widgets::tree::{self, WidgetPath};

/// Focus moved from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusChange {
    pub from: Option<WidgetPath>,
    pub to: Option<WidgetPath>,
}

impl FocusChange {
    /// Tell the affected widgets about the change.
    pub fn apply(&self, root: &mut dyn Widget) {
        if self.from == self.to {
            return;
        }
        if let Some(path) = &self.from
            && let Some(widget) = tree::widget_at_path_mut(root, path)
        {
            widget.set_focused(false);
        }
        if let Some(path) = &self.to
            && let Some(widget) = tree::widget_at_path_mut(root, path)
        {
            widget.set_focused(true);
        }
    }
}

/// Ordered set of focus targets with one current entry.
#[derive(Debug, Clone, Default)]
pub struct FocusScope {
    targets: Vec<WidgetPath>,
    current: Option<usize>,
}

impl FocusScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-collect focus targets from `root`.
    ///
    /// The previously focused path keeps focus if it is still a target;
    /// otherwise the first target gets it.
    pub fn rebuild(&mut self, root: &dyn Widget) -> FocusChange {
        let previous = self.focused().cloned();
        self.targets = tree::collect_focusable(root);
        self.current = match &previous {
            Some(path) => self
                .targets
                .iter()
                .position(|p| p == path)
                .or((!self.targets.is_empty()).then_some(0)),
            None => (!self.targets.is_empty()).then_some(0),
        };
        FocusChange {
            from: previous,
            to: self.focused().cloned(),
        }
    }

    /// Forget every target.
    pub fn clear(&mut self) -> FocusChange {
        let from = self.focused().cloned();
        self.targets.clear();
        self.current = None;
        FocusChange { from, to: None }
    }

    pub fn focused(&self) -> Option<&WidgetPath> {
        self.current.map(|i| &self.targets[i])
    }

    pub fn targets(&self) -> &[WidgetPath] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Advance to the next target, wrapping at the end.
    pub fn next(&mut self) -> Option<FocusChange> {
        self.step(1)
    }

    /// Move to the previous target, wrapping at the start.
    pub fn prev(&mut self) -> Option<FocusChange> {
        self.step(self.targets.len().saturating_sub(1))
    }

    /// Focus `path` if it is a target.
    pub fn focus_path(&mut self, path: &[usize]) -> Option<FocusChange> {
        let index = self.targets.iter().position(|p| p == path)?;
        let from = self.focused().cloned();
        self.current = Some(index);
        Some(FocusChange {
            from,
            to: self.focused().cloned(),
        })
    }

    fn step(&mut self, offset: usize) -> Option<FocusChange> {
        let len = self.targets.len();
        if len == 0 {
            return None;
        }
        let from = self.focused().cloned();
        let next = match self.current {
            Some(i) => (i + offset) % len,
            None => 0,
        };
        self.current = Some(next);
        Some(FocusChange {
            from,
            to: self.focused().cloned(),
        })
    }
}
