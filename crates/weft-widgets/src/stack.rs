#![forbid(unsafe_code)]

//! Linear container.
//!
//! Children are laid out one after another along the main axis at their
//! measured size and stretched across the cross axis. Space that runs out is
//! clipped: trailing children get empty bounds and render nothing.

use weft_core::event::Message;
use weft_core::geometry::{Constraints, Rect, Size};

use crate::{
    HandleResult, MountContext, RenderContext, Widget, WidgetCore, delegate_to_children, tree,
};

/// Main axis of a [`Stack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Vertical,
    Horizontal,
}

/// Owns an ordered list of children and stacks them along one axis.
pub struct Stack {
    core: WidgetCore,
    direction: Direction,
    gap: u16,
    children: Vec<Box<dyn Widget>>,
}

impl Stack {
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self {
            core: WidgetCore::new(),
            direction,
            gap: 0,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn vertical() -> Self {
        Self::new(Direction::Vertical)
    }

    #[must_use]
    pub fn horizontal() -> Self {
        Self::new(Direction::Horizontal)
    }

    /// Blank cells between adjacent children.
    #[must_use]
    pub fn with_gap(mut self, gap: u16) -> Self {
        self.gap = gap;
        self
    }

    /// Append a child (builder form).
    #[must_use]
    pub fn child(mut self, widget: impl Widget + 'static) -> Self {
        self.children.push(Box::new(widget));
        self
    }

    /// Append a boxed child. Takes effect at the next layout.
    ///
    /// If the stack is already mounted the child is mounted immediately.
    pub fn push(&mut self, mut widget: Box<dyn Widget>) {
        if let Some(ctx) = self.core.mount_context() {
            tree::mount_tree(widget.as_mut(), &ctx);
        }
        self.children.push(widget);
        self.core.invalidate();
    }

    /// Remove and return the child at `index`, unmounting it if the stack is
    /// mounted.
    pub fn remove(&mut self, index: usize) -> Option<Box<dyn Widget>> {
        if index >= self.children.len() {
            return None;
        }
        let mut widget = self.children.remove(index);
        if self.core.is_attached() {
            tree::unmount_tree(widget.as_mut());
        }
        self.core.invalidate();
        Some(widget)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn total_gap(&self) -> u16 {
        let gaps = u16::try_from(self.children.len().saturating_sub(1)).unwrap_or(u16::MAX);
        self.gap.saturating_mul(gaps)
    }
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("direction", &self.direction)
            .field("gap", &self.gap)
            .field("children", &self.children.len())
            .field("bounds", &self.core.bounds())
            .finish()
    }
}

impl Widget for Stack {
    fn measure(&self, constraints: Constraints) -> Size {
        let child_constraints = Constraints::loose(constraints.max);
        let mut main: u16 = self.total_gap();
        let mut cross: u16 = 0;
        for child in &self.children {
            let size = child.measure(child_constraints);
            match self.direction {
                Direction::Vertical => {
                    main = main.saturating_add(size.height);
                    cross = cross.max(size.width);
                }
                Direction::Horizontal => {
                    main = main.saturating_add(size.width);
                    cross = cross.max(size.height);
                }
            }
        }
        let desired = match self.direction {
            Direction::Vertical => Size::new(cross, main),
            Direction::Horizontal => Size::new(main, cross),
        };
        constraints.constrain(desired)
    }

    fn layout(&mut self, bounds: Rect) {
        self.core.set_bounds(bounds);

        let mut remaining = bounds;
        for (index, child) in self.children.iter_mut().enumerate() {
            if index > 0 {
                remaining = match self.direction {
                    Direction::Vertical => remaining.split_top(self.gap).1,
                    Direction::Horizontal => remaining.split_left(self.gap).1,
                };
            }
            let size = child.measure(Constraints::loose(remaining.size()));
            let (taken, rest) = match self.direction {
                Direction::Vertical => remaining.split_top(size.height),
                Direction::Horizontal => remaining.split_left(size.width),
            };
            child.layout(taken);
            remaining = rest;
        }
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        #[cfg(feature = "tracing")]
        let _span = {
            let area = self.core.bounds();
            tracing::debug_span!(
                "widget_render",
                widget = "Stack",
                x = area.x,
                y = area.y,
                w = area.width,
                h = area.height,
                children = self.children.len()
            )
            .entered()
        };

        if self.core.bounds().is_empty() {
            return;
        }
        for child in &self.children {
            ctx.render_child(child.as_ref());
        }
    }

    fn handle_message(&mut self, msg: &Message) -> HandleResult {
        delegate_to_children(&mut self.children, msg)
    }

    fn bounds(&self) -> Rect {
        self.core.bounds()
    }

    fn mount(&mut self, ctx: &MountContext) {
        self.core.attach(ctx);
    }

    fn unmount(&mut self) {
        self.core.detach();
    }

    fn children(&self) -> &[Box<dyn Widget>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [Box<dyn Widget>] {
        &mut self.children
    }

    fn invalidate(&self) {
        self.core.invalidate();
    }

    fn is_dirty(&self) -> bool {
        self.core.is_dirty()
    }

    fn clear_dirty(&self) {
        self.core.clear_dirty();
    }
}
