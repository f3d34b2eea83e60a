#![forbid(unsafe_code)]

//! Explicit context passed through mount and render.
//!
//! Nothing here is global: the screen-level invalidation flag reaches widgets
//! through [`MountContext`], and the render target, clip region, and base
//! style reach them through [`RenderContext`].

use std::cell::Cell;
use std::rc::Rc;

use weft_core::geometry::Rect;
use weft_render::buffer::Buffer;
use weft_render::cell::Style;

use crate::Widget;

/// Screen-level "something needs repainting" flag.
///
/// Cheap to clone; every clone shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct Invalidator {
    flag: Rc<Cell<bool>>,
}

impl Invalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a repaint. Idempotent.
    #[inline]
    pub fn invalidate(&self) {
        self.flag.set(true);
    }

    #[inline]
    pub fn is_invalidated(&self) -> bool {
        self.flag.get()
    }

    /// Read and reset the flag.
    #[inline]
    pub fn take(&self) -> bool {
        self.flag.replace(false)
    }
}

/// Context handed to [`Widget::mount`].
#[derive(Debug, Clone)]
pub struct MountContext {
    invalidator: Invalidator,
}

impl MountContext {
    pub fn new(invalidator: Invalidator) -> Self {
        Self { invalidator }
    }

    /// The screen's invalidation handle.
    pub fn invalidator(&self) -> &Invalidator {
        &self.invalidator
    }
}

/// Shared state most widgets need: bounds, a dirty flag, focus, and the
/// screen's invalidator once mounted.
#[derive(Debug)]
pub struct WidgetCore {
    bounds: Rect,
    dirty: Rc<Cell<bool>>,
    screen: Option<Invalidator>,
    focused: bool,
}

impl Default for WidgetCore {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetCore {
    /// A fresh core starts dirty so its first render is never skipped.
    pub fn new() -> Self {
        Self {
            bounds: Rect::default(),
            dirty: Rc::new(Cell::new(true)),
            screen: None,
            focused: false,
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Store new bounds. Returns true (and invalidates) only if they changed,
    /// which keeps repeated layout with the same bounds a no-op.
    pub fn set_bounds(&mut self, bounds: Rect) -> bool {
        if self.bounds == bounds {
            return false;
        }
        self.bounds = bounds;
        self.invalidate();
        true
    }

    /// Mark this node and the screen dirty.
    pub fn invalidate(&self) {
        self.dirty.set(true);
        if let Some(screen) = &self.screen {
            screen.invalidate();
        }
    }

    /// A detachable handle for invalidating from callbacks.
    pub fn invalidate_handle(&self) -> InvalidateHandle {
        InvalidateHandle {
            dirty: Rc::clone(&self.dirty),
            screen: self.screen.clone(),
        }
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    #[inline]
    pub fn clear_dirty(&self) {
        self.dirty.set(false);
    }

    /// Remember the screen's invalidator.
    pub fn attach(&mut self, ctx: &MountContext) {
        self.screen = Some(ctx.invalidator().clone());
        self.invalidate();
    }

    /// Forget the screen's invalidator.
    pub fn detach(&mut self) {
        self.screen = None;
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.screen.is_some()
    }

    /// Context for mounting a subtree under this node, while attached.
    pub fn mount_context(&self) -> Option<MountContext> {
        self.screen.clone().map(MountContext::new)
    }

    #[inline]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Returns true if focus changed.
    pub fn set_focused(&mut self, focused: bool) -> bool {
        if self.focused == focused {
            return false;
        }
        self.focused = focused;
        self.invalidate();
        true
    }
}

/// Invalidates one widget (and its screen) from inside a callback.
#[derive(Debug, Clone)]
pub struct InvalidateHandle {
    dirty: Rc<Cell<bool>>,
    screen: Option<Invalidator>,
}

impl InvalidateHandle {
    pub fn invalidate(&self) {
        self.dirty.set(true);
        if let Some(screen) = &self.screen {
            screen.invalidate();
        }
    }
}

/// Render target for one widget.
///
/// Every write is clipped to [`RenderContext::clip`], so a widget can never
/// paint outside the region its parent granted it.
pub struct RenderContext<'a> {
    buffer: &'a mut Buffer,
    clip: Rect,
    style: Style,
}

impl<'a> RenderContext<'a> {
    /// A context covering the whole buffer.
    pub fn new(buffer: &'a mut Buffer) -> Self {
        let clip = buffer.bounds();
        Self {
            buffer,
            clip,
            style: Style::DEFAULT,
        }
    }

    /// Set the base style widgets patch their own styles onto.
    pub fn with_base_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Region writes are clipped to.
    #[inline]
    pub fn clip(&self) -> Rect {
        self.clip
    }

    #[inline]
    pub fn base_style(&self) -> Style {
        self.style
    }

    /// Read-only view of the target buffer.
    pub fn buffer(&self) -> &Buffer {
        &*self.buffer
    }

    /// Paint `region` (clipped) with `ch`.
    pub fn fill(&mut self, region: Rect, ch: char, style: Style) {
        let region = region.intersection(&self.clip);
        self.buffer.fill(region, ch, self.style.patch(style));
    }

    /// Write text at (x, y), clipped to the current region.
    ///
    /// Returns the column after the last character written.
    pub fn set_string(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        if !self.clip.contains(x, y) {
            return x;
        }
        let style = self.style.patch(style);
        self.buffer
            .set_string_clipped(x, y, text, style, self.clip.right())
    }

    /// Render `child` with the clip narrowed to its bounds.
    ///
    /// Children with empty (or fully clipped) bounds are skipped.
    pub fn render_child(&mut self, child: &dyn Widget) {
        let clip = child.bounds().intersection(&self.clip);
        if clip.is_empty() {
            return;
        }
        let mut sub = RenderContext {
            buffer: &mut *self.buffer,
            clip,
            style: self.style,
        };
        child.render(&mut sub);
    }
}
