#![forbid(unsafe_code)]

//! Panic containment for a subtree.
//!
//! [`ErrorBoundary`] wraps one widget and catches panics raised from its
//! `render` or `handle_message`. After a panic the boundary stops calling
//! into the inner widget and paints a fallback in its place until
//! [`ErrorBoundary::reset`] is called.
//!
//! The wrapped widget is still exposed as the boundary's only child so tree
//! walkers can mount it and find it by focus or hit test. Messages routed
//! straight to it by those walkers do not pass through the boundary.

use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use weft_core::event::Message;
use weft_core::geometry::{Constraints, Rect, Size};
use weft_render::cell::{PackedRgba, Style};

use crate::{HandleResult, MountContext, RenderContext, Widget, WidgetCore};

/// A panic captured from the wrapped widget.
#[derive(Debug, Clone)]
pub struct CapturedError {
    /// Panic payload rendered as text.
    pub message: String,
    /// Name given to the boundary.
    pub widget_name: &'static str,
    /// Bounds of the widget when it panicked.
    pub area: Rect,
    pub timestamp: Instant,
}

impl CapturedError {
    fn from_panic(
        payload: Box<dyn std::any::Any + Send>,
        widget_name: &'static str,
        area: Rect,
    ) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self {
            message,
            widget_name,
            area,
            timestamp: Instant::now(),
        }
    }
}

/// Wraps a widget and renders a fallback if it panics.
pub struct ErrorBoundary {
    core: WidgetCore,
    inner: Box<dyn Widget>,
    widget_name: &'static str,
    failure: RefCell<Option<CapturedError>>,
}

impl ErrorBoundary {
    #[must_use]
    pub fn new(inner: impl Widget + 'static, widget_name: &'static str) -> Self {
        Self::from_boxed(Box::new(inner), widget_name)
    }

    #[must_use]
    pub fn from_boxed(inner: Box<dyn Widget>, widget_name: &'static str) -> Self {
        Self {
            core: WidgetCore::new(),
            inner,
            widget_name,
            failure: RefCell::new(None),
        }
    }

    pub fn widget_name(&self) -> &'static str {
        self.widget_name
    }

    pub fn is_failed(&self) -> bool {
        self.failure.borrow().is_some()
    }

    /// The captured panic, if any.
    pub fn error(&self) -> Option<CapturedError> {
        self.failure.borrow().clone()
    }

    /// Forget the failure and resume calling the inner widget.
    pub fn reset(&mut self) {
        self.failure.replace(None);
        self.core.invalidate();
    }

    fn record(&self, payload: Box<dyn std::any::Any + Send>) {
        let error = CapturedError::from_panic(payload, self.widget_name, self.core.bounds());
        #[cfg(feature = "tracing")]
        tracing::error!(
            widget = error.widget_name,
            message = %error.message,
            "widget panicked; rendering fallback"
        );
        self.failure.replace(Some(error));
        self.core.invalidate();
    }
}

impl std::fmt::Debug for ErrorBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorBoundary")
            .field("widget_name", &self.widget_name)
            .field("failure", &self.failure.borrow())
            .finish_non_exhaustive()
    }
}

impl Widget for ErrorBoundary {
    fn measure(&self, constraints: Constraints) -> Size {
        if self.is_failed() {
            return constraints.constrain(Size::new(constraints.max.width, 1));
        }
        self.inner.measure(constraints)
    }

    fn layout(&mut self, bounds: Rect) {
        self.core.set_bounds(bounds);
        self.inner.layout(bounds);
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        let area = self.core.bounds();
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "widget_render",
            widget = "ErrorBoundary",
            x = area.x,
            y = area.y,
            w = area.width,
            h = area.height
        )
        .entered();

        if area.is_empty() {
            return;
        }

        if !self.is_failed() {
            let result = catch_unwind(AssertUnwindSafe(|| ctx.render_child(self.inner.as_ref())));
            match result {
                Ok(()) => return,
                Err(payload) => self.record(payload),
            }
        }

        if let Some(error) = self.failure.borrow().as_ref() {
            render_fallback(ctx, area, error);
        }
    }

    fn handle_message(&mut self, msg: &Message) -> HandleResult {
        if self.is_failed() {
            return HandleResult::unhandled();
        }
        let inner = &mut self.inner;
        match catch_unwind(AssertUnwindSafe(|| inner.handle_message(msg))) {
            Ok(result) => result,
            Err(payload) => {
                self.record(payload);
                HandleResult::unhandled()
            }
        }
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
        std::slice::from_ref(&self.inner)
    }

    fn children_mut(&mut self) -> &mut [Box<dyn Widget>] {
        std::slice::from_mut(&mut self.inner)
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

fn render_fallback(ctx: &mut RenderContext<'_>, area: Rect, error: &CapturedError) {
    let error_bg = PackedRgba::rgb(40, 0, 0);
    let error_style = Style::new().fg(PackedRgba::rgb(255, 60, 60)).bg(error_bg);
    ctx.fill(area, ' ', Style::new().bg(error_bg));

    if area.width < 3 {
        ctx.set_string(area.x, area.y, "!", error_style);
        return;
    }
    ctx.set_string(area.x, area.y, &format!("! {}", error.message), error_style);
    if area.height >= 2 {
        let name_style = Style::new().fg(PackedRgba::rgb(180, 180, 180)).bg(error_bg);
        ctx.set_string(
            area.x,
            area.y.saturating_add(1),
            &format!("  in: {}", error.widget_name),
            name_style,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Label;
    use weft_render::buffer::Buffer;

    struct Faulty;

    impl Widget for Faulty {
        fn measure(&self, constraints: Constraints) -> Size {
            constraints.min
        }

        fn layout(&mut self, _bounds: Rect) {}

        fn render(&self, _ctx: &mut RenderContext<'_>) {
            panic!("render exploded");
        }

        fn handle_message(&mut self, _msg: &Message) -> HandleResult {
            panic!("handler exploded");
        }

        fn bounds(&self) -> Rect {
            Rect::new(0, 0, 20, 2)
        }
    }

    #[test]
    fn healthy_inner_renders_normally() {
        let mut boundary = ErrorBoundary::new(Label::new("fine"), "label");
        boundary.layout(Rect::new(0, 0, 6, 1));
        let mut buf = Buffer::new(6, 1);
        boundary.render(&mut RenderContext::new(&mut buf));
        assert_eq!(buf.row_text(0), "fine  ");
        assert!(!boundary.is_failed());
    }

    #[test]
    fn render_panic_shows_fallback() {
        let mut boundary = ErrorBoundary::new(Faulty, "faulty");
        boundary.layout(Rect::new(0, 0, 20, 2));
        let mut buf = Buffer::new(20, 2);
        boundary.render(&mut RenderContext::new(&mut buf));

        assert!(boundary.is_failed());
        let error = boundary.error().map(|e| e.message);
        assert_eq!(error.as_deref(), Some("render exploded"));
        assert!(buf.row_text(0).starts_with("! render exploded"));
        assert!(buf.row_text(1).starts_with("  in: faulty"));
    }

    #[test]
    fn handler_panic_is_contained() {
        let mut boundary = ErrorBoundary::new(Faulty, "faulty");
        let result = boundary.handle_message(&Message::char('x'));
        assert!(!result.handled);
        assert!(boundary.is_failed());

        // Failed boundaries no longer call into the inner widget.
        let result = boundary.handle_message(&Message::char('y'));
        assert!(!result.handled);
    }

    #[test]
    fn reset_clears_failure() {
        let mut boundary = ErrorBoundary::new(Faulty, "faulty");
        let _ = boundary.handle_message(&Message::char('x'));
        boundary.reset();
        assert!(!boundary.is_failed());
        assert!(boundary.error().is_none());
    }

    #[test]
    fn inner_is_exposed_as_only_child() {
        let boundary = ErrorBoundary::new(Label::new("x"), "label");
        assert_eq!(boundary.children().len(), 1);
    }
}
