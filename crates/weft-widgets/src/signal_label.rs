#![forbid(unsafe_code)]

//! A label bound to a [`Signal`].
//!
//! The subscription exists only while the widget is mounted: it is created in
//! [`Widget::mount`] and dropped in [`Widget::unmount`], so a detached label
//! never hears about changes and never keeps the screen awake.

use std::fmt;

use weft_core::event::Message;
use weft_core::geometry::{Constraints, Rect, Size};
use weft_core::signal::{Signal, Subscribable, Subscription};
use weft_render::cell::Style;

use crate::label::display_width;
use crate::{HandleResult, MountContext, RenderContext, Widget, WidgetCore};

type FormatFn<T> = Box<dyn Fn(&T) -> String>;

/// Renders `format(signal)` on one line and repaints when the signal changes.
pub struct SignalLabel<T: 'static> {
    core: WidgetCore,
    signal: Signal<T>,
    format: FormatFn<T>,
    style: Style,
    subscription: Option<Subscription>,
}

impl<T: 'static> SignalLabel<T> {
    #[must_use]
    pub fn new(signal: &Signal<T>, format: impl Fn(&T) -> String + 'static) -> Self {
        Self {
            core: WidgetCore::new(),
            signal: signal.clone(),
            format: Box::new(format),
            style: Style::DEFAULT,
            subscription: None,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// The text as it would be rendered now.
    pub fn text(&self) -> String {
        self.signal.with(|value| (self.format)(value))
    }

    /// True while mounted.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}

impl SignalLabel<String> {
    /// Show a string signal verbatim.
    #[must_use]
    pub fn from_text(signal: &Signal<String>) -> Self {
        Self::new(signal, String::clone)
    }
}

impl<T: 'static> fmt::Debug for SignalLabel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalLabel")
            .field("core", &self.core)
            .field("subscribed", &self.is_subscribed())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Widget for SignalLabel<T> {
    fn measure(&self, constraints: Constraints) -> Size {
        let width = u16::try_from(display_width(&self.text())).unwrap_or(u16::MAX);
        constraints.constrain(Size::new(width, 1))
    }

    fn layout(&mut self, bounds: Rect) {
        self.core.set_bounds(bounds);
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        let area = self.core.bounds();
        if area.is_empty() {
            return;
        }
        ctx.set_string(area.x, area.y, &self.text(), self.style);
    }

    fn handle_message(&mut self, _msg: &Message) -> HandleResult {
        HandleResult::unhandled()
    }

    fn bounds(&self) -> Rect {
        self.core.bounds()
    }

    fn mount(&mut self, ctx: &MountContext) {
        self.core.attach(ctx);
        let handle = self.core.invalidate_handle();
        self.subscription = Some(self.signal.subscribe(move || handle.invalidate()));
    }

    fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.core.detach();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Invalidator;
    use weft_render::buffer::Buffer;

    #[test]
    fn unmounted_label_does_not_subscribe() {
        let count = Signal::new(0);
        let label = SignalLabel::new(&count, |n| format!("Count: {n}"));
        assert!(!label.is_subscribed());
        assert_eq!(count.subscriber_count(), 0);
        assert_eq!(label.text(), "Count: 0");
    }

    #[test]
    fn mounted_label_invalidates_screen_on_change() {
        let count = Signal::new(0);
        let screen = Invalidator::new();
        let mut label = SignalLabel::new(&count, |n| format!("Count: {n}"));
        label.mount(&MountContext::new(screen.clone()));
        label.clear_dirty();
        screen.take();

        count.set(1);
        assert!(label.is_dirty());
        assert!(screen.is_invalidated());
        assert_eq!(label.text(), "Count: 1");
    }

    #[test]
    fn unmount_removes_subscription() {
        let count = Signal::new(0);
        let screen = Invalidator::new();
        let mut label = SignalLabel::new(&count, |n| format!("{n}"));
        label.mount(&MountContext::new(screen.clone()));
        assert_eq!(count.subscriber_count(), 1);

        label.unmount();
        label.clear_dirty();
        screen.take();
        assert_eq!(count.subscriber_count(), 0);

        count.set(5);
        assert!(!label.is_dirty());
        assert!(!screen.is_invalidated());
    }

    #[test]
    fn renders_current_value() {
        let name = Signal::new(String::from("weft"));
        let mut label = SignalLabel::from_text(&name);
        label.layout(Rect::new(0, 0, 6, 1));
        name.set(String::from("loom"));

        let mut buf = Buffer::new(6, 1);
        label.render(&mut RenderContext::new(&mut buf));
        assert_eq!(buf.row_text(0), "loom  ");
    }
}
