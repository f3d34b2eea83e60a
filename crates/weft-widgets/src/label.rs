#![forbid(unsafe_code)]

//! Single-line text widget.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use weft_core::event::Message;
use weft_core::geometry::{Constraints, Rect, Size};
use weft_render::cell::Style;

use crate::{HandleResult, MountContext, RenderContext, Widget, WidgetCore};

/// Display width of `text` in terminal columns, summed per grapheme.
pub fn display_width(text: &str) -> usize {
    text.graphemes(true).map(UnicodeWidthStr::width).sum()
}

/// One line of styled text, truncated at its right edge.
#[derive(Debug)]
pub struct Label {
    core: WidgetCore,
    text: String,
    style: Style,
    focus_style: Style,
    focusable: bool,
}

impl Label {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            core: WidgetCore::new(),
            text: text.into(),
            style: Style::DEFAULT,
            focus_style: Style::new().reverse(),
            focusable: false,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Style patched over the base style while the label has focus.
    #[must_use]
    pub fn with_focus_style(mut self, style: Style) -> Self {
        self.focus_style = style;
        self
    }

    #[must_use]
    pub fn focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text, invalidating only if it changed.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.core.invalidate();
        }
    }

    pub fn is_focused(&self) -> bool {
        self.core.is_focused()
    }
}

impl Widget for Label {
    fn measure(&self, constraints: Constraints) -> Size {
        let width = u16::try_from(display_width(&self.text)).unwrap_or(u16::MAX);
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
        let mut style = self.style;
        if self.core.is_focused() {
            style = style.patch(self.focus_style);
        }
        ctx.set_string(area.x, area.y, &self.text, style);
    }

    fn handle_message(&mut self, _msg: &Message) -> HandleResult {
        HandleResult::unhandled()
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

    fn invalidate(&self) {
        self.core.invalidate();
    }

    fn is_dirty(&self) -> bool {
        self.core.is_dirty()
    }

    fn clear_dirty(&self) {
        self.core.clear_dirty();
    }

    fn is_focusable(&self) -> bool {
        self.focusable
    }

    fn set_focused(&mut self, focused: bool) {
        self.core.set_focused(focused);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_render::buffer::Buffer;
    use weft_render::cell::StyleFlags;

    fn render(label: &Label, width: u16) -> Buffer {
        let mut buf = Buffer::new(width, 1);
        label.render(&mut RenderContext::new(&mut buf));
        buf
    }

    #[test]
    fn measure_uses_display_width() {
        let label = Label::new("a世b");
        assert_eq!(label.measure(Constraints::unbounded()), Size::new(4, 1));
        assert_eq!(
            label.measure(Constraints::loose(Size::new(2, 5))),
            Size::new(2, 1)
        );
    }

    #[test]
    fn renders_text_truncated_to_bounds() {
        let mut label = Label::new("hello world");
        label.layout(Rect::new(0, 0, 5, 1));
        let mut buf = Buffer::new(8, 1);
        {
            let mut ctx = RenderContext::new(&mut buf);
            ctx.render_child(&label);
        }
        assert_eq!(buf.row_text(0), "hello   ");
    }

    #[test]
    fn empty_bounds_render_nothing() {
        let label = Label::new("x");
        let buf = render(&label, 3);
        assert_eq!(buf.row_text(0), "   ");
    }

    #[test]
    fn set_text_invalidates_only_on_change() {
        let mut label = Label::new("a");
        label.clear_dirty();
        label.set_text("a");
        assert!(!label.is_dirty());
        label.set_text("b");
        assert!(label.is_dirty());
        assert_eq!(label.text(), "b");
    }

    #[test]
    fn focused_label_is_reversed() {
        let mut label = Label::new("x").focusable(true);
        label.layout(Rect::new(0, 0, 1, 1));
        label.set_focused(true);
        let buf = render(&label, 1);
        assert!(buf.get(0, 0).style.flags.contains(StyleFlags::REVERSE));
    }

    #[test]
    fn display_width_counts_graphemes() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("e\u{301}"), 1);
        assert_eq!(display_width("世界"), 4);
    }
}
