#![forbid(unsafe_code)]

//! Crossterm-backed terminal.
//!
//! Cell writes are queued into a buffered stdout writer and reach the
//! terminal only on [`Backend::show`], so a frame is emitted as one burst.
//! Style changes are only queued when the style differs from the previous
//! cell's.

use std::io::{self, BufWriter, IsTerminal, Stdout, Write};
use std::time::Duration;

use crossterm::style::{Attribute, Color, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, queue, style};

use weft_core::event::Message;
use weft_render::cell::{PackedRgba, Style, StyleFlags};

use crate::terminal_session::{TerminalOptions, TerminalSession};
use crate::{Backend, BackendError, EventSource};

/// A real terminal driven through crossterm.
pub struct CrosstermBackend {
    options: TerminalOptions,
    session: Option<TerminalSession>,
    out: BufWriter<Stdout>,
    last_style: Option<Style>,
}

impl CrosstermBackend {
    #[must_use]
    pub fn new(options: TerminalOptions) -> Self {
        Self {
            options,
            session: None,
            out: BufWriter::with_capacity(64 * 1024, io::stdout()),
            last_style: None,
        }
    }

    pub fn options(&self) -> &TerminalOptions {
        &self.options
    }

    fn queue_style(&mut self, style: Style) -> io::Result<()> {
        if self.last_style == Some(style) {
            return Ok(());
        }
        queue!(self.out, SetAttribute(Attribute::Reset))?;
        queue!(
            self.out,
            SetForegroundColor(to_color(style.fg)),
            SetBackgroundColor(to_color(style.bg))
        )?;
        for (flag, attribute) in ATTRIBUTES {
            if style.flags.contains(flag) {
                queue!(self.out, SetAttribute(attribute))?;
            }
        }
        self.last_style = Some(style);
        Ok(())
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new(TerminalOptions::default())
    }
}

impl std::fmt::Debug for CrosstermBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrosstermBackend")
            .field("options", &self.options)
            .field("active", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

const ATTRIBUTES: [(StyleFlags, Attribute); 8] = [
    (StyleFlags::BOLD, Attribute::Bold),
    (StyleFlags::DIM, Attribute::Dim),
    (StyleFlags::ITALIC, Attribute::Italic),
    (StyleFlags::UNDERLINE, Attribute::Underlined),
    (StyleFlags::BLINK, Attribute::SlowBlink),
    (StyleFlags::REVERSE, Attribute::Reverse),
    (StyleFlags::STRIKETHROUGH, Attribute::CrossedOut),
    (StyleFlags::HIDDEN, Attribute::Hidden),
];

fn to_color(color: PackedRgba) -> Color {
    if color.is_default() {
        Color::Reset
    } else {
        Color::Rgb {
            r: color.r(),
            g: color.g(),
            b: color.b(),
        }
    }
}

impl Backend for CrosstermBackend {
    fn init(&mut self) -> Result<(), BackendError> {
        if self.session.is_some() {
            return Ok(());
        }
        if !io::stdout().is_terminal() || !io::stdin().is_terminal() {
            return Err(BackendError::NotATerminal);
        }
        self.session = Some(TerminalSession::new(self.options)?);
        self.last_style = None;
        Ok(())
    }

    fn fini(&mut self) -> Result<(), BackendError> {
        queue!(self.out, SetAttribute(Attribute::Reset), style::ResetColor)?;
        self.out.flush()?;
        if let Some(mut session) = self.session.take() {
            session.restore();
        }
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16), BackendError> {
        Ok(crossterm::terminal::size()?)
    }

    fn set_content(
        &mut self,
        x: u16,
        y: u16,
        ch: char,
        combining: &[char],
        cell_style: Style,
    ) -> Result<(), BackendError> {
        self.queue_style(cell_style)?;
        queue!(self.out, cursor::MoveTo(x, y), style::Print(ch))?;
        for mark in combining {
            queue!(self.out, style::Print(mark))?;
        }
        Ok(())
    }

    fn show(&mut self) -> Result<(), BackendError> {
        self.out.flush()?;
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<(), BackendError> {
        queue!(self.out, cursor::Hide)?;
        Ok(())
    }

    fn event_source(&mut self) -> Result<Box<dyn EventSource>, BackendError> {
        Ok(Box::new(CrosstermEventSource))
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.out.flush();
    }
}

/// Reads crossterm's global input queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermEventSource;

impl EventSource for CrosstermEventSource {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<Message>, BackendError> {
        if !crossterm::event::poll(timeout)? {
            return Ok(None);
        }
        let event = crossterm::event::read()?;
        Ok(Message::from_crossterm(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_color_maps_to_reset() {
        assert_eq!(to_color(PackedRgba::DEFAULT), Color::Reset);
        assert_eq!(
            to_color(PackedRgba::rgb(1, 2, 3)),
            Color::Rgb { r: 1, g: 2, b: 3 }
        );
    }

    #[test]
    fn every_style_flag_has_an_attribute() {
        let covered = ATTRIBUTES
            .iter()
            .fold(StyleFlags::empty(), |acc, (flag, _)| acc | *flag);
        assert_eq!(covered, StyleFlags::all());
    }

    #[test]
    fn event_source_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<CrosstermEventSource>();
    }
}
