#![forbid(unsafe_code)]

//! Deterministic screen simulator for testing.
//!
//! `ScreenSimulator` drives a [`Screen`] the way the dispatch loop does
//! (observe, handle, apply commands, render) but on the calling thread with
//! no backend and no queue bounds. Re-injected messages are processed after
//! the message that produced them.
//!
//! ```
//! use weft_core::event::Message;
//! use weft_runtime::simulator::ScreenSimulator;
//! use weft_widgets::Label;
//!
//! let mut sim = ScreenSimulator::new(8, 1, Label::new("hi"));
//! sim.inject_event(Message::char('x'));
//! assert_eq!(sim.text(), "hi");
//! ```

use std::collections::VecDeque;

use weft_core::command::Command;
use weft_core::event::Message;
use weft_render::buffer::Buffer;
use weft_widgets::Widget;

use crate::program::apply_commands;
use crate::screen::Screen;

/// Record of a command applied during simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdRecord {
    Quit,
    Refresh,
    /// A message was re-injected.
    Msg,
    FocusNext,
    FocusPrev,
}

/// Thread-free driver for a [`Screen`].
#[derive(Debug)]
pub struct ScreenSimulator {
    screen: Screen,
    pending: VecDeque<Message>,
    frames: Vec<Buffer>,
    command_log: Vec<CmdRecord>,
    running: bool,
    render_count: usize,
}

impl ScreenSimulator {
    /// A `width` x `height` screen with `root` mounted and rendered once.
    pub fn new(width: u16, height: u16, root: impl Widget + 'static) -> Self {
        Self::from_screen(Screen::new(width, height), Box::new(root))
    }

    /// Use a preconfigured screen.
    pub fn from_screen(mut screen: Screen, root: Box<dyn Widget>) -> Self {
        screen.set_root(root);
        let mut sim = Self {
            screen,
            pending: VecDeque::new(),
            frames: Vec::new(),
            command_log: Vec::new(),
            running: true,
            render_count: 0,
        };
        sim.render();
        sim
    }

    /// Dispatch `events` in order, each followed by any messages it
    /// re-injected. Stops early once a `Quit` is applied.
    pub fn inject_events(&mut self, events: &[Message]) {
        for event in events {
            if !self.running {
                break;
            }
            self.pending.push_back(event.clone());
            self.drain();
        }
    }

    pub fn inject_event(&mut self, event: Message) {
        self.inject_events(&[event]);
    }

    /// Dispatch a tick.
    pub fn tick(&mut self) {
        self.inject_event(Message::tick_now());
    }

    /// Dispatch a resize.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.inject_event(Message::Resize { width, height });
    }

    fn drain(&mut self) {
        while self.running
            && let Some(msg) = self.pending.pop_front()
        {
            self.step(&msg);
        }
    }

    fn step(&mut self, msg: &Message) {
        self.screen.observe(msg);
        let result = self.screen.handle_message(msg);
        let commands = Command::Batch(result.commands).flatten();
        self.command_log.extend(commands.iter().filter_map(|cmd| match cmd {
            Command::Quit => Some(CmdRecord::Quit),
            Command::Refresh => Some(CmdRecord::Refresh),
            Command::SendMessage(_) => Some(CmdRecord::Msg),
            Command::FocusNext => Some(CmdRecord::FocusNext),
            Command::FocusPrev => Some(CmdRecord::FocusPrev),
            Command::Batch(_) => None,
        }));

        let pending = &mut self.pending;
        if apply_commands(&mut self.screen, commands, |msg| pending.push_back(msg)) {
            self.running = false;
        }
        self.render();
    }

    /// Run a render pass. Returns true if widgets were repainted.
    pub fn render(&mut self) -> bool {
        self.render_count += 1;
        let painted = self.screen.render();
        self.screen.buffer_mut().clear_dirty();
        painted
    }

    /// Snapshot the current buffer and keep it.
    pub fn capture_frame(&mut self) -> &Buffer {
        self.frames.push(self.screen.buffer().clone());
        &self.frames[self.frames.len() - 1]
    }

    pub fn frames(&self) -> &[Buffer] {
        &self.frames
    }

    /// Render passes so far, including the initial one.
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    pub fn command_log(&self) -> &[CmdRecord] {
        &self.command_log
    }

    /// False once a `Quit` has been applied.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    /// Buffer contents as text, rows trimmed.
    pub fn text(&self) -> String {
        self.screen.text()
    }

    pub fn row_text(&self, y: u16) -> String {
        self.screen.buffer().row_text(y)
    }
}
