#![forbid(unsafe_code)]

//! In-memory backend for deterministic tests.
//!
//! [`HeadlessBackend`] records every `set_content` call, keeps a character
//! grid of what the "terminal" shows, and counts frames. Input is scripted:
//! queue messages before or during a run and the event source hands them out
//! in order.
//!
//! Clones share state, so a test can give one handle to the runtime and
//! inspect the other afterwards.
//!
//! ```
//! use weft_backend::{Backend, HeadlessBackend};
//! use weft_core::event::Message;
//!
//! let backend = HeadlessBackend::new(10, 2).with_events([Message::char('q')]);
//! let observer = backend.clone();
//! assert_eq!(observer.pending_events(), 1);
//! assert_eq!(backend.size().unwrap(), (10, 2));
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use weft_core::event::Message;
use weft_render::cell::Style;

use crate::{Backend, BackendError, EventSource};

/// One recorded `set_content` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentWrite {
    pub x: u16,
    pub y: u16,
    pub ch: char,
    pub combining: Vec<char>,
    pub style: Style,
}

#[derive(Debug)]
struct OutputState {
    width: u16,
    height: u16,
    screen: Vec<char>,
    writes: Vec<ContentWrite>,
    show_count: usize,
    init_count: usize,
    fini_count: usize,
    cursor_hidden: bool,
    fail_writes: bool,
}

impl OutputState {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            screen: vec![' '; width as usize * height as usize],
            writes: Vec::new(),
            show_count: 0,
            init_count: 0,
            fini_count: 0,
            cursor_hidden: false,
            fail_writes: false,
        }
    }

    fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = y as usize * self.width as usize;
        self.screen[start..start + self.width as usize]
            .iter()
            .collect()
    }

    fn write_error() -> BackendError {
        BackendError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "headless backend configured to fail writes",
        ))
    }
}

#[derive(Debug, Default)]
struct InputState {
    events: VecDeque<Message>,
    disconnected: bool,
}

#[derive(Debug, Default)]
struct InputChannel {
    state: Mutex<InputState>,
    ready: Condvar,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A terminal that lives in memory.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    output: Arc<Mutex<OutputState>>,
    input: Arc<InputChannel>,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            output: Arc::new(Mutex::new(OutputState::new(width, height))),
            input: Arc::new(InputChannel::default()),
        }
    }

    /// Queue scripted input (builder form).
    #[must_use]
    pub fn with_events(self, events: impl IntoIterator<Item = Message>) -> Self {
        self.push_events(events);
        self
    }

    /// Queue one input message.
    pub fn push_event(&self, msg: Message) {
        self.push_events([msg]);
    }

    pub fn push_events(&self, events: impl IntoIterator<Item = Message>) {
        lock(&self.input.state).events.extend(events);
        self.input.ready.notify_all();
    }

    /// Messages queued but not yet polled.
    pub fn pending_events(&self) -> usize {
        lock(&self.input.state).events.len()
    }

    /// Make the event source fail with [`BackendError::Disconnected`] once
    /// the queued messages are drained.
    pub fn disconnect(&self) {
        lock(&self.input.state).disconnected = true;
        self.input.ready.notify_all();
    }

    /// Change the reported size and queue the matching resize message.
    pub fn resize(&self, width: u16, height: u16) {
        {
            let mut output = lock(&self.output);
            let writes = std::mem::take(&mut output.writes);
            let mut fresh = OutputState::new(width, height);
            fresh.writes = writes;
            fresh.show_count = output.show_count;
            fresh.init_count = output.init_count;
            fresh.fini_count = output.fini_count;
            fresh.cursor_hidden = output.cursor_hidden;
            fresh.fail_writes = output.fail_writes;
            *output = fresh;
        }
        self.push_event(Message::Resize { width, height });
    }

    /// Make `set_content` and `show` fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        lock(&self.output).fail_writes = fail;
    }

    /// Every `set_content` call so far.
    pub fn writes(&self) -> Vec<ContentWrite> {
        lock(&self.output).writes.clone()
    }

    /// Drain the write log.
    pub fn take_writes(&self) -> Vec<ContentWrite> {
        std::mem::take(&mut lock(&self.output).writes)
    }

    /// Number of presented frames.
    pub fn show_count(&self) -> usize {
        lock(&self.output).show_count
    }

    pub fn init_count(&self) -> usize {
        lock(&self.output).init_count
    }

    pub fn fini_count(&self) -> usize {
        lock(&self.output).fini_count
    }

    pub fn is_cursor_hidden(&self) -> bool {
        lock(&self.output).cursor_hidden
    }

    /// Row `y` of the terminal grid, untrimmed.
    pub fn row_text(&self, y: u16) -> String {
        lock(&self.output).row_text(y)
    }

    /// Whole terminal grid, rows trimmed and joined with newlines.
    pub fn screen_text(&self) -> String {
        let output = lock(&self.output);
        let rows: Vec<String> = (0..output.height)
            .map(|y| output.row_text(y).trim_end().to_string())
            .collect();
        let text = rows.join("\n");
        text.trim_end_matches('\n').to_string()
    }
}

impl Backend for HeadlessBackend {
    fn init(&mut self) -> Result<(), BackendError> {
        lock(&self.output).init_count += 1;
        Ok(())
    }

    fn fini(&mut self) -> Result<(), BackendError> {
        lock(&self.output).fini_count += 1;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16), BackendError> {
        let output = lock(&self.output);
        Ok((output.width, output.height))
    }

    fn set_content(
        &mut self,
        x: u16,
        y: u16,
        ch: char,
        combining: &[char],
        style: Style,
    ) -> Result<(), BackendError> {
        let mut output = lock(&self.output);
        if output.fail_writes {
            return Err(OutputState::write_error());
        }
        if x < output.width && y < output.height {
            let index = y as usize * output.width as usize + x as usize;
            output.screen[index] = ch;
        }
        output.writes.push(ContentWrite {
            x,
            y,
            ch,
            combining: combining.to_vec(),
            style,
        });
        Ok(())
    }

    fn show(&mut self) -> Result<(), BackendError> {
        let mut output = lock(&self.output);
        if output.fail_writes {
            return Err(OutputState::write_error());
        }
        output.show_count += 1;
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<(), BackendError> {
        lock(&self.output).cursor_hidden = true;
        Ok(())
    }

    fn event_source(&mut self) -> Result<Box<dyn EventSource>, BackendError> {
        Ok(Box::new(HeadlessEventSource {
            input: Arc::clone(&self.input),
        }))
    }
}

/// Input half of [`HeadlessBackend`].
#[derive(Debug)]
pub struct HeadlessEventSource {
    input: Arc<InputChannel>,
}

impl EventSource for HeadlessEventSource {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<Message>, BackendError> {
        let deadline = Instant::now() + timeout;
        let mut state = lock(&self.input.state);
        loop {
            if let Some(msg) = state.events.pop_front() {
                return Ok(Some(msg));
            }
            if state.disconnected {
                return Err(BackendError::Disconnected);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            state = self
                .input
                .ready
                .wait_timeout(state, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use weft_render::cell::PackedRgba;

    #[test]
    fn clones_share_output() {
        let mut backend = HeadlessBackend::new(3, 1);
        let observer = backend.clone();
        let style = Style::new().fg(PackedRgba::RED);
        backend.set_content(1, 0, 'x', &[], style).unwrap();
        backend.show().unwrap();

        assert_eq!(observer.row_text(0), " x ");
        assert_eq!(observer.show_count(), 1);
        assert_eq!(observer.writes()[0].style, style);
    }

    #[test]
    fn out_of_range_writes_are_logged_but_not_drawn() {
        let mut backend = HeadlessBackend::new(2, 1);
        backend.set_content(5, 5, 'x', &[], Style::DEFAULT).unwrap();
        assert_eq!(backend.screen_text(), "");
        assert_eq!(backend.writes().len(), 1);
    }

    #[test]
    fn scripted_events_arrive_in_order() {
        let mut backend =
            HeadlessBackend::new(1, 1).with_events([Message::char('a'), Message::char('b')]);
        let mut source = backend.event_source().unwrap();
        let timeout = Duration::from_millis(10);
        assert_eq!(source.poll_event(timeout).unwrap(), Some(Message::char('a')));
        assert_eq!(source.poll_event(timeout).unwrap(), Some(Message::char('b')));
        assert_eq!(source.poll_event(timeout).unwrap(), None);
    }

    #[test]
    fn poll_wakes_up_for_late_events() {
        let mut backend = HeadlessBackend::new(1, 1);
        let mut source = backend.event_source().unwrap();
        let pusher = backend.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            pusher.push_event(Message::char('z'));
        });
        let got = source.poll_event(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
        assert_eq!(got, Some(Message::char('z')));
    }

    #[test]
    fn disconnect_after_drain() {
        let mut backend = HeadlessBackend::new(1, 1).with_events([Message::char('a')]);
        backend.disconnect();
        let mut source = backend.event_source().unwrap();
        assert!(source.poll_event(Duration::ZERO).unwrap().is_some());
        assert!(matches!(
            source.poll_event(Duration::ZERO),
            Err(BackendError::Disconnected)
        ));
    }

    #[test]
    fn resize_updates_size_and_queues_message() {
        let backend = HeadlessBackend::new(4, 2);
        backend.resize(8, 3);
        assert_eq!(backend.size().unwrap(), (8, 3));
        assert_eq!(backend.pending_events(), 1);
        assert_eq!(backend.row_text(2), "        ");
    }
}
