#![forbid(unsafe_code)]

//! The dispatch loop.
//!
//! [`Program::run`] owns the backend for the duration of a run:
//!
//! ```text
//!   input thread                       dispatch loop (caller's thread)
//!   ------------                       -------------------------------
//!   EventSource::poll_event  ──send──▶ bounded queue ──recv──▶ Screen::observe
//!         (blocks when full)                │                  Screen::handle_message
//!                                    tick boundary             apply commands
//!                                           └──▶ Message::Tick  Screen::render + flush
//! ```
//!
//! Each iteration dispatches exactly one message, interprets its commands in
//! order, and then runs one render pass. `Quit` moves the loop to
//! [`DispatchState::Draining`]: the current render pass completes, nothing
//! else is dequeued, and the loop stops.
//!
//! `SendMessage` puts its message back into the same queue without
//! blocking. When the queue is full the message waits in a local FIFO that is
//! flushed, in order, before the next receive.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, debug_span, error, info, info_span, trace, warn};
use weft_backend::{Backend, BackendError, flush_dirty};
use weft_core::command::Command;
use weft_core::event::Message;
use weft_render::buffer::Buffer;
use weft_widgets::Widget;

use crate::config::ProgramConfig;
use crate::producer::InputProducer;
use crate::queue::{self, Inbound, QueueReceiver, QueueSender, RecvError, TryPushError};
use crate::screen::Screen;

/// Lifecycle of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    /// Dequeuing and dispatching messages.
    Running,
    /// Quit was requested; finishing the current render pass.
    Draining,
    /// Not running.
    #[default]
    Stopped,
}

/// Counters reported by [`Program::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Loop iterations. Each dispatches one message or tick.
    pub iterations: u64,
    /// Non-tick messages dispatched.
    pub messages: u64,
    /// Tick messages dispatched.
    pub ticks: u64,
    /// Render passes flushed to the backend, including the initial frame.
    pub frames: u64,
    /// Messages re-injected by `SendMessage`.
    pub requeued: u64,
}

/// A widget tree bound to a backend.
pub struct Program<B: Backend> {
    backend: B,
    screen: Screen,
    config: ProgramConfig,
    front: Buffer,
    state: DispatchState,
}

impl<B: Backend> std::fmt::Debug for Program<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("screen", &self.screen)
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Program<B> {
    /// Bind `root` to `backend` with the default configuration.
    pub fn new(backend: B, root: impl Widget + 'static) -> Self {
        Self::with_config(backend, Box::new(root), ProgramConfig::default())
    }

    pub fn with_config(backend: B, root: Box<dyn Widget>, config: ProgramConfig) -> Self {
        let mut screen = Screen::new(0, 0).with_auto_register_focus(config.auto_register_focus);
        screen.set_root(root);
        Self {
            backend,
            screen,
            config,
            front: Buffer::new(0, 0),
            state: DispatchState::Stopped,
        }
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run until a `Quit` command or a backend failure.
    ///
    /// The backend is initialized first; if that fails the error is returned
    /// immediately. Once initialized, `fini` is always attempted before
    /// returning.
    pub fn run(&mut self) -> Result<RunSummary, BackendError> {
        let tick_ms = u64::try_from(self.config.tick_rate.as_millis()).unwrap_or(u64::MAX);
        let span = info_span!(
            "weft.program",
            tick_ms,
            queue_capacity = self.config.queue_capacity
        );
        let _guard = span.enter();

        if let Err(err) = self.backend.init() {
            error!(%err, "backend init failed");
            return Err(err);
        }
        self.state = DispatchState::Running;
        let result = self.run_initialized();
        self.state = DispatchState::Stopped;

        let fini = self.backend.fini();
        match result {
            Ok(summary) => {
                fini?;
                info!(
                    iterations = summary.iterations,
                    messages = summary.messages,
                    ticks = summary.ticks,
                    frames = summary.frames,
                    "program stopped"
                );
                Ok(summary)
            }
            Err(err) => {
                if let Err(fini_err) = fini {
                    warn!(err = %fini_err, "backend fini failed after error");
                }
                error!(%err, "program stopped with error");
                Err(err)
            }
        }
    }

    fn run_initialized(&mut self) -> Result<RunSummary, BackendError> {
        let mut summary = RunSummary::default();

        self.backend.hide_cursor()?;
        let (width, height) = self.backend.size()?;
        self.screen.resize(width, height);
        self.front = Buffer::new(width, height);

        let source = self.backend.event_source()?;
        let (tx, rx) = queue::bounded(self.config.queue_capacity);
        let producer = InputProducer::spawn(source, tx.clone(), self.config.poll_timeout)?;
        info!(width, height, "dispatch loop started");

        let outcome = self
            .render_frame(&mut summary)
            .and_then(|()| self.dispatch_until_stopped(&rx, &tx, &mut summary));

        drop(rx);
        producer.stop();
        outcome.map(|()| summary)
    }

    fn dispatch_until_stopped(
        &mut self,
        rx: &QueueReceiver,
        tx: &QueueSender,
        summary: &mut RunSummary,
    ) -> Result<(), BackendError> {
        let mut deferred = VecDeque::new();
        let mut next_tick = Instant::now() + self.config.tick_rate;

        while self.state == DispatchState::Running {
            summary.iterations += 1;
            let span = debug_span!(
                "weft.dispatch",
                iteration = summary.iterations,
                msg_type = tracing::field::Empty
            );
            let _guard = span.enter();

            flush_deferred(tx, &mut deferred);
            let msg = self.next_message(rx, &mut next_tick)?;
            span.record("msg_type", msg.kind_name());
            if msg.is_tick() {
                summary.ticks += 1;
            } else {
                summary.messages += 1;
            }

            self.screen.observe(&msg);
            let result = self.screen.handle_message(&msg);
            let quit = apply_commands(&mut self.screen, result.commands, |msg| {
                summary.requeued += 1;
                requeue(tx, &mut deferred, msg);
            });
            if quit {
                self.state = DispatchState::Draining;
            }

            self.render_frame(summary)?;

            if self.state == DispatchState::Draining {
                debug!(dropped_deferred = deferred.len(), "draining complete");
                self.state = DispatchState::Stopped;
            }
        }
        Ok(())
    }

    /// Wait for the next inbound message or tick boundary, whichever is first.
    fn next_message(
        &self,
        rx: &QueueReceiver,
        next_tick: &mut Instant,
    ) -> Result<Message, BackendError> {
        let inbound = if self.config.ticks_enabled() {
            let now = Instant::now();
            if now >= *next_tick {
                None
            } else {
                match rx.recv_timeout(*next_tick - now) {
                    Ok(item) => Some(item),
                    Err(RecvError::Timeout) => None,
                    Err(RecvError::Disconnected) => return Err(BackendError::Disconnected),
                }
            }
        } else {
            Some(rx.recv().map_err(|_| BackendError::Disconnected)?)
        };

        match inbound {
            Some(Inbound::Message(msg)) => Ok(msg),
            Some(Inbound::SourceFailed(err)) => Err(err),
            None => {
                *next_tick = next_boundary(*next_tick, self.config.tick_rate, Instant::now());
                Ok(Message::tick_now())
            }
        }
    }

    fn render_frame(&mut self, summary: &mut RunSummary) -> Result<(), BackendError> {
        self.screen.render();
        let stats = flush_dirty(&mut self.backend, &mut self.front, self.screen.buffer_mut())?;
        summary.frames += 1;
        trace!(
            cells = stats.cells_written,
            full = stats.full,
            "frame presented"
        );
        Ok(())
    }
}

#[cfg(feature = "crossterm")]
impl Program<weft_backend::CrosstermBackend> {
    /// Bind `root` to the process terminal.
    pub fn terminal(root: impl Widget + 'static, config: ProgramConfig) -> Self {
        let backend = weft_backend::CrosstermBackend::new(config.terminal_options());
        Self::with_config(backend, Box::new(root), config)
    }
}

/// Next tick deadline after `previous`. Missed boundaries are skipped rather
/// than delivered in a burst.
fn next_boundary(previous: Instant, rate: Duration, now: Instant) -> Instant {
    let next = previous + rate;
    if next <= now { now + rate } else { next }
}

/// Interpret `commands` in order against `screen`.
///
/// Batches are expanded depth-first and nothing after the first `Quit` is
/// applied. Returns true if `Quit` was reached.
pub(crate) fn apply_commands(
    screen: &mut Screen,
    commands: Vec<Command>,
    mut requeue: impl FnMut(Message),
) -> bool {
    if commands.is_empty() {
        return false;
    }
    for cmd in Command::Batch(commands).flatten() {
        match cmd {
            Command::Quit => {
                info!("quit requested");
                return true;
            }
            Command::Refresh => {
                debug!("full refresh requested");
                screen.mark_all_dirty();
            }
            Command::SendMessage(msg) => requeue(msg),
            Command::FocusNext => {
                screen.focus_next();
            }
            Command::FocusPrev => {
                screen.focus_prev();
            }
            // `flatten` never yields a batch.
            Command::Batch(_) => {}
        }
    }
    false
}

fn requeue(tx: &QueueSender, deferred: &mut VecDeque<Message>, msg: Message) {
    if !deferred.is_empty() {
        deferred.push_back(msg);
        return;
    }
    match tx.try_send(msg) {
        Ok(()) => {}
        Err(TryPushError::Full(msg)) => {
            deferred.push_back(msg);
            debug!(deferred = deferred.len(), "queue full, deferring requeued message");
        }
        Err(TryPushError::Closed(_)) => warn!("queue closed, dropping requeued message"),
    }
}

fn flush_deferred(tx: &QueueSender, deferred: &mut VecDeque<Message>) {
    while let Some(msg) = deferred.pop_front() {
        match tx.try_send(msg) {
            Ok(()) => {}
            Err(TryPushError::Full(msg)) => {
                deferred.push_front(msg);
                break;
            }
            Err(TryPushError::Closed(_)) => {
                deferred.clear();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_widgets::{Label, Stack};

    fn screen() -> Screen {
        let mut screen = Screen::new(10, 2);
        screen.set_root(Box::new(
            Stack::vertical()
                .child(Label::new("a").focusable(true))
                .child(Label::new("b").focusable(true)),
        ));
        screen.render();
        screen
    }

    #[test]
    fn commands_after_quit_are_skipped() {
        let mut screen = screen();
        let mut sent = Vec::new();
        let quit = apply_commands(
            &mut screen,
            vec![
                Command::send_custom(1u8),
                Command::Quit,
                Command::send_custom(2u8),
            ],
            |msg| sent.push(msg),
        );
        assert!(quit);
        assert_eq!(sent.len(), 1);
    }

    #[test]
    fn nested_batches_apply_in_order() {
        let mut screen = screen();
        let mut sent = Vec::new();
        let inner = Command::Batch(vec![Command::FocusNext, Command::send_custom("x")]);
        let quit = apply_commands(&mut screen, vec![inner, Command::Refresh], |msg| {
            sent.push(msg)
        });
        assert!(!quit);
        assert_eq!(sent.len(), 1);
        assert_eq!(screen.focused_path(), Some(&vec![1]));
        assert!(screen.buffer().is_fully_dirty());
    }

    #[test]
    fn focus_prev_wraps() {
        let mut screen = screen();
        apply_commands(&mut screen, vec![Command::FocusPrev], |_| {});
        assert_eq!(screen.focused_path(), Some(&vec![1]));
    }

    #[test]
    fn requeue_defers_when_full_and_flushes_in_order() {
        let (tx, rx) = queue::bounded(1);
        let mut deferred = VecDeque::new();
        for n in 0..3u32 {
            requeue(&tx, &mut deferred, Message::custom(n));
        }
        assert_eq!(deferred.len(), 2);

        let mut seen = Vec::new();
        while seen.len() < 3 {
            flush_deferred(&tx, &mut deferred);
            match rx.try_recv() {
                Some(Inbound::Message(Message::Custom(c))) => {
                    seen.push(*c.downcast_ref::<u32>().unwrap());
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(seen, vec![0, 1, 2]);
        assert!(deferred.is_empty());
    }

    #[test]
    fn missed_tick_boundaries_are_skipped() {
        let start = Instant::now();
        let rate = Duration::from_millis(10);
        assert_eq!(next_boundary(start, rate, start), start + rate);
        let late = start + Duration::from_millis(55);
        assert_eq!(next_boundary(start, rate, late), late + rate);
    }

    #[test]
    fn default_state_is_stopped() {
        assert_eq!(DispatchState::default(), DispatchState::Stopped);
    }
}
