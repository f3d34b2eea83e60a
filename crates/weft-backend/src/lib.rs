#![forbid(unsafe_code)]

//! Terminal backend contract.
//!
//! The runtime talks to the terminal only through two traits:
//!
//! - [`Backend`] brackets the session (`init`/`fini`), reports the size,
//!   accepts cell writes, and presents a frame with `show`.
//! - [`EventSource`] is the input half. It is `Send` so the runtime can move
//!   it onto the producer thread, where it blocks in `poll_event`.
//!
//! Two implementations ship with the crate: a crossterm terminal backend
//! (feature `crossterm`) and [`HeadlessBackend`], an in-memory backend that
//! records frames for tests.
//!
//! [`flush_dirty`] implements the core's side of the contract: after a render
//! pass, write every changed cell and call `show` once.

pub mod error;
pub mod headless;
pub mod present;

#[cfg(feature = "crossterm")]
pub mod terminal;
#[cfg(feature = "crossterm")]
pub mod terminal_session;

use std::time::Duration;

use weft_core::event::Message;
use weft_render::cell::Style;

pub use error::BackendError;
pub use headless::{ContentWrite, HeadlessBackend, HeadlessEventSource};
pub use present::{FlushStats, flush_dirty};

#[cfg(feature = "crossterm")]
pub use terminal::{CrosstermBackend, CrosstermEventSource};
#[cfg(feature = "crossterm")]
pub use terminal_session::{TerminalOptions, TerminalSession};

/// Input half of a backend.
pub trait EventSource: Send {
    /// Wait up to `timeout` for the next input event.
    ///
    /// Returns `Ok(None)` on timeout or for raw events with no message
    /// equivalent. An error means the source is unusable.
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<Message>, BackendError>;
}

/// Output half of a backend plus session lifecycle.
pub trait Backend {
    /// Enter raw mode and any configured terminal modes.
    fn init(&mut self) -> Result<(), BackendError>;

    /// Restore the terminal. Safe to call more than once.
    fn fini(&mut self) -> Result<(), BackendError>;

    /// Current terminal size as `(width, height)`.
    fn size(&self) -> Result<(u16, u16), BackendError>;

    /// Write one cell. `combining` holds zero-width marks drawn with `ch`.
    fn set_content(
        &mut self,
        x: u16,
        y: u16,
        ch: char,
        combining: &[char],
        style: Style,
    ) -> Result<(), BackendError>;

    /// Present everything written since the last `show`.
    fn show(&mut self) -> Result<(), BackendError>;

    fn hide_cursor(&mut self) -> Result<(), BackendError>;

    /// Hand out the input half. Called once, after `init`.
    fn event_source(&mut self) -> Result<Box<dyn EventSource>, BackendError>;
}
