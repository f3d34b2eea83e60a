#![forbid(unsafe_code)]

//! Weft public facade crate.
//!
//! Re-exports the common types from the member crates and offers a prelude
//! for day-to-day use.
//!
//! ```no_run
//! use weft::prelude::*;
//!
//! fn main() -> weft::Result<()> {
//!     let count = Signal::new(0);
//!     let root = Stack::vertical()
//!         .child(Label::new("press q to quit"))
//!         .child(SignalLabel::new(&count, |n| format!("Count: {n}")));
//!     weft::run(root)?;
//!     Ok(())
//! }
//! ```

// --- Core re-exports -------------------------------------------------------

pub use weft_core::command::Command;
pub use weft_core::event::{
    CustomMessage, KeyCode, KeyEvent, KeyEventKind, Message, Modifiers, MouseAction, MouseButton,
    MouseEvent, PasteEvent,
};
pub use weft_core::geometry::{Constraints, Rect, Sides, Size};
pub use weft_core::signal::{Computed, Effect, Signal, Subscribable, Subscription, batch};

// --- Render re-exports -----------------------------------------------------

pub use weft_render::buffer::Buffer;
pub use weft_render::cell::{Cell, PackedRgba, Style, StyleFlags};
pub use weft_render::diff::BufferDiff;

// --- Widget re-exports -----------------------------------------------------

pub use weft_widgets::{
    Direction, ErrorBoundary, HandleResult, Invalidator, Label, MountContext, RenderContext,
    SignalLabel, Stack, Widget, WidgetCore,
};

// --- Backend and runtime re-exports ------------------------------------------

pub use weft_backend::{Backend, EventSource, HeadlessBackend};
#[cfg(feature = "crossterm")]
pub use weft_backend::{CrosstermBackend, TerminalOptions};
pub use weft_runtime::{Program, ProgramConfig, RunSummary, Screen, ScreenSimulator};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for weft apps.
pub use weft_backend::BackendError as Error;

/// Standard result type for weft APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Run `root` on the process terminal until it quits.
///
/// Configuration comes from [`ProgramConfig::from_env`].
#[cfg(feature = "crossterm")]
pub fn run(root: impl Widget + 'static) -> Result<RunSummary> {
    Program::terminal(root, ProgramConfig::from_env()).run()
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Command, Effect, Error, HandleResult, KeyCode, KeyEvent, Label, Message, Program,
        ProgramConfig, Rect, Result, Signal, SignalLabel, Size, Stack, Style, Subscribable, Widget,
        batch,
    };

    pub use crate::{backend, core, render, runtime, widgets};
}

pub use weft_backend as backend;
pub use weft_core as core;
pub use weft_render as render;
pub use weft_runtime as runtime;
pub use weft_widgets as widgets;
