#![forbid(unsafe_code)]

//! Weft runtime: the screen and the dispatch loop.
//!
//! - [`Screen`] owns the widget tree, the back buffer, and focus, and routes
//!   messages into the tree.
//! - [`Program`] binds a screen to a [`Backend`](weft_backend::Backend) and
//!   runs the single-threaded dispatch loop, fed by an input producer thread
//!   through a bounded queue.
//! - [`ScreenSimulator`] drives a screen without threads or a backend, for
//!   tests.

pub mod config;
pub mod focus;
mod producer;
pub mod program;
pub mod queue;
pub mod screen;
pub mod simulator;

pub use config::ProgramConfig;
pub use focus::{FocusChange, FocusScope};
pub use program::{DispatchState, Program, RunSummary};
pub use screen::Screen;
pub use simulator::{CmdRecord, ScreenSimulator};
