#![forbid(unsafe_code)]

//! Core: geometry, the message/command vocabulary, and reactive signals.

pub mod command;
pub mod event;
pub mod geometry;
pub mod logging;
pub mod signal;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, error, info, trace, trace_span, warn};
