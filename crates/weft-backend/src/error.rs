#![forbid(unsafe_code)]

use std::fmt;
use std::io;

/// Failure reported by a backend or its event source.
///
/// Every variant is fatal to the dispatch loop: a terminal UI cannot keep
/// running once its terminal is gone or refuses writes.
#[derive(Debug)]
pub enum BackendError {
    /// An I/O operation on the terminal failed.
    Io(io::Error),
    /// Standard input/output is not attached to a terminal.
    NotATerminal,
    /// The input side closed; no further events will arrive.
    Disconnected,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "terminal I/O error: {e}"),
            Self::NotATerminal => write!(f, "not attached to a terminal"),
            Self::Disconnected => write!(f, "event source disconnected"),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::NotATerminal | Self::Disconnected => None,
        }
    }
}

impl From<io::Error> for BackendError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
