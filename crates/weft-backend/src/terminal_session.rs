#![forbid(unsafe_code)]

//! Terminal session lifecycle guard.
//!
//! [`TerminalSession`] enters raw mode and the requested terminal modes on
//! construction and undoes them on drop, in reverse order. Cleanup also runs
//! from a panic hook and on SIGINT/SIGTERM, so the user's shell is never left
//! in raw mode.
//!
//! # Cleanup Order
//!
//! 1. Disable bracketed paste (if enabled)
//! 2. Disable mouse capture (if enabled)
//! 3. Show cursor (always)
//! 4. Leave alternate screen (if enabled)
//! 5. Exit raw mode (always)
//! 6. Flush stdout

use std::io::{self, Write};
use std::sync::OnceLock;

#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGWINCH};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// Which terminal modes a session enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalOptions {
    /// Switch to the alternate screen (`CSI ? 1049 h`) and restore the
    /// original screen on exit.
    pub alternate_screen: bool,
    /// Report mouse events (`CSI ? 1000;1002;1006 h`).
    pub mouse_capture: bool,
    /// Deliver pastes as a single paste event (`CSI ? 2004 h`).
    pub bracketed_paste: bool,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            mouse_capture: false,
            bracketed_paste: true,
        }
    }
}

impl TerminalOptions {
    /// Raw mode only: no alternate screen, mouse, or paste handling.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            alternate_screen: false,
            mouse_capture: false,
            bracketed_paste: false,
        }
    }

    #[must_use]
    pub fn with_alternate_screen(mut self, enabled: bool) -> Self {
        self.alternate_screen = enabled;
        self
    }

    #[must_use]
    pub fn with_mouse_capture(mut self, enabled: bool) -> Self {
        self.mouse_capture = enabled;
        self
    }

    #[must_use]
    pub fn with_bracketed_paste(mut self, enabled: bool) -> Self {
        self.bracketed_paste = enabled;
        self
    }
}

/// Owns raw mode and the enabled terminal modes until dropped.
///
/// Only one session should exist at a time.
#[derive(Debug)]
pub struct TerminalSession {
    options: TerminalOptions,
    alternate_screen_enabled: bool,
    mouse_enabled: bool,
    bracketed_paste_enabled: bool,
    #[cfg(unix)]
    signal_guard: Option<SignalGuard>,
}

impl TerminalSession {
    /// Enter raw mode and enable the requested modes.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode or any requested mode cannot be enabled.
    /// Modes enabled before the failure are undone when the partially built
    /// session is dropped.
    pub fn new(options: TerminalOptions) -> io::Result<Self> {
        install_panic_hook();

        crossterm::terminal::enable_raw_mode()?;
        tracing::info!("terminal raw mode enabled");

        let mut session = Self {
            options,
            alternate_screen_enabled: false,
            mouse_enabled: false,
            bracketed_paste_enabled: false,
            #[cfg(unix)]
            signal_guard: None,
        };

        #[cfg(unix)]
        {
            session.signal_guard = Some(SignalGuard::new()?);
        }

        let mut stdout = io::stdout();
        if options.alternate_screen {
            crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
            session.alternate_screen_enabled = true;
            tracing::info!("alternate screen enabled");
        }
        if options.mouse_capture {
            crossterm::execute!(stdout, crossterm::event::EnableMouseCapture)?;
            session.mouse_enabled = true;
            tracing::info!("mouse capture enabled");
        }
        if options.bracketed_paste {
            crossterm::execute!(stdout, crossterm::event::EnableBracketedPaste)?;
            session.bracketed_paste_enabled = true;
            tracing::info!("bracketed paste enabled");
        }

        Ok(session)
    }

    pub fn options(&self) -> &TerminalOptions {
        &self.options
    }

    /// Restore the terminal now instead of at drop. Idempotent.
    pub fn restore(&mut self) {
        #[cfg(unix)]
        let _ = self.signal_guard.take();

        let mut stdout = io::stdout();
        if self.bracketed_paste_enabled {
            let _ = crossterm::execute!(stdout, crossterm::event::DisableBracketedPaste);
            self.bracketed_paste_enabled = false;
            tracing::info!("bracketed paste disabled");
        }
        if self.mouse_enabled {
            let _ = crossterm::execute!(stdout, crossterm::event::DisableMouseCapture);
            self.mouse_enabled = false;
            tracing::info!("mouse capture disabled");
        }
        let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
        if self.alternate_screen_enabled {
            let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
            self.alternate_screen_enabled = false;
            tracing::info!("alternate screen disabled");
        }
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = stdout.flush();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.restore();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

/// Undo every mode a session might have enabled, ignoring errors.
fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(stdout, crossterm::event::DisableBracketedPaste);
    let _ = crossterm::execute!(stdout, crossterm::event::DisableMouseCapture);
    let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
    let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}

/// Restores the terminal and exits on SIGINT/SIGTERM.
///
/// Resize notifications reach the runtime as crossterm resize events, so
/// SIGWINCH is only logged here.
#[cfg(unix)]
#[derive(Debug)]
struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    fn new() -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM, SIGWINCH]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("weft-signals".into())
            .spawn(move || {
                for signal in signals.forever() {
                    match signal {
                        SIGWINCH => tracing::debug!("SIGWINCH received"),
                        SIGINT | SIGTERM => {
                            tracing::warn!(signal, "termination signal received, cleaning up");
                            best_effort_cleanup();
                            std::process::exit(128 + signal);
                        }
                        _ => {}
                    }
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
