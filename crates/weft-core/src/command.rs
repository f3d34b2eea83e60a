#![forbid(unsafe_code)]

//! Outbound effect vocabulary.
//!
//! Widgets never act on the loop directly. They return [`Command`]s from
//! message handling and the dispatch loop interprets them once, in order.

use crate::event::Message;

/// An effect requested by a widget after handling a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Stop the dispatch loop after the current render pass.
    Quit,
    /// Repaint the whole buffer on the next flush.
    Refresh,
    /// Re-inject a message into the input queue, behind anything already queued.
    SendMessage(Message),
    /// Apply several commands in sequence.
    Batch(Vec<Command>),
    /// Move focus to the next focusable widget.
    FocusNext,
    /// Move focus to the previous focusable widget.
    FocusPrev,
}

impl Command {
    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    #[inline]
    pub fn refresh() -> Self {
        Self::Refresh
    }

    /// Re-inject a message.
    #[inline]
    pub fn send(msg: impl Into<Message>) -> Self {
        Self::SendMessage(msg.into())
    }

    /// Re-inject an application payload as [`Message::Custom`].
    #[inline]
    pub fn send_custom<T: std::any::Any + Send + Sync>(value: T) -> Self {
        Self::SendMessage(Message::custom(value))
    }

    /// Combine commands, collapsing trivial batches.
    ///
    /// Returns `None` for an empty list and the command itself for a
    /// singleton.
    pub fn batch(cmds: Vec<Command>) -> Option<Self> {
        match cmds.len() {
            0 => None,
            1 => cmds.into_iter().next(),
            _ => Some(Self::Batch(cmds)),
        }
    }

    /// Variant name for logging.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::Refresh => "Refresh",
            Self::SendMessage(_) => "SendMessage",
            Self::Batch(_) => "Batch",
            Self::FocusNext => "FocusNext",
            Self::FocusPrev => "FocusPrev",
        }
    }

    /// Expand nested batches into a flat, ordered list.
    ///
    /// Expansion stops after the first [`Command::Quit`]; anything queued
    /// behind a quit in the same batch is never applied.
    pub fn flatten(self) -> Vec<Command> {
        let mut out = Vec::new();
        flatten_into(self, &mut out);
        out
    }
}

/// Returns false once a `Quit` has been emitted.
fn flatten_into(cmd: Command, out: &mut Vec<Command>) -> bool {
    match cmd {
        Command::Batch(cmds) => {
            for cmd in cmds {
                if !flatten_into(cmd, out) {
                    return false;
                }
            }
            true
        }
        Command::Quit => {
            out.push(Command::Quit);
            false
        }
        other => {
            out.push(other);
            true
        }
    }
}
