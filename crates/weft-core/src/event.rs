#![forbid(unsafe_code)]

//! Inbound message vocabulary.
//!
//! A [`Message`] is anything that flows *into* the widget tree: keyboard,
//! mouse and paste input from the backend, terminal resizes, periodic ticks
//! from the dispatch loop, and application-defined payloads re-injected via
//! [`Command::SendMessage`](crate::command::Command::SendMessage).
//!
//! Messages are immutable once built and are `Send`, since they cross from
//! the input worker thread into the dispatch loop's queue.
//!
//! # Design Notes
//!
//! - Mouse coordinates are 0-indexed.
//! - `KeyEventKind` defaults to `Press` when the terminal cannot tell.
//! - Custom payloads compare by identity, not by value.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bitflags::bitflags;
#[cfg(feature = "crossterm")]
use crossterm::event as cte;

/// An inbound event delivered to the widget tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A keyboard event.
    Key(KeyEvent),

    /// A mouse event.
    Mouse(MouseEvent),

    /// Text pasted in one piece (bracketed paste).
    Paste(PasteEvent),

    /// The terminal was resized.
    Resize {
        /// New terminal width in columns.
        width: u16,
        /// New terminal height in rows.
        height: u16,
    },

    /// A periodic tick from the dispatch loop.
    Tick {
        /// When the tick boundary was reached.
        timestamp: Instant,
    },

    /// An application-defined payload.
    Custom(CustomMessage),
}

impl Message {
    /// Shorthand for a plain key press.
    #[must_use]
    pub const fn key(code: KeyCode) -> Self {
        Self::Key(KeyEvent::new(code))
    }

    /// Shorthand for a plain character key press.
    #[must_use]
    pub const fn char(c: char) -> Self {
        Self::key(KeyCode::Char(c))
    }

    /// Wrap an application value as a custom message.
    #[must_use]
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(CustomMessage::new(value))
    }

    /// A tick stamped with the current instant.
    #[must_use]
    pub fn tick_now() -> Self {
        Self::Tick {
            timestamp: Instant::now(),
        }
    }

    /// Returns true for messages produced by user input (key, mouse, paste).
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::Key(_) | Self::Mouse(_) | Self::Paste(_))
    }

    /// Returns true for tick messages.
    #[must_use]
    pub const fn is_tick(&self) -> bool {
        matches!(self, Self::Tick { .. })
    }

    /// Short variant name, used as a structured logging field.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Key(_) => "key",
            Self::Mouse(_) => "mouse",
            Self::Paste(_) => "paste",
            Self::Resize { .. } => "resize",
            Self::Tick { .. } => "tick",
            Self::Custom(_) => "custom",
        }
    }

    /// Convert a crossterm event into a [`Message`].
    ///
    /// Returns `None` for events outside the vocabulary (focus changes,
    /// unmapped keys).
    #[must_use]
    #[cfg(feature = "crossterm")]
    pub fn from_crossterm(event: cte::Event) -> Option<Self> {
        map_crossterm_event(event)
    }
}

impl From<KeyEvent> for Message {
    fn from(event: KeyEvent) -> Self {
        Self::Key(event)
    }
}

impl From<MouseEvent> for Message {
    fn from(event: MouseEvent) -> Self {
        Self::Mouse(event)
    }
}

/// Application-defined message payload.
///
/// The payload is shared behind an `Arc`, so cloning a message is cheap and
/// two clones of the same custom message compare equal.
#[derive(Clone)]
pub struct CustomMessage {
    payload: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl CustomMessage {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            payload: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Borrow the payload as `T`, if that is its type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.payload.is::<T>()
    }

    /// Rust type name of the payload.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for CustomMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomMessage").field(&self.type_name).finish()
    }
}

impl PartialEq for CustomMessage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key that was pressed. Printable keys carry their rune.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// Press, repeat, or release.
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A key press with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// The printable rune, if this is a character key.
    #[must_use]
    pub const fn rune(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) => Some(c),
            _ => None,
        }
    }

    /// Returns true if this is the given character with no Ctrl/Alt held.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        self.code == KeyCode::Char(c) && !self.modifiers.intersects(Modifiers::CTRL | Modifiers::ALT)
    }

    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    /// Shift+Tab.
    BackTab,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    /// Function key (F1-F24).
    F(u8),
    /// Ctrl+Space or Ctrl+@.
    Null,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

bitflags! {
    /// Modifier keys held during a key or mouse event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

/// A mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    /// Column (0-indexed).
    pub x: u16,
    /// Row (0-indexed).
    pub y: u16,
    /// Button involved, or [`MouseButton::None`] for plain motion.
    pub button: MouseButton,
    pub action: MouseAction,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    #[must_use]
    pub const fn new(x: u16, y: u16, button: MouseButton, action: MouseAction) -> Self {
        Self {
            x,
            y,
            button,
            action,
            modifiers: Modifiers::NONE,
        }
    }

    /// A left-button press, the most common case in tests.
    #[must_use]
    pub const fn click(x: u16, y: u16) -> Self {
        Self::new(x, y, MouseButton::Left, MouseAction::Press)
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }
}

/// Mouse button identifiers. Wheel motion is reported as a button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    #[default]
    None,
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    WheelLeft,
    WheelRight,
}

/// What the pointer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseAction {
    #[default]
    Press,
    Release,
    /// Motion with no button held.
    Move,
    /// Motion with a button held.
    Drag,
}

/// A paste event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    pub text: String,
}

impl PasteEvent {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[cfg(feature = "crossterm")]
fn map_crossterm_event(event: cte::Event) -> Option<Message> {
    match event {
        cte::Event::Key(key) => map_key_event(key).map(Message::Key),
        cte::Event::Mouse(mouse) => Some(Message::Mouse(map_mouse_event(mouse))),
        cte::Event::Resize(width, height) => Some(Message::Resize { width, height }),
        cte::Event::Paste(text) => Some(Message::Paste(PasteEvent::new(text))),
        cte::Event::FocusGained | cte::Event::FocusLost => None,
    }
}

#[cfg(feature = "crossterm")]
fn map_key_event(event: cte::KeyEvent) -> Option<KeyEvent> {
    let kind = match event.kind {
        cte::KeyEventKind::Press => KeyEventKind::Press,
        cte::KeyEventKind::Repeat => KeyEventKind::Repeat,
        cte::KeyEventKind::Release => KeyEventKind::Release,
    };
    Some(KeyEvent {
        code: map_key_code(event.code)?,
        modifiers: map_modifiers(event.modifiers),
        kind,
    })
}

#[cfg(feature = "crossterm")]
fn map_key_code(code: cte::KeyCode) -> Option<KeyCode> {
    Some(match code {
        cte::KeyCode::Char(c) => KeyCode::Char(c),
        cte::KeyCode::Enter => KeyCode::Enter,
        cte::KeyCode::Esc => KeyCode::Escape,
        cte::KeyCode::Backspace => KeyCode::Backspace,
        cte::KeyCode::Tab => KeyCode::Tab,
        cte::KeyCode::BackTab => KeyCode::BackTab,
        cte::KeyCode::Delete => KeyCode::Delete,
        cte::KeyCode::Insert => KeyCode::Insert,
        cte::KeyCode::Home => KeyCode::Home,
        cte::KeyCode::End => KeyCode::End,
        cte::KeyCode::PageUp => KeyCode::PageUp,
        cte::KeyCode::PageDown => KeyCode::PageDown,
        cte::KeyCode::Up => KeyCode::Up,
        cte::KeyCode::Down => KeyCode::Down,
        cte::KeyCode::Left => KeyCode::Left,
        cte::KeyCode::Right => KeyCode::Right,
        cte::KeyCode::F(n) => KeyCode::F(n),
        cte::KeyCode::Null => KeyCode::Null,
        _ => return None,
    })
}

#[cfg(feature = "crossterm")]
fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.intersects(
        cte::KeyModifiers::SUPER | cte::KeyModifiers::HYPER | cte::KeyModifiers::META,
    ) {
        mapped |= Modifiers::SUPER;
    }
    mapped
}

#[cfg(feature = "crossterm")]
fn map_mouse_event(event: cte::MouseEvent) -> MouseEvent {
    let (button, action) = match event.kind {
        cte::MouseEventKind::Down(b) => (map_mouse_button(b), MouseAction::Press),
        cte::MouseEventKind::Up(b) => (map_mouse_button(b), MouseAction::Release),
        cte::MouseEventKind::Drag(b) => (map_mouse_button(b), MouseAction::Drag),
        cte::MouseEventKind::Moved => (MouseButton::None, MouseAction::Move),
        cte::MouseEventKind::ScrollUp => (MouseButton::WheelUp, MouseAction::Press),
        cte::MouseEventKind::ScrollDown => (MouseButton::WheelDown, MouseAction::Press),
        cte::MouseEventKind::ScrollLeft => (MouseButton::WheelLeft, MouseAction::Press),
        cte::MouseEventKind::ScrollRight => (MouseButton::WheelRight, MouseAction::Press),
    };

    MouseEvent::new(event.column, event.row, button, action)
        .with_modifiers(map_modifiers(event.modifiers))
}

#[cfg(feature = "crossterm")]
fn map_mouse_button(button: cte::MouseButton) -> MouseButton {
    match button {
        cte::MouseButton::Left => MouseButton::Left,
        cte::MouseButton::Right => MouseButton::Right,
        cte::MouseButton::Middle => MouseButton::Middle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_rune() {
        assert_eq!(KeyEvent::new(KeyCode::Char('+')).rune(), Some('+'));
        assert_eq!(KeyEvent::new(KeyCode::Enter).rune(), None);
    }

    #[test]
    fn is_char_ignores_ctrl_chords() {
        let plain = KeyEvent::new(KeyCode::Char('q'));
        let chord = plain.with_modifiers(Modifiers::CTRL);
        assert!(plain.is_char('q'));
        assert!(!chord.is_char('q'));
        assert!(chord.ctrl());
    }

    #[test]
    fn shift_still_counts_as_char() {
        let event = KeyEvent::new(KeyCode::Char('Q')).with_modifiers(Modifiers::SHIFT);
        assert!(event.is_char('Q'));
        assert!(event.shift());
    }

    #[test]
    fn message_is_send_and_clone() {
        fn assert_send<T: Send + 'static>() {}
        assert_send::<Message>();

        let msg = Message::char('x');
        assert_eq!(msg.clone(), msg);
    }

    #[test]
    fn custom_message_downcasts() {
        #[derive(Debug, PartialEq)]
        struct Ping(u32);

        let msg = Message::custom(Ping(7));
        let Message::Custom(custom) = &msg else {
            panic!("expected custom message");
        };
        assert!(custom.is::<Ping>());
        assert_eq!(custom.downcast_ref::<Ping>(), Some(&Ping(7)));
        assert!(custom.downcast_ref::<String>().is_none());
        assert!(custom.type_name().ends_with("Ping"));
    }

    #[test]
    fn custom_messages_compare_by_identity() {
        let a = Message::custom(1u8);
        let b = Message::custom(1u8);
        assert_eq!(a.clone(), a);
        assert_ne!(a, b);
    }

    #[test]
    fn kind_names_cover_vocabulary() {
        assert_eq!(Message::char('a').kind_name(), "key");
        assert_eq!(Message::Mouse(MouseEvent::click(0, 0)).kind_name(), "mouse");
        assert_eq!(Message::Paste(PasteEvent::new("x")).kind_name(), "paste");
        assert_eq!(
            Message::Resize {
                width: 1,
                height: 1
            }
            .kind_name(),
            "resize"
        );
        assert_eq!(Message::tick_now().kind_name(), "tick");
        assert_eq!(Message::custom(()).kind_name(), "custom");
    }

    #[test]
    fn input_classification() {
        assert!(Message::char('a').is_input());
        assert!(Message::Paste(PasteEvent::new("p")).is_input());
        assert!(!Message::tick_now().is_input());
        assert!(Message::tick_now().is_tick());
    }

    #[test]
    fn mouse_click_defaults() {
        let event = MouseEvent::click(3, 4);
        assert_eq!(event.position(), (3, 4));
        assert_eq!(event.button, MouseButton::Left);
        assert_eq!(event.action, MouseAction::Press);
        assert_eq!(event.modifiers, Modifiers::NONE);
    }

    #[cfg(feature = "crossterm")]
    mod crossterm_mapping {
        use super::super::*;
        use crossterm::event as ct;

        fn key(code: ct::KeyCode, modifiers: ct::KeyModifiers) -> ct::Event {
            ct::Event::Key(ct::KeyEvent {
                code,
                modifiers,
                kind: ct::KeyEventKind::Press,
                state: ct::KeyEventState::NONE,
            })
        }

        #[test]
        fn maps_char_with_modifiers() {
            let mapped = Message::from_crossterm(key(
                ct::KeyCode::Char('c'),
                ct::KeyModifiers::CONTROL | ct::KeyModifiers::ALT,
            ))
            .expect("should map");
            let Message::Key(event) = mapped else {
                panic!("expected key");
            };
            assert_eq!(event.rune(), Some('c'));
            assert!(event.ctrl());
            assert!(event.alt());
        }

        #[test]
        fn maps_escape_and_function_keys() {
            let esc = Message::from_crossterm(key(ct::KeyCode::Esc, ct::KeyModifiers::NONE));
            assert_eq!(esc, Some(Message::key(KeyCode::Escape)));
            let f5 = Message::from_crossterm(key(ct::KeyCode::F(5), ct::KeyModifiers::NONE));
            assert_eq!(f5, Some(Message::key(KeyCode::F(5))));
        }

        #[test]
        fn maps_mouse_down_and_scroll() {
            let down = ct::Event::Mouse(ct::MouseEvent {
                kind: ct::MouseEventKind::Down(ct::MouseButton::Right),
                column: 10,
                row: 5,
                modifiers: ct::KeyModifiers::SHIFT,
            });
            let Some(Message::Mouse(event)) = Message::from_crossterm(down) else {
                panic!("expected mouse");
            };
            assert_eq!(event.position(), (10, 5));
            assert_eq!(event.button, MouseButton::Right);
            assert_eq!(event.action, MouseAction::Press);
            assert_eq!(event.modifiers, Modifiers::SHIFT);

            let scroll = ct::Event::Mouse(ct::MouseEvent {
                kind: ct::MouseEventKind::ScrollDown,
                column: 0,
                row: 0,
                modifiers: ct::KeyModifiers::NONE,
            });
            let Some(Message::Mouse(event)) = Message::from_crossterm(scroll) else {
                panic!("expected mouse");
            };
            assert_eq!(event.button, MouseButton::WheelDown);
        }

        #[test]
        fn maps_motion_without_button() {
            let moved = ct::Event::Mouse(ct::MouseEvent {
                kind: ct::MouseEventKind::Moved,
                column: 1,
                row: 2,
                modifiers: ct::KeyModifiers::NONE,
            });
            let Some(Message::Mouse(event)) = Message::from_crossterm(moved) else {
                panic!("expected mouse");
            };
            assert_eq!(event.button, MouseButton::None);
            assert_eq!(event.action, MouseAction::Move);
        }

        #[test]
        fn maps_resize_and_paste() {
            assert_eq!(
                Message::from_crossterm(ct::Event::Resize(80, 24)),
                Some(Message::Resize {
                    width: 80,
                    height: 24
                })
            );
            assert_eq!(
                Message::from_crossterm(ct::Event::Paste("hello".into())),
                Some(Message::Paste(PasteEvent::new("hello")))
            );
        }

        #[test]
        fn focus_events_are_dropped() {
            assert_eq!(Message::from_crossterm(ct::Event::FocusGained), None);
            assert_eq!(Message::from_crossterm(ct::Event::FocusLost), None);
        }
    }
}
