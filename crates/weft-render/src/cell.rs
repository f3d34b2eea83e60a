#![forbid(unsafe_code)]

//! Cell types: the unit of the render buffer.
//!
//! A [`Cell`] is one terminal column on one row: a character plus a
//! [`Style`]. Cells are small `Copy` values so buffers can be compared and
//! cloned cheaply.
//!
//! Wide characters (display width 2) occupy their own cell plus a following
//! [`Cell::CONTINUATION`] placeholder that backends must skip.

use unicode_width::UnicodeWidthChar;

/// A compact RGBA color, laid out as `0xRRGGBBAA`.
///
/// An alpha of zero means "use the terminal's default color". Any other
/// alpha is treated as opaque by terminal backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    /// The terminal's default color.
    pub const DEFAULT: Self = Self(0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);

    /// Create an opaque RGB color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32))
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// Returns true for the terminal default color.
    #[inline]
    pub const fn is_default(self) -> bool {
        self.a() == 0
    }
}

bitflags::bitflags! {
    /// Text attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        const BOLD          = 0b0000_0001;
        const DIM           = 0b0000_0010;
        const ITALIC        = 0b0000_0100;
        const UNDERLINE     = 0b0000_1000;
        const BLINK         = 0b0001_0000;
        const REVERSE       = 0b0010_0000;
        const STRIKETHROUGH = 0b0100_0000;
        const HIDDEN        = 0b1000_0000;
    }
}

/// Foreground, background, and attributes for a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: PackedRgba,
    pub bg: PackedRgba,
    pub flags: StyleFlags,
}

impl Style {
    /// The terminal's default style.
    pub const DEFAULT: Self = Self {
        fg: PackedRgba::DEFAULT,
        bg: PackedRgba::DEFAULT,
        flags: StyleFlags::empty(),
    };

    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    #[inline]
    pub const fn fg(mut self, fg: PackedRgba) -> Self {
        self.fg = fg;
        self
    }

    #[inline]
    pub const fn bg(mut self, bg: PackedRgba) -> Self {
        self.bg = bg;
        self
    }

    /// Add attribute flags on top of any already set.
    #[inline]
    pub fn add_flags(mut self, flags: StyleFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[inline]
    pub fn bold(self) -> Self {
        self.add_flags(StyleFlags::BOLD)
    }

    #[inline]
    pub fn reverse(self) -> Self {
        self.add_flags(StyleFlags::REVERSE)
    }

    /// Overlay `other` on top of `self`: colors in `other` win unless they
    /// are the default color, and flags are combined.
    pub fn patch(self, other: Style) -> Self {
        Self {
            fg: if other.fg.is_default() { self.fg } else { other.fg },
            bg: if other.bg.is_default() { self.bg } else { other.bg },
            flags: self.flags | other.flags,
        }
    }
}

/// Placeholder char stored in the trailing half of a wide character.
const CONTINUATION_CHAR: char = '\0';

/// A single terminal cell.
///
/// The default cell is a blank space in the default style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

const _: () = assert!(core::mem::size_of::<Cell>() == 16);

impl Cell {
    /// A blank cell in the default style.
    pub const BLANK: Self = Self {
        ch: ' ',
        style: Style::DEFAULT,
    };

    /// Trailing half of a wide character. Never written to the terminal.
    pub const CONTINUATION: Self = Self {
        ch: CONTINUATION_CHAR,
        style: Style::DEFAULT,
    };

    #[inline]
    pub const fn new(ch: char, style: Style) -> Self {
        Self { ch, style }
    }

    /// A cell with the given character in the default style.
    #[inline]
    pub const fn from_char(ch: char) -> Self {
        Self::new(ch, Style::DEFAULT)
    }

    #[inline]
    pub const fn is_continuation(&self) -> bool {
        self.ch == CONTINUATION_CHAR
    }

    /// Display width in columns: 0 for continuations, otherwise 1 or 2.
    #[inline]
    pub fn width(&self) -> usize {
        if self.is_continuation() {
            return 0;
        }
        self.ch.width().unwrap_or(1).max(1)
    }

    #[inline]
    pub const fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}
