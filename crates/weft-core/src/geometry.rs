#![forbid(unsafe_code)]

//! Geometric primitives shared by layout, rendering, and hit testing.
//!
//! All coordinates are terminal cells, 0-indexed from the top-left corner.
//! Arithmetic saturates rather than wrapping so that widgets computing
//! offsets near the edges degrade into empty regions instead of panicking.

/// A width/height pair in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    /// The empty size.
    pub const ZERO: Size = Size::new(0, 0);

    /// Create a new size.
    #[inline]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Returns true when either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u16, u16)> for Size {
    fn from((width, height): (u16, u16)) -> Self {
        Self::new(width, height)
    }
}

/// Minimum and maximum sizes a widget may choose from during measurement.
///
/// Invariant: `min.width <= max.width` and `min.height <= max.height`.
/// Constructors normalize inverted bounds by raising the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraints {
    pub min: Size,
    pub max: Size,
}

impl Constraints {
    /// Create constraints, normalizing so that `min <= max` on both axes.
    pub const fn new(min: Size, max: Size) -> Self {
        let max_width = if max.width < min.width {
            min.width
        } else {
            max.width
        };
        let max_height = if max.height < min.height {
            min.height
        } else {
            max.height
        };
        Self {
            min,
            max: Size::new(max_width, max_height),
        }
    }

    /// Constraints that admit exactly one size.
    #[inline]
    pub const fn tight(size: Size) -> Self {
        Self {
            min: size,
            max: size,
        }
    }

    /// Constraints that admit anything from zero up to `max`.
    #[inline]
    pub const fn loose(max: Size) -> Self {
        Self {
            min: Size::ZERO,
            max,
        }
    }

    /// Constraints with no upper bound.
    #[inline]
    pub const fn unbounded() -> Self {
        Self::loose(Size::new(u16::MAX, u16::MAX))
    }

    /// Clamp a desired size into these constraints.
    #[inline]
    pub fn constrain(&self, size: Size) -> Size {
        Size::new(
            size.width.clamp(self.min.width, self.max.width),
            size.height.clamp(self.min.height, self.max.height),
        )
    }

    /// Returns true if `min == max`.
    #[inline]
    pub fn is_tight(&self) -> bool {
        self.min == self.max
    }

    /// Shrink the maximum by the given insets, keeping `min <= max`.
    pub fn deflate(&self, sides: Sides) -> Self {
        let max = Size::new(
            self.max.width.saturating_sub(sides.horizontal_sum()),
            self.max.height.saturating_sub(sides.vertical_sum()),
        );
        let min = Size::new(self.min.width.min(max.width), self.min.height.min(max.height));
        Self::new(min, max)
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// A rectangle used for widget bounds, fill regions, and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle anchored at the origin.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlap of two rectangles, or the empty rectangle if they are disjoint.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Overlap of two rectangles, `None` if they are disjoint.
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        (x < right && y < bottom).then(|| Rect::new(x, y, right - x, bottom - y))
    }

    /// Shrink the rectangle by the given insets.
    pub fn inner(&self, margin: Sides) -> Rect {
        Rect {
            x: self.x.saturating_add(margin.left),
            y: self.y.saturating_add(margin.top),
            width: self.width.saturating_sub(margin.horizontal_sum()),
            height: self.height.saturating_sub(margin.vertical_sum()),
        }
    }

    /// Take `height` rows off the top, returning `(taken, rest)`.
    ///
    /// The taken slice is clamped to the rectangle's own height.
    pub fn split_top(&self, height: u16) -> (Rect, Rect) {
        let taken = height.min(self.height);
        (
            Rect::new(self.x, self.y, self.width, taken),
            Rect::new(
                self.x,
                self.y.saturating_add(taken),
                self.width,
                self.height - taken,
            ),
        )
    }

    /// Take `width` columns off the left, returning `(taken, rest)`.
    pub fn split_left(&self, width: u16) -> (Rect, Rect) {
        let taken = width.min(self.width);
        (
            Rect::new(self.x, self.y, taken, self.height),
            Rect::new(
                self.x.saturating_add(taken),
                self.y,
                self.width - taken,
                self.height,
            ),
        )
    }
}

/// Insets for padding and margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sides {
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
    pub left: u16,
}

impl Sides {
    pub const fn new(top: u16, right: u16, bottom: u16, left: u16) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Equal insets on every side.
    pub const fn all(val: u16) -> Self {
        Self::new(val, val, val, val)
    }

    #[inline]
    pub const fn horizontal_sum(&self) -> u16 {
        self.left.saturating_add(self.right)
    }

    #[inline]
    pub const fn vertical_sum(&self) -> u16 {
        self.top.saturating_add(self.bottom)
    }
}

impl From<u16> for Sides {
    fn from(val: u16) -> Self {
        Self::all(val)
    }
}
