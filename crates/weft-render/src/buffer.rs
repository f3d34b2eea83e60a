#![forbid(unsafe_code)]

//! Buffer grid storage with dirty tracking.
//!
//! The `Buffer` is a 2D grid of [`Cell`]s mirroring what should be on the
//! terminal. "Dirty" means "changed since the last flush": a write marks a
//! cell dirty only if it changes the cell's content. The runtime flushes dirty
//! cells to the backend and then calls [`Buffer::clear_dirty`];
//! [`Buffer::mark_all_dirty`] forces a full repaint regardless.
//!
//! # Layout
//!
//! Cells are stored in row-major order: `index = y * width + x`.
//!
//! # Invariants
//!
//! 1. `cells.len() == dirty.len() == width * height`
//! 2. `dirty_rows[y]` is set whenever any `dirty[y * width + x]` is set
//! 3. Writes outside the grid are silent no-ops
//! 4. A wide character is written together with its continuation cell, or
//!    not at all
//! 5. After `resize`, every cell is blank and the buffer is fully dirty

use unicode_width::UnicodeWidthChar;
use weft_core::geometry::{Rect, Size};

use crate::cell::{Cell, Style};

/// A 2D grid of terminal cells.
///
/// # Example
///
/// ```
/// use weft_render::buffer::Buffer;
/// use weft_render::cell::Style;
///
/// let mut buffer = Buffer::new(20, 2);
/// buffer.clear_dirty();
/// buffer.set_string(0, 1, "Count: 1", Style::DEFAULT);
/// assert_eq!(buffer.row_text(1).trim_end(), "Count: 1");
/// assert!(buffer.is_dirty(0, 1));
/// ```
#[derive(Debug, Clone)]
pub struct Buffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    dirty: Vec<bool>,
    dirty_rows: Vec<bool>,
    full_dirty: bool,
}

impl Buffer {
    /// Create a blank buffer. A fresh buffer is fully dirty.
    ///
    /// Zero-sized buffers are allowed; every write to them is a no-op.
    pub fn new(width: u16, height: u16) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; len],
            dirty: vec![false; len],
            dirty_rows: vec![false; height as usize],
            full_dirty: true,
        }
    }

    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bounding rect of the entire buffer.
    #[inline]
    pub const fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    /// The cell at (x, y), or a blank cell when out of range.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Cell {
        self.try_get(x, y).copied().unwrap_or_default()
    }

    /// A reference to the cell at (x, y), `None` when out of range.
    #[inline]
    pub fn try_get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// All cells in row-major order.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Store a cell and mark it dirty, unless it is already identical.
    fn write(&mut self, idx: usize, cell: Cell) {
        if self.cells[idx] == cell {
            return;
        }
        self.cells[idx] = cell;
        self.dirty[idx] = true;
        self.dirty_rows[idx / self.width as usize] = true;
    }

    /// Blank out any wide character that would be split by writing at (x, y).
    fn cleanup_overlap(&mut self, x: u16, y: u16) {
        let Some(idx) = self.index(x, y) else { return };
        let current = self.cells[idx];

        if current.is_continuation() && x > 0 {
            // Overwriting the tail orphans the head to its left.
            self.write(idx - 1, Cell::BLANK);
        } else if current.width() > 1
            && let Some(tail) = self.index(x + 1, y)
            && self.cells[tail].is_continuation()
        {
            self.write(tail, Cell::BLANK);
        }
    }

    /// Set the cell at (x, y).
    ///
    /// - Does nothing if coordinates are out of bounds
    /// - A wide character also claims (x + 1, y) as a continuation cell;
    ///   if that column is off the grid, nothing is written
    /// - Splitting an existing wide character blanks its other half
    /// - Writing the value a cell already holds leaves its dirty flag alone
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        let Some(idx) = self.index(x, y) else { return };

        if cell.width() > 1 {
            let Some(tail) = self.index(x + 1, y) else {
                return;
            };
            self.cleanup_overlap(x, y);
            self.cleanup_overlap(x + 1, y);
            self.write(idx, cell);
            self.write(tail, Cell::CONTINUATION);
            return;
        }

        if self.cells[idx] == cell {
            return;
        }
        self.cleanup_overlap(x, y);
        self.write(idx, cell);
    }

    /// Paint `region` with `ch` in `style`, clipped to the buffer.
    ///
    /// `ch` is expected to be single-width; wide or control characters are
    /// replaced with a space. Cells that change are marked dirty; cells
    /// already holding `ch` in `style` are not.
    pub fn fill(&mut self, region: Rect, ch: char, style: Style) {
        let clipped = region.intersection(&self.bounds());
        if clipped.is_empty() {
            return;
        }
        let ch = if !ch.is_control() && ch.width() == Some(1) {
            ch
        } else {
            ' '
        };
        let cell = Cell::new(ch, style);
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                self.set(x, y, cell);
            }
        }
    }

    /// Write a horizontal run of text starting at (x, y).
    ///
    /// Text past the right edge is clipped; rows outside the buffer are
    /// ignored. Control and zero-width characters are skipped. Returns the
    /// column just past the last character written.
    pub fn set_string(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        self.set_string_clipped(x, y, text, style, self.width)
    }

    /// Like [`Buffer::set_string`], but stops at column `max_x` (exclusive)
    /// as well as at the right edge.
    pub fn set_string_clipped(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        style: Style,
        max_x: u16,
    ) -> u16 {
        if y >= self.height {
            return x;
        }
        let limit = max_x.min(self.width);
        let mut col = x;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let w = match ch.width() {
                Some(w) if w > 0 => w as u16,
                _ => continue,
            };
            if col.saturating_add(w) > limit {
                break;
            }
            self.set(col, y, Cell::new(ch, style));
            col += w;
        }
        col
    }

    /// Blank every cell. Only cells that actually change become dirty.
    pub fn clear(&mut self) {
        self.fill(self.bounds(), ' ', Style::DEFAULT);
    }

    /// Force a full repaint on the next flush.
    pub fn mark_all_dirty(&mut self) {
        self.full_dirty = true;
    }

    #[inline]
    pub const fn is_fully_dirty(&self) -> bool {
        self.full_dirty
    }

    /// Returns true if the cell at (x, y) will be flushed.
    pub fn is_dirty(&self, x: u16, y: u16) -> bool {
        self.index(x, y)
            .is_some_and(|i| self.full_dirty || self.dirty[i])
    }

    /// Returns true if anything needs flushing.
    pub fn has_dirty(&self) -> bool {
        self.full_dirty || self.dirty_rows.iter().any(|&d| d)
    }

    /// Number of cells that will be flushed.
    pub fn dirty_count(&self) -> usize {
        if self.full_dirty {
            return self.cells.len();
        }
        self.dirty.iter().filter(|&&d| d).count()
    }

    /// Iterate dirty cells as `(x, y, cell)` in row-major order.
    ///
    /// When the buffer is fully dirty, every cell is yielded.
    pub fn dirty_cells(&self) -> impl Iterator<Item = (u16, u16, &Cell)> + '_ {
        let width = self.width as usize;
        (0..self.height)
            .filter(move |&y| self.full_dirty || self.dirty_rows[y as usize])
            .flat_map(move |y| {
                let start = y as usize * width;
                (0..self.width).filter_map(move |x| {
                    let i = start + x as usize;
                    (self.full_dirty || self.dirty[i]).then(|| (x, y, &self.cells[i]))
                })
            })
    }

    /// Forget all dirty state, typically right after a flush.
    pub fn clear_dirty(&mut self) {
        self.full_dirty = false;
        self.dirty.fill(false);
        self.dirty_rows.fill(false);
    }

    /// Reallocate to the new size. Prior content is discarded and the
    /// buffer becomes fully dirty.
    pub fn resize(&mut self, width: u16, height: u16) {
        weft_core::trace!(width, height, "buffer resized");
        *self = Self::new(width, height);
    }

    /// Text content of row `y`, one char per column.
    ///
    /// Continuation cells contribute nothing, so a wide character reads as
    /// itself. Out-of-range rows yield an empty string.
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = y as usize * self.width as usize;
        self.cells[start..start + self.width as usize]
            .iter()
            .filter(|c| !c.is_continuation())
            .map(|c| c.ch)
            .collect()
    }

    /// All rows joined with newlines, trailing spaces trimmed.
    pub fn to_text(&self) -> String {
        (0..self.height)
            .map(|y| self.row_text(y).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns true if both buffers have the same size and cells,
    /// ignoring dirty state.
    pub fn content_eq(&self, other: &Buffer) -> bool {
        self.width == other.width && self.height == other.height && self.cells == other.cells
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
