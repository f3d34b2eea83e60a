#![forbid(unsafe_code)]

//! Dirty-cell diff between the presented frame and the next one.
//!
//! The runtime keeps two buffers: the *back* buffer widgets render into and
//! a *front* copy of what the terminal last displayed. Dirty flags on the
//! back buffer narrow the scan to rows and cells that were touched; the
//! front copy then filters out cells that were rewritten with the same
//! content they already had on screen.
//!
//! # Usage
//!
//! ```
//! use weft_render::buffer::Buffer;
//! use weft_render::cell::Style;
//! use weft_render::diff::BufferDiff;
//!
//! let mut front = Buffer::new(10, 2);
//! let mut back = Buffer::new(10, 2);
//! front.clear_dirty();
//! back.clear_dirty();
//!
//! back.set_string(0, 0, "ab", Style::DEFAULT);
//! let diff = BufferDiff::compute(&front, &back);
//! assert_eq!(diff.changes(), &[(0, 0), (1, 0)]);
//! ```

use crate::buffer::Buffer;

/// Positions that must be written to bring the terminal up to date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferDiff {
    changes: Vec<(u16, u16)>,
    full: bool,
}

impl BufferDiff {
    /// Compare `back` against the previously presented `front`.
    ///
    /// A fully dirty back buffer, or a size mismatch, yields every cell.
    pub fn compute(front: &Buffer, back: &Buffer) -> Self {
        if back.is_fully_dirty() || front.size() != back.size() {
            return Self::full(back);
        }

        let changes = back
            .dirty_cells()
            .filter(|&(x, y, cell)| front.try_get(x, y) != Some(cell))
            .map(|(x, y, _)| (x, y))
            .collect();
        Self {
            changes,
            full: false,
        }
    }

    /// Every position in `buf`, row-major.
    pub fn full(buf: &Buffer) -> Self {
        let mut changes = Vec::with_capacity(buf.len());
        for y in 0..buf.height() {
            for x in 0..buf.width() {
                changes.push((x, y));
            }
        }
        Self {
            changes,
            full: true,
        }
    }

    /// Changed `(x, y)` positions in row-major order.
    #[inline]
    pub fn changes(&self) -> &[(u16, u16)] {
        &self.changes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// True when the diff covers the whole frame.
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, Style};

    fn clean(width: u16, height: u16) -> Buffer {
        let mut buf = Buffer::new(width, height);
        buf.clear_dirty();
        buf
    }

    #[test]
    fn untouched_back_buffer_has_empty_diff() {
        let diff = BufferDiff::compute(&clean(4, 4), &clean(4, 4));
        assert!(diff.is_empty());
        assert!(!diff.is_full());
    }

    #[test]
    fn rewriting_same_content_is_filtered_by_front() {
        let mut front = clean(6, 1);
        front.set_string(0, 0, "same", Style::DEFAULT);

        let mut back = clean(6, 1);
        back.set_string(0, 0, "sane", Style::DEFAULT);

        let diff = BufferDiff::compute(&front, &back);
        assert_eq!(diff.changes(), &[(2, 0)]);
    }

    #[test]
    fn fully_dirty_back_yields_every_cell() {
        let front = clean(3, 2);
        let mut back = clean(3, 2);
        back.mark_all_dirty();

        let diff = BufferDiff::compute(&front, &back);
        assert!(diff.is_full());
        assert_eq!(diff.len(), 6);
        assert_eq!(diff.changes()[0], (0, 0));
        assert_eq!(diff.changes()[5], (2, 1));
    }

    #[test]
    fn size_mismatch_yields_every_cell() {
        let front = clean(3, 2);
        let mut back = clean(4, 2);
        back.set(0, 0, Cell::from_char('x'));
        let diff = BufferDiff::compute(&front, &back);
        assert!(diff.is_full());
        assert_eq!(diff.len(), 8);
    }

    #[test]
    fn changes_are_row_major() {
        let front = clean(3, 3);
        let mut back = clean(3, 3);
        back.set(2, 2, Cell::from_char('c'));
        back.set(1, 0, Cell::from_char('a'));
        let diff = BufferDiff::compute(&front, &back);
        assert_eq!(diff.changes(), &[(1, 0), (2, 2)]);
    }
}
