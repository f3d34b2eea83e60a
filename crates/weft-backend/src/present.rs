#![forbid(unsafe_code)]

//! Writing a rendered frame to a backend.

use weft_render::buffer::Buffer;
use weft_render::diff::BufferDiff;

use crate::{Backend, BackendError};

/// What one [`flush_dirty`] call sent to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Cells passed to `set_content`.
    pub cells_written: usize,
    /// True if the whole frame was repainted.
    pub full: bool,
}

/// Flush `back` to `backend` and make it the new presented frame.
///
/// Only cells that are dirty in `back` and differ from `front` (the frame
/// currently on screen) are written; a fully dirty `back` or a size change
/// writes everything. Continuation cells are never written. `show` is called
/// exactly once, even when nothing changed. On success `front` mirrors `back`
/// and both are clean.
pub fn flush_dirty(
    backend: &mut dyn Backend,
    front: &mut Buffer,
    back: &mut Buffer,
) -> Result<FlushStats, BackendError> {
    let diff = BufferDiff::compute(front, back);
    let mut cells_written = 0;
    for &(x, y) in diff.changes() {
        let cell = back.get(x, y);
        if cell.is_continuation() {
            continue;
        }
        backend.set_content(x, y, cell.ch, &[], cell.style)?;
        cells_written += 1;
    }
    backend.show()?;

    back.clear_dirty();
    front.clone_from(back);
    Ok(FlushStats {
        cells_written,
        full: diff.is_full(),
    })
}
