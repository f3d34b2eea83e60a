#![forbid(unsafe_code)]

//! Render kernel: cells, the dirty-tracked buffer, and frame diffs.

pub mod buffer;
pub mod cell;
pub mod diff;
