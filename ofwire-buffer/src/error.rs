//! Buffer error types.

use thiserror::Error;

/// Errors raised by the cursor buffers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer underrun: needed {needed} bytes, {available} available")]
    Underrun { needed: usize, available: usize },

    #[error("patch position {pos} outside written region of {written} bytes")]
    PatchOutOfRange { pos: usize, written: usize },
}
