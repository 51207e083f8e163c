//! Error types for engine buffers.

use thiserror::Error;

/// Errors from [`CircularBuffer`](crate::CircularBuffer) accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The buffer holds no elements.
    #[error("buffer is empty")]
    Empty,

    /// An index was outside the occupied range.
    #[error("index {index} out of range for buffer of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
