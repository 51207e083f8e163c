//! Error definitions for rational time arithmetic.

use thiserror::Error;

/// Errors produced by time type construction and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    /// A frame rate was constructed from negative components.
    #[error("frame rate components must be non-negative, got {numerator}/{denominator}")]
    InvalidRate { numerator: i32, denominator: i32 },

    /// A frame time left the representable i32 frame range.
    #[error("frame time arithmetic overflowed the representable range")]
    Overflow,
}
