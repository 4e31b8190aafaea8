//! Error type shared by the codec, the integrators and the generic solver.

use thiserror::Error;

/// Contract violations raised while encoding, decoding or stepping flat state.
///
/// None of these are transient: each one points at a value that does not fit
/// its descriptor or at a buffer of the wrong length.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Expected array of length {expected}, got array of length {actual} instead.")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Size contract violated: expected {expected} floats, processed {actual}.")]
    SizeContractViolation { expected: usize, actual: usize },

    #[error("Cursor ran past the end of a buffer holding {capacity} floats.")]
    BufferOverrun { capacity: usize },

    #[error("Expected buffer of length {expected}, however actual length: {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Value {0} is not representable by the leaf scalar type.")]
    Unrepresentable(String),

    #[error("Derivative evaluation failed: {0}")]
    Derivative(String),
}

pub type Result<T> = std::result::Result<T, Error>;
