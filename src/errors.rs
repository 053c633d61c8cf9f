//! Error type for anymat

use thiserror::Error;

/// The failure kinds surfaced by matrix construction and parsing.
///
/// Extraction preconditions (indices and windows within the matrix shape)
/// are a caller contract and are checked with debug assertions instead of
/// being reported through this type.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum AnymatError {
    /// A construction-time shape mismatch, e.g. a flat buffer whose length
    /// does not match `nrows * ncols`, or a pointer array of the wrong length.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// Inconsistent construction data: out-of-range indices, duplicate
    /// triplets, non-monotone pointers.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A malformed Matrix Market stream.
    #[error("parse error: {0}")]
    ParseError(String),

    /// An index or window beyond the dimension it addresses.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),
}
