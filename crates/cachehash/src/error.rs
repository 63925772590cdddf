//! Error types for cachehash

use std::fmt;

/// Result type alias for the checked cachehash operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the non-panicking entry points
///
/// The core operations (`new`, `has`, `get`, `put`) treat these conditions
/// as contract violations and panic instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Capacity must be greater than zero
    ZeroCapacity,

    /// Keys must contain at least one byte
    EmptyKey,

    /// Key is already cached (keys are insert-only)
    DuplicateKey(usize),

    /// Internal structure is inconsistent
    Invariant(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroCapacity => write!(f, "Capacity must be greater than 0"),
            Error::EmptyKey => write!(f, "Key must not be empty"),
            Error::DuplicateKey(len) => write!(f, "Key already present ({} bytes)", len),
            Error::Invariant(msg) => write!(f, "Invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
