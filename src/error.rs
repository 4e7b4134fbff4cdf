//! Error types for tilestore

use thiserror::Error;

/// Result type alias for tilestore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tilestore operations
///
/// An unpopulated coordinate is not an error: lookups return `Ok(None)` for
/// it. `Corruption` covers digest mismatches on fetched bytes, which signal
/// a failing medium rather than a malformed file, and is never folded into
/// `NotFound`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid tile id: {0}")]
    InvalidId(String),

    #[error("Invalid tile set file: {0}")]
    BadFormat(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}
