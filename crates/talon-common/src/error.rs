//! Error types for TalonDB.

use thiserror::Error;

/// Result type alias using TalonError.
pub type Result<T> = std::result::Result<T, TalonError>;

/// Errors that can occur in TalonDB operations.
///
/// Contract violations (caller bugs such as reading an inlined value from a
/// non-inlined handle) do not appear here: they panic at the violation site,
/// since by the time one is detected the index may already be inconsistent.
#[derive(Debug, Error)]
pub enum TalonError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Index errors
    #[error("Index corrupted: {0}")]
    IndexCorrupted(String),

    #[error("Key not found")]
    KeyNotFound,

    #[error("Key too large: {size} bytes (max {max})")]
    KeyTooLarge { size: usize, max: usize },

    #[error("Row id {row_id} exceeds the local representable range")]
    RowIdOutOfRange { row_id: u64 },

    // Checkpoint / format errors
    #[error("Unsupported file format version: {0}")]
    UnsupportedFormatVersion(u8),

    #[error("Truncated block data: expected {expected} bytes, got {actual}")]
    TruncatedBlock { expected: usize, actual: usize },

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Internal errors (bugs surfaced by verification, distinct from bad input)
    #[error("Internal error: {0}")]
    Internal(String),
}
