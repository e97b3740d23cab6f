//! Error types for container decoding

use thiserror::Error;

/// Result type for container operations
pub type Result<T> = std::result::Result<T, Error>;

/// Container error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Decompression failed after a compression magic matched
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// The trailing entry directory does not fit in the container
    #[error("Entry table truncated: directory needs {expected} bytes, container holds {actual}")]
    TruncatedEntryTable { expected: usize, actual: usize },

    /// A delta-coded entry size decoded to a negative or oversized value
    #[error("Entry size out of range in stripe {stripe}: {size}")]
    EntrySizeOutOfRange { stripe: usize, size: i64 },

    /// The entry sizes do not exactly cover the container's data area
    #[error("Entry sizes do not cover the container: directory accounts for {accounted} of {available} data bytes")]
    EntrySizeMismatch { accounted: usize, available: usize },
}
