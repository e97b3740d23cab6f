//! Error types for reference table decoding

use thiserror::Error;

/// Result type for reference table operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reference table error types
#[derive(Error, Debug)]
pub enum Error {
    /// Table data ended before the declared layout was fully read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown leading format byte; there is no safe fallback layout
    #[error("Unsupported reference table format: {0}")]
    UnsupportedFormat(u8),

    /// A master table declared a category id that does not fit in a byte
    #[error("Category id {0} out of range for a master reference table")]
    CategoryOutOfRange(u32),
}
