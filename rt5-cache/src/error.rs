//! Error types for cache assembly and extraction

use thiserror::Error;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Cache error types.
///
/// Variants split into two classes: per-file failures that a bulk
/// extraction catches and reports without aborting (see
/// [`Error::is_recoverable`]), and session-level failures that must surface
/// to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Container decoding failed for one file
    #[error("Container error: {0}")]
    Container(#[from] rt5_container::Error),

    /// Reference table decoding failed
    #[error("Reference table error: {0}")]
    Reference(#[from] rt5_reference::Error),

    /// The category holds no such file
    #[error("File {file_id} not found in category {category}")]
    FileNotFound { category: u8, file_id: u32 },

    /// No such category is present
    #[error("Category {0} not found")]
    CategoryNotFound(u8),

    /// Raw container bytes disagree with the reference table's CRC
    #[error(
        "Checksum mismatch for {category}/{file_id}: expected {expected:#010x}, got {actual:#010x}"
    )]
    ChecksumMismatch {
        category: u8,
        file_id: u32,
        expected: u32,
        actual: u32,
    },

    /// The file's stored bytes failed an integrity check during reconstruction
    #[error("File {category}/{file_id} is corrupt: {reason}")]
    FileCorrupt {
        category: u8,
        file_id: u32,
        reason: String,
    },

    /// Connection-level failure; fatal for the whole session
    #[error("Session error: {0}")]
    Session(String),
}

impl Error {
    /// Whether a bulk extraction may catch this error at file granularity
    /// and continue with the next file.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Session(_))
    }
}
