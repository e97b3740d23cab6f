//! Error types for the local store

use std::path::PathBuf;

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Store error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The shared data file is missing; fatal at open
    #[error("Data file not found at {0}")]
    DataFileNotFound(PathBuf),

    /// No index file was loaded for the category
    #[error("Index not found for category {0}")]
    IndexNotFound(u8),

    /// The index has no usable record: never cached or stale, not corruption
    #[error("Entry not found for {category}/{file_id}")]
    EntryNotFound { category: u8, file_id: u32 },

    /// A chunk header failed validation; the file is corrupt and skipped
    #[error("Chunk integrity failure for {category}/{file_id} at chunk {chunk}: {reason}")]
    ChunkIntegrity {
        category: u8,
        file_id: u32,
        chunk: u32,
        reason: String,
    },

    /// A read would run past the end of the data file
    #[error("Read beyond data file bounds: offset={offset}, length={length}, size={size}")]
    ReadOutOfBounds {
        offset: u64,
        length: usize,
        size: u64,
    },
}

impl From<Error> for rt5_cache::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => Self::Io(e),
            Error::DataFileNotFound(path) => {
                Self::Session(format!("data file not found at {}", path.display()))
            }
            Error::IndexNotFound(category) => Self::CategoryNotFound(category),
            Error::EntryNotFound { category, file_id } => {
                Self::FileNotFound { category, file_id }
            }
            Error::ChunkIntegrity {
                category,
                file_id,
                chunk,
                reason,
            } => Self::FileCorrupt {
                category,
                file_id,
                reason: format!("chunk {chunk}: {reason}"),
            },
            Error::ReadOutOfBounds {
                offset,
                length,
                size,
            } => Self::Session(format!(
                "read beyond data file bounds: offset={offset}, length={length}, size={size}"
            )),
        }
    }
}
