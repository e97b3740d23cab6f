//! Store configuration.

use std::path::PathBuf;

/// Configuration for a [`DiskCacheStore`](crate::DiskCacheStore).
///
/// Passed in explicitly; the store keeps no process-wide state.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory containing the data and index files
    pub cache_dir: PathBuf,
    /// Memory-map the data file, falling back to seek-and-read when
    /// mapping fails
    pub use_memory_mapping: bool,
}

impl StoreConfig {
    /// Configuration for a cache directory with the defaults
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            use_memory_mapping: true,
        }
    }

    /// Enable or disable memory mapping of the data file
    #[must_use]
    pub fn with_memory_mapping(mut self, use_memory_mapping: bool) -> Self {
        self.use_memory_mapping = use_memory_mapping;
        self
    }
}
