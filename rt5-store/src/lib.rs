//! Local chunked flat-file store for RuneTek5 caches.
//!
//! The on-disk layout is one data file (`main_file_cache.dat2`) shared by
//! all categories plus one fixed-record index file per category
//! (`main_file_cache.idxN`). Files are scattered through the data file as
//! 520-byte chunks forming a singly-linked chain; reconstruction walks the
//! chain from the index record, validating every chunk header on the way.

pub mod chunk;
pub mod config;
pub mod data;
pub mod error;
pub mod index;
pub mod store;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use store::DiskCacheStore;

/// Name of the shared data file
pub const DATA_FILE_NAME: &str = "main_file_cache.dat2";

/// Prefix of per-category index files; the category number is the suffix
pub const INDEX_FILE_PREFIX: &str = "main_file_cache.idx";
