//! Shared cache model and high-level file assembly.
//!
//! This crate ties the container and reference-table layers together behind
//! the one capability trait both backends implement: [`CacheSource`] fetches
//! raw container bytes, and [`Cache`] turns them into validated,
//! decompressed, entry-split [`CacheFile`]s and writes them to an output
//! tree.

pub mod cache;
pub mod error;
pub mod file;
pub mod source;

pub use cache::{Cache, CategoryExtraction};
pub use error::{Error, Result};
pub use file::CacheFile;
pub use source::CacheSource;

/// The category that stores reference tables. The master reference table is
/// file `REFERENCE_CATEGORY` within it; category N's reference table is
/// file N.
pub const REFERENCE_CATEGORY: u8 = 0;
