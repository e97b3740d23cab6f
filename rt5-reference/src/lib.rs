//! Reference table decoding for RuneTek5 caches.
//!
//! A reference table is the index-of-indices for one category: per file it
//! records the expected CRC, the version, and (for archive containers) the
//! ordered list of entry ids the file holds. The master reference table is
//! the reference table describing all categories' reference tables; the two
//! share one binary layout.

pub mod error;
pub mod master;
pub mod reference;

pub use error::{Error, Result};
pub use master::{MasterReferenceTable, ReferenceTableDescriptor};
pub use reference::{FileEntry, ReferenceTable};
