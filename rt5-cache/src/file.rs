//! The assembled cache file type.

use std::collections::BTreeMap;

/// One logical cache file, fully assembled: reconstructed, decompressed,
/// and either entry-split or signature-sniffed.
///
/// Produced by [`Cache::file`](crate::Cache::file) and owned by the caller;
/// the core keeps no copy.
#[derive(Debug, Clone)]
pub struct CacheFile {
    /// Category the file came from
    pub category: u8,
    /// File id within the category
    pub file_id: u32,
    /// Decompressed (and possibly envelope-stripped) bytes
    pub data: Vec<u8>,
    /// Extension assigned by signature sniffing, when one matched
    pub extension: Option<&'static str>,
    /// Entry id to entry bytes, populated only for archive containers
    pub entries: BTreeMap<u32, Vec<u8>>,
}

impl CacheFile {
    /// Whether this file was split into archive entries
    pub fn is_archive(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Bytes of one archive entry
    pub fn entry(&self, entry_id: u32) -> Option<&[u8]> {
        self.entries.get(&entry_id).map(Vec::as_slice)
    }
}
