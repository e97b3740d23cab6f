//! The capability trait both cache backends implement.

use std::sync::Arc;

use async_trait::async_trait;
use rt5_reference::ReferenceTable;

use crate::{REFERENCE_CATEGORY, Result};

/// A source of raw cache containers.
///
/// The local chunked store and the networked content-protocol client are
/// independent implementations of this one interface; everything above it
/// (reference table lookup, validation, extraction) is shared.
#[async_trait]
pub trait CacheSource: Send + Sync {
    /// Fetch the raw container bytes for one logical file, not yet
    /// decompressed.
    async fn fetch_raw_file(&self, category: u8, file_id: u32) -> Result<Vec<u8>>;

    /// Fetch and decode the reference table describing `category`.
    ///
    /// The table is itself a cache file (file `category` within
    /// [`REFERENCE_CATEGORY`]), so this recurses through the same fetch
    /// machinery exactly once. Implementations may override to memoize.
    async fn reference_table(&self, category: u8) -> Result<Arc<ReferenceTable>> {
        let raw = self
            .fetch_raw_file(REFERENCE_CATEGORY, u32::from(category))
            .await?;
        let data = rt5_container::decompress(&raw)?;
        Ok(Arc::new(ReferenceTable::decode(&data)?))
    }

    /// Ids of every file present in `category`.
    ///
    /// The default consults the category's reference table; the local store
    /// overrides this with an index scan that needs no tables.
    async fn file_ids(&self, category: u8) -> Result<Vec<u32>> {
        Ok(self.reference_table(category).await?.file_ids())
    }
}
