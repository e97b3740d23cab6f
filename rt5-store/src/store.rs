//! The disk-backed cache store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rt5_cache::CacheSource;
use tracing::{debug, info, instrument, warn};

use crate::chunk::{CHUNK_LENGTH, ChunkHeader, EXTENDED_ID_THRESHOLD};
use crate::data::DataFile;
use crate::index::CategoryIndex;
use crate::{DATA_FILE_NAME, Error, INDEX_FILE_PREFIX, Result, StoreConfig};

/// A read-only cache over the local `dat2`/`idx` file pair layout.
///
/// Index files are loaded eagerly at open; reconstruction then only touches
/// the data file. Reconstruction takes `&self` and may run for any number
/// of files in parallel.
#[derive(Debug)]
pub struct DiskCacheStore {
    data: DataFile,
    indices: BTreeMap<u8, CategoryIndex>,
}

impl DiskCacheStore {
    /// Open the store described by `config`.
    ///
    /// A missing data file is fatal here; a category without an index file
    /// only fails at request time.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let data_path = config.cache_dir.join(DATA_FILE_NAME);
        if !data_path.exists() {
            return Err(Error::DataFileNotFound(data_path));
        }
        let data = DataFile::open(&data_path, config.use_memory_mapping)?;

        let mut indices = BTreeMap::new();
        for entry in std::fs::read_dir(&config.cache_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(suffix) = name.to_str().and_then(|n| n.strip_prefix(INDEX_FILE_PREFIX))
            else {
                continue;
            };
            let Ok(category) = suffix.parse::<u8>() else {
                warn!(name = %name.to_string_lossy(), "ignoring index file with unparsable suffix");
                continue;
            };
            let index = CategoryIndex::from_bytes(std::fs::read(entry.path())?);
            debug!(category, files = index.file_count(), "loaded index");
            indices.insert(category, index);
        }

        info!(
            cache_dir = %config.cache_dir.display(),
            indices = indices.len(),
            data_length = data.length(),
            "opened cache store"
        );

        Ok(Self { data, indices })
    }

    /// Reconstruct the raw container bytes of one logical file by walking
    /// its chunk chain.
    #[instrument(skip(self))]
    pub fn reconstruct(&self, category: u8, file_id: u32) -> Result<Vec<u8>> {
        let index = self
            .indices
            .get(&category)
            .ok_or(Error::IndexNotFound(category))?;

        let record = index
            .record(file_id)
            .ok_or(Error::EntryNotFound { category, file_id })?;
        let first_offset = u64::from(record.first_chunk) * CHUNK_LENGTH as u64;
        if !record.is_present() || first_offset + u64::from(record.file_size) > self.data.length()
        {
            // Never-cached or stale record, not corruption.
            return Err(Error::EntryNotFound { category, file_id });
        }

        let extended = file_id >= EXTENDED_ID_THRESHOLD;
        let header_length = ChunkHeader::length(extended);
        let capacity = ChunkHeader::payload_capacity(extended);
        let file_size = record.file_size as usize;

        let mut buffer = Vec::with_capacity(file_size);
        let mut chunk_number = record.first_chunk;
        let mut ordinal = 0u32;

        while buffer.len() < file_size {
            let offset = u64::from(chunk_number) * CHUNK_LENGTH as u64;
            let needed = capacity.min(file_size - buffer.len());

            let integrity = |reason: String| Error::ChunkIntegrity {
                category,
                file_id,
                chunk: chunk_number,
                reason,
            };

            if offset + (header_length + needed) as u64 > self.data.length() {
                return Err(integrity("chunk runs past the end of the data file".into()));
            }

            let bytes = self.data.read_at(offset, header_length + needed)?;
            let header = ChunkHeader::parse(&bytes[..header_length], extended)?;

            if header.file_id != file_id {
                return Err(integrity(format!(
                    "file id mismatch: expected {file_id}, got {}",
                    header.file_id
                )));
            }
            if u32::from(header.chunk_index) != ordinal & 0xffff {
                return Err(integrity(format!(
                    "chunk index mismatch: expected {}, got {}",
                    ordinal & 0xffff,
                    header.chunk_index
                )));
            }
            if header.category != category {
                return Err(integrity(format!(
                    "category mismatch: expected {category}, got {}",
                    header.category
                )));
            }

            buffer.extend_from_slice(&bytes[header_length..]);

            if buffer.len() < file_size {
                let next_offset = u64::from(header.next_chunk) * CHUNK_LENGTH as u64;
                if header.next_chunk == 0 || next_offset >= self.data.length() {
                    return Err(integrity(format!(
                        "next chunk {} out of range",
                        header.next_chunk
                    )));
                }
                chunk_number = header.next_chunk;
            }
            ordinal += 1;
        }

        debug!(category, file_id, chunks = ordinal, size = buffer.len(), "reconstructed file");
        Ok(buffer)
    }

    /// Ids of every present file in a category, from the index alone.
    pub fn file_ids(&self, category: u8) -> Result<Vec<u32>> {
        let index = self
            .indices
            .get(&category)
            .ok_or(Error::IndexNotFound(category))?;
        Ok(index.present_ids())
    }

    /// Every category an index file was loaded for, ascending.
    pub fn categories(&self) -> Vec<u8> {
        self.indices.keys().copied().collect()
    }
}

#[async_trait]
impl CacheSource for DiskCacheStore {
    async fn fetch_raw_file(&self, category: u8, file_id: u32) -> rt5_cache::Result<Vec<u8>> {
        Ok(self.reconstruct(category, file_id)?)
    }

    async fn file_ids(&self, category: u8) -> rt5_cache::Result<Vec<u32>> {
        Ok(Self::file_ids(self, category)?)
    }
}
