//! High-level cache assembly and extraction.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use rt5_container::{decompress, sniff, split_entries};
use rt5_reference::{MasterReferenceTable, ReferenceTable};
use tracing::{debug, info, instrument, warn};

use crate::{CacheFile, CacheSource, Error, REFERENCE_CATEGORY, Result};

/// Outcome of a bulk category extraction.
///
/// Per-file failures are collected here rather than propagated, so one
/// corrupt or missing file never aborts a whole-category pass.
#[derive(Debug, Default)]
pub struct CategoryExtraction {
    /// Paths written, in extraction order
    pub written: Vec<PathBuf>,
    /// Files that failed with a recoverable error
    pub failures: Vec<(u32, Error)>,
}

/// High-level cache over any [`CacheSource`].
///
/// Assembles raw containers into [`CacheFile`]s (reference lookup, CRC
/// validation, decompression, entry splitting or signature sniffing) and
/// extracts them into a `{output_dir}/{category}/{file_id}` tree.
#[derive(Debug)]
pub struct Cache<S> {
    source: S,
    output_dir: PathBuf,
}

impl<S: CacheSource> Cache<S> {
    /// Wrap a source with the default output directory (`cache/`).
    pub fn new(source: S) -> Self {
        Self {
            source,
            output_dir: PathBuf::from("cache"),
        }
    }

    /// Set the directory extraction writes into.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// The wrapped source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and fully assemble one logical file.
    #[instrument(skip(self))]
    pub async fn file(&self, category: u8, file_id: u32) -> Result<CacheFile> {
        // Reference tables describe themselves; skip the lookup for them.
        let reference_entry = if category == REFERENCE_CATEGORY {
            None
        } else {
            let table = self.source.reference_table(category).await?;
            Some(
                table
                    .entry(file_id)
                    .cloned()
                    .ok_or(Error::FileNotFound { category, file_id })?,
            )
        };

        let raw = self.source.fetch_raw_file(category, file_id).await?;

        if let Some(entry) = &reference_entry {
            let actual = crc32fast::hash(&raw);
            if actual != entry.crc {
                return Err(Error::ChecksumMismatch {
                    category,
                    file_id,
                    expected: entry.crc,
                    actual,
                });
            }
        }

        let data = decompress(&raw)?;

        // Files declaring more than one entry are archives with a trailing
        // directory; single-entry files are stored raw.
        if let Some(entry) = &reference_entry
            && entry.entry_ids.len() > 1
        {
            let entry_ids: Vec<u32> = entry.entry_ids.iter().copied().collect();
            let entries = split_entries(&data, &entry_ids)?;
            debug!(
                category,
                file_id,
                entries = entries.len(),
                "assembled archive file"
            );
            return Ok(CacheFile {
                category,
                file_id,
                data,
                extension: None,
                entries,
            });
        }

        let (data, extension) = sniff(data);
        debug!(category, file_id, ?extension, size = data.len(), "assembled file");
        Ok(CacheFile {
            category,
            file_id,
            data,
            extension,
            entries: BTreeMap::new(),
        })
    }

    /// The reference table describing `category`
    pub async fn reference_table(&self, category: u8) -> Result<Arc<ReferenceTable>> {
        self.source.reference_table(category).await
    }

    /// The master reference table (the table of tables)
    pub async fn master_reference_table(&self) -> Result<MasterReferenceTable> {
        let raw = self
            .source
            .fetch_raw_file(REFERENCE_CATEGORY, u32::from(REFERENCE_CATEGORY))
            .await?;
        let data = decompress(&raw)?;
        Ok(MasterReferenceTable::decode(&data)?)
    }

    /// Every category the master table describes
    pub async fn categories(&self) -> Result<Vec<u8>> {
        Ok(self.master_reference_table().await?.categories())
    }

    /// Extract one file to the output tree and return the written paths.
    ///
    /// Plain files land at `{output_dir}/{category}/{file_id}[.{ext}]`;
    /// archive files write one `{file_id}-{entry_id}` path per entry.
    /// Existing targets are skipped unless `overwrite`, and skipped targets
    /// are not reported.
    pub async fn extract(&self, category: u8, file_id: u32, overwrite: bool) -> Result<Vec<PathBuf>> {
        let file = self.file(category, file_id).await?;

        let category_dir = self.output_dir.join(category.to_string());
        fs::create_dir_all(&category_dir)?;

        let mut written = Vec::new();

        if file.is_archive() {
            for (entry_id, bytes) in &file.entries {
                let path = category_dir.join(format!("{file_id}-{entry_id}"));
                if !overwrite && path.exists() {
                    debug!(path = %path.display(), "target exists, skipping");
                    continue;
                }
                fs::write(&path, bytes)?;
                written.push(path);
            }
        } else {
            let name = match file.extension {
                Some(extension) => format!("{file_id}.{extension}"),
                None => file_id.to_string(),
            };
            let path = category_dir.join(name);
            if !overwrite && path.exists() {
                debug!(path = %path.display(), "target exists, skipping");
            } else {
                fs::write(&path, &file.data)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Extract every file in a category, catching per-file failures.
    ///
    /// Recoverable errors (missing, corrupt, or malformed files) are logged
    /// and collected; session-level errors abort the pass.
    #[instrument(skip(self))]
    pub async fn extract_category(
        &self,
        category: u8,
        overwrite: bool,
    ) -> Result<CategoryExtraction> {
        let file_ids = self.source.file_ids(category).await?;
        info!(category, files = file_ids.len(), "extracting category");

        let mut extraction = CategoryExtraction::default();
        for file_id in file_ids {
            match self.extract(category, file_id, overwrite).await {
                Ok(mut paths) => extraction.written.append(&mut paths),
                Err(err) if err.is_recoverable() => {
                    warn!(category, file_id, %err, "skipping file");
                    extraction.failures.push((file_id, err));
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            category,
            written = extraction.written.len(),
            failed = extraction.failures.len(),
            "category extraction finished"
        );
        Ok(extraction)
    }
}
