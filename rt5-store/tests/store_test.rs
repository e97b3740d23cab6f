//! Reconstruction tests over synthetic dat2/idx fixtures.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use rt5_store::chunk::{CHUNK_LENGTH, EXTENDED_ID_THRESHOLD};
use rt5_store::{DiskCacheStore, Error, StoreConfig};
use tempfile::TempDir;

/// Builds a synthetic data file plus per-category index files.
#[derive(Default)]
struct FixtureBuilder {
    data: Vec<u8>,
    // category -> (file_id -> (size, first_chunk))
    records: HashMap<u8, HashMap<u32, (u32, u32)>>,
}

impl FixtureBuilder {
    fn new() -> Self {
        // Chunk 0 is unusable: a zero first-chunk marks an absent file.
        Self {
            data: vec![0u8; CHUNK_LENGTH],
            records: HashMap::new(),
        }
    }

    /// Append a file as a chain of chunks and record it in the index.
    fn add_file(&mut self, category: u8, file_id: u32, payload: &[u8]) {
        let extended = file_id >= EXTENDED_ID_THRESHOLD;
        let capacity = if extended { 510 } else { 512 };

        let chunk_count = payload.len().div_ceil(capacity).max(1);
        let first_chunk = (self.data.len() / CHUNK_LENGTH) as u32;

        for ordinal in 0..chunk_count {
            let start = ordinal * capacity;
            let end = (start + capacity).min(payload.len());
            let next = if ordinal + 1 < chunk_count {
                first_chunk + ordinal as u32 + 1
            } else {
                0
            };

            let mut chunk = Vec::with_capacity(CHUNK_LENGTH);
            if extended {
                chunk.extend_from_slice(&file_id.to_be_bytes());
            } else {
                chunk.extend_from_slice(&(file_id as u16).to_be_bytes());
            }
            chunk.extend_from_slice(&(ordinal as u16).to_be_bytes());
            chunk.extend_from_slice(&next.to_be_bytes()[1..4]);
            chunk.push(category);
            chunk.extend_from_slice(&payload[start..end]);
            chunk.resize(CHUNK_LENGTH, 0);
            self.data.extend_from_slice(&chunk);
        }

        self.records
            .entry(category)
            .or_default()
            .insert(file_id, (payload.len() as u32, first_chunk));
    }

    /// Record an index entry without storing any chunks.
    fn add_record(&mut self, category: u8, file_id: u32, size: u32, first_chunk: u32) {
        self.records
            .entry(category)
            .or_default()
            .insert(file_id, (size, first_chunk));
    }

    fn write(&self, dir: &Path) {
        fs::write(dir.join("main_file_cache.dat2"), &self.data).unwrap();

        for (&category, files) in &self.records {
            let max_id = files.keys().max().copied().unwrap_or(0);
            let mut index = vec![0u8; (max_id as usize + 1) * 6];
            for (&file_id, &(size, first_chunk)) in files {
                let offset = file_id as usize * 6;
                index[offset..offset + 3].copy_from_slice(&size.to_be_bytes()[1..4]);
                index[offset + 3..offset + 6].copy_from_slice(&first_chunk.to_be_bytes()[1..4]);
            }
            fs::write(dir.join(format!("main_file_cache.idx{category}")), index).unwrap();
        }
    }

    /// Flip bytes at `offset` within chunk number `chunk`.
    fn corrupt(&mut self, chunk: u32, offset: usize, value: u8) {
        self.data[chunk as usize * CHUNK_LENGTH + offset] = value;
    }
}

fn open(dir: &TempDir) -> DiskCacheStore {
    DiskCacheStore::open(StoreConfig::new(dir.path())).unwrap()
}

#[test]
fn reassembles_multi_chunk_files_byte_for_byte() {
    let payload: Vec<u8> = (0..1300u32).map(|i| (i % 251) as u8).collect();
    let mut fixture = FixtureBuilder::new();
    fixture.add_file(12, 3, &payload);

    let dir = TempDir::new().unwrap();
    fixture.write(dir.path());

    let store = open(&dir);
    assert_eq!(store.reconstruct(12, 3).unwrap(), payload);
}

#[test]
fn extended_file_ids_use_the_widened_header() {
    let file_id = EXTENDED_ID_THRESHOLD + 4_464;
    let payload: Vec<u8> = (0..1200u32).map(|i| (i % 7) as u8).collect();
    let mut fixture = FixtureBuilder::new();
    fixture.add_file(5, file_id, &payload);

    let dir = TempDir::new().unwrap();
    fixture.write(dir.path());

    let store = open(&dir);
    assert_eq!(store.reconstruct(5, file_id).unwrap(), payload);
}

#[test]
fn works_without_memory_mapping() {
    let payload = vec![0xabu8; 900];
    let mut fixture = FixtureBuilder::new();
    fixture.add_file(2, 1, &payload);

    let dir = TempDir::new().unwrap();
    fixture.write(dir.path());

    let store =
        DiskCacheStore::open(StoreConfig::new(dir.path()).with_memory_mapping(false)).unwrap();
    assert_eq!(store.reconstruct(2, 1).unwrap(), payload);
}

#[test]
fn absent_records_are_not_found() {
    let mut fixture = FixtureBuilder::new();
    fixture.add_file(12, 3, b"present");
    fixture.add_record(12, 4, 0, 9); // zero size
    fixture.add_record(12, 5, 10, 0); // zero chunk
    fixture.add_record(12, 6, 1_000_000, 1); // span past end of data

    let dir = TempDir::new().unwrap();
    fixture.write(dir.path());

    let store = open(&dir);
    for file_id in [4, 5, 6, 700] {
        assert!(
            matches!(
                store.reconstruct(12, file_id),
                Err(Error::EntryNotFound { .. })
            ),
            "file {file_id} should be absent"
        );
    }
    assert!(matches!(
        store.reconstruct(13, 0),
        Err(Error::IndexNotFound(13))
    ));
}

#[test]
fn corrupt_chunks_fail_only_their_own_file() {
    let doomed: Vec<u8> = vec![1u8; 700];
    let sibling: Vec<u8> = vec![2u8; 700];

    // One fixture per corrupted header field.
    for (offset, value) in [
        (3, 0x77), // chunk index low byte
        (7, 0x99), // category
        (4, 0xff), // next chunk pointer, far out of range
    ] {
        let mut fixture = FixtureBuilder::new();
        fixture.add_file(12, 3, &doomed);
        fixture.add_file(12, 9, &sibling);
        fixture.corrupt(1, offset, value);

        let dir = TempDir::new().unwrap();
        fixture.write(dir.path());

        let store = open(&dir);
        assert!(
            matches!(
                store.reconstruct(12, 3),
                Err(Error::ChunkIntegrity { file_id: 3, .. })
            ),
            "corruption at header offset {offset} should fail the file"
        );
        assert_eq!(store.reconstruct(12, 9).unwrap(), sibling);
    }
}

#[test]
fn wrong_file_id_in_header_is_corruption() {
    let mut fixture = FixtureBuilder::new();
    fixture.add_file(12, 3, &vec![5u8; 100]);
    fixture.corrupt(1, 1, 0x63); // file id low byte: 3 -> 99

    let dir = TempDir::new().unwrap();
    fixture.write(dir.path());

    let store = open(&dir);
    assert!(matches!(
        store.reconstruct(12, 3),
        Err(Error::ChunkIntegrity { .. })
    ));
}

#[test]
fn file_ids_scans_the_index() {
    let mut fixture = FixtureBuilder::new();
    fixture.add_file(12, 1, b"a");
    fixture.add_file(12, 5, b"b");
    fixture.add_record(12, 3, 0, 0);
    fixture.add_file(40, 2, b"c");

    let dir = TempDir::new().unwrap();
    fixture.write(dir.path());

    let store = open(&dir);
    assert_eq!(store.file_ids(12).unwrap(), vec![1, 5]);
    assert_eq!(store.file_ids(40).unwrap(), vec![2]);
    assert_eq!(store.categories(), vec![12, 40]);
}

#[test]
fn missing_data_file_is_fatal_at_open() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        DiskCacheStore::open(StoreConfig::new(dir.path())),
        Err(Error::DataFileNotFound(_))
    ));
}

#[tokio::test]
async fn serves_raw_containers_through_the_source_trait() {
    use rt5_cache::CacheSource;

    let payload = vec![9u8; 300];
    let mut fixture = FixtureBuilder::new();
    fixture.add_file(12, 3, &payload);

    let dir = TempDir::new().unwrap();
    fixture.write(dir.path());

    let store = open(&dir);
    assert_eq!(store.fetch_raw_file(12, 3).await.unwrap(), payload);
    assert!(matches!(
        store.fetch_raw_file(12, 4).await,
        Err(rt5_cache::Error::FileNotFound { .. })
    ));
}
