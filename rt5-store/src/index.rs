//! Per-category index files.
//!
//! An index file is an array of fixed 6-byte records, one per file id:
//! a 24-bit file size followed by a 24-bit first chunk number. A record of
//! zero size or zero chunk number denotes an absent file.

/// Size of one index record
pub const INDEX_RECORD_LENGTH: usize = 6;

/// One decoded index record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    /// Size of the reconstructed file in bytes
    pub file_size: u32,
    /// Chunk number of the first chunk; byte offset is `* 520`
    pub first_chunk: u32,
}

impl IndexRecord {
    /// Whether this record points at stored data at all.
    pub fn is_present(&self) -> bool {
        self.file_size > 0 && self.first_chunk > 0
    }
}

/// An eagerly loaded index file for one category.
#[derive(Debug)]
pub struct CategoryIndex {
    records: Vec<u8>,
}

impl CategoryIndex {
    /// Wrap the raw bytes of an index file.
    pub fn from_bytes(records: Vec<u8>) -> Self {
        Self { records }
    }

    /// Number of records the file holds
    pub fn file_count(&self) -> usize {
        self.records.len() / INDEX_RECORD_LENGTH
    }

    /// The record for one file id, or `None` past the end of the index.
    pub fn record(&self, file_id: u32) -> Option<IndexRecord> {
        let offset = file_id as usize * INDEX_RECORD_LENGTH;
        let bytes = self.records.get(offset..offset + INDEX_RECORD_LENGTH)?;
        Some(IndexRecord {
            file_size: read_u24(&bytes[0..3]),
            first_chunk: read_u24(&bytes[3..6]),
        })
    }

    /// Ids of every present record, ascending.
    pub fn present_ids(&self) -> Vec<u32> {
        (0..self.file_count() as u32)
            .filter(|&id| self.record(id).is_some_and(|r| r.is_present()))
            .collect()
    }
}

fn read_u24(bytes: &[u8]) -> u32 {
    (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2])
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn record_bytes(file_size: u32, first_chunk: u32) -> [u8; 6] {
        let size = file_size.to_be_bytes();
        let chunk = first_chunk.to_be_bytes();
        [size[1], size[2], size[3], chunk[1], chunk[2], chunk[3]]
    }

    #[test]
    fn decodes_records_at_fixed_offsets() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&record_bytes(0, 0));
        bytes.extend_from_slice(&record_bytes(1234, 7));
        let index = CategoryIndex::from_bytes(bytes);

        assert_eq!(index.file_count(), 2);
        assert!(!index.record(0).unwrap().is_present());
        assert_eq!(
            index.record(1).unwrap(),
            IndexRecord {
                file_size: 1234,
                first_chunk: 7
            }
        );
        assert_eq!(index.record(2), None);
    }

    #[test]
    fn present_ids_skips_absent_records() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&record_bytes(10, 1));
        bytes.extend_from_slice(&record_bytes(0, 5));
        bytes.extend_from_slice(&record_bytes(10, 0));
        bytes.extend_from_slice(&record_bytes(99, 2));
        let index = CategoryIndex::from_bytes(bytes);

        assert_eq!(index.present_ids(), vec![0, 3]);
    }
}
