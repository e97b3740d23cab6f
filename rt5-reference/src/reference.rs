//! Per-category reference table decoding.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use tracing::trace;

use crate::{Error, Result};

/// Table format without a version field for the table itself.
pub const FORMAT_UNVERSIONED: u8 = 5;

/// Table format carrying a u32 version for the table itself.
pub const FORMAT_VERSIONED: u8 = 6;

/// Flag bit: per-file entry-id lists are present.
const FLAG_ENTRY_LISTS: u8 = 0x1;

/// Metadata for one file within a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// CRC-32 of the file's raw container bytes
    pub crc: u32,
    /// File version
    pub version: u32,
    /// Entry ids for archive containers; empty for plain files
    pub entry_ids: BTreeSet<u32>,
}

/// Decoded reference table for one category.
///
/// Treated as immutable once decoded; consumers share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    format: u8,
    version: u32,
    entries: BTreeMap<u32, FileEntry>,
}

impl ReferenceTable {
    /// Decode a table from a decompressed container.
    ///
    /// Both known on-disk variants are accepted: format 5 (unversioned) and
    /// format 6 (a u32 table version follows the format byte). Any other
    /// leading byte is [`Error::UnsupportedFormat`].
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);

        let format = cursor.read_u8()?;
        if format != FORMAT_UNVERSIONED && format != FORMAT_VERSIONED {
            return Err(Error::UnsupportedFormat(format));
        }

        let version = if format >= FORMAT_VERSIONED {
            cursor.read_u32::<BigEndian>()?
        } else {
            0
        };

        let flags = cursor.read_u8()?;
        let has_entry_lists = flags & FLAG_ENTRY_LISTS != 0;

        let file_count = cursor.read_u16::<BigEndian>()? as usize;
        trace!(format, version, file_count, has_entry_lists, "decoding reference table");

        // File ids are delta-coded; cumulative sums give absolute ids.
        let mut file_ids = Vec::with_capacity(file_count);
        let mut id = 0u32;
        for _ in 0..file_count {
            id = id.wrapping_add(u32::from(cursor.read_u16::<BigEndian>()?));
            file_ids.push(id);
        }

        let mut crcs = Vec::with_capacity(file_count);
        for _ in 0..file_count {
            crcs.push(cursor.read_u32::<BigEndian>()?);
        }

        let mut versions = Vec::with_capacity(file_count);
        for _ in 0..file_count {
            versions.push(cursor.read_u32::<BigEndian>()?);
        }

        let mut entry_lists = vec![BTreeSet::new(); file_count];
        if has_entry_lists {
            let mut entry_counts = Vec::with_capacity(file_count);
            for _ in 0..file_count {
                entry_counts.push(cursor.read_u16::<BigEndian>()? as usize);
            }

            for (list, &count) in entry_lists.iter_mut().zip(&entry_counts) {
                let mut entry_id = 0u32;
                for _ in 0..count {
                    entry_id = entry_id.wrapping_add(u32::from(cursor.read_u16::<BigEndian>()?));
                    list.insert(entry_id);
                }
            }
        }

        let entries = file_ids
            .into_iter()
            .zip(crcs)
            .zip(versions)
            .zip(entry_lists)
            .map(|(((file_id, crc), version), entry_ids)| {
                (
                    file_id,
                    FileEntry {
                        crc,
                        version,
                        entry_ids,
                    },
                )
            })
            .collect();

        Ok(Self {
            format,
            version,
            entries,
        })
    }

    /// Metadata for one file, or `None` when the category does not hold it
    pub fn entry(&self, file_id: u32) -> Option<&FileEntry> {
        self.entries.get(&file_id)
    }

    /// Absolute ids of every file in the category, ascending
    pub fn file_ids(&self) -> Vec<u32> {
        self.entries.keys().copied().collect()
    }

    /// Iterate over `(file_id, entry)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &FileEntry)> {
        self.entries.iter().map(|(&id, entry)| (id, entry))
    }

    /// Number of files the table describes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table describes no files
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The table's format byte (5 or 6)
    pub fn format(&self) -> u8 {
        self.format
    }

    /// The table's own version; 0 for format 5 tables
    pub fn version(&self) -> u32 {
        self.version
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    /// Encode a table fixture in the on-disk layout.
    pub(crate) fn encode_table(
        format: u8,
        table_version: u32,
        files: &[(u32, u32, u32, &[u32])],
    ) -> Vec<u8> {
        let with_entries = files.iter().any(|(_, _, _, ids)| !ids.is_empty());

        let mut data = vec![format];
        if format >= FORMAT_VERSIONED {
            data.extend_from_slice(&table_version.to_be_bytes());
        }
        data.push(u8::from(with_entries));
        data.extend_from_slice(&(files.len() as u16).to_be_bytes());

        let mut previous = 0u32;
        for &(file_id, _, _, _) in files {
            data.extend_from_slice(&((file_id - previous) as u16).to_be_bytes());
            previous = file_id;
        }
        for &(_, crc, _, _) in files {
            data.extend_from_slice(&crc.to_be_bytes());
        }
        for &(_, _, version, _) in files {
            data.extend_from_slice(&version.to_be_bytes());
        }
        if with_entries {
            for &(_, _, _, ids) in files {
                data.extend_from_slice(&(ids.len() as u16).to_be_bytes());
            }
            for &(_, _, _, ids) in files {
                let mut previous = 0u32;
                for &entry_id in ids {
                    data.extend_from_slice(&((entry_id - previous) as u16).to_be_bytes());
                    previous = entry_id;
                }
            }
        }
        data
    }

    #[test]
    fn decodes_versioned_table_with_entry_lists() {
        let fixture = encode_table(
            FORMAT_VERSIONED,
            12,
            &[
                (3, 0xdead_beef, 7, &[0, 1, 5]),
                (5, 0x0102_0304, 2, &[65, 255]),
                (900, 42, 1, &[]),
            ],
        );

        let table = ReferenceTable::decode(&fixture).unwrap();
        assert_eq!(table.format(), FORMAT_VERSIONED);
        assert_eq!(table.version(), 12);
        assert_eq!(table.len(), 3);
        assert_eq!(table.file_ids(), vec![3, 5, 900]);

        let entry = table.entry(3).unwrap();
        assert_eq!(entry.crc, 0xdead_beef);
        assert_eq!(entry.version, 7);
        assert_eq!(entry.entry_ids, BTreeSet::from([0, 1, 5]));

        let entry = table.entry(5).unwrap();
        assert_eq!(entry.entry_ids, BTreeSet::from([65, 255]));

        assert!(table.entry(900).unwrap().entry_ids.is_empty());
        assert!(table.entry(4).is_none());
    }

    #[test]
    fn decodes_unversioned_table_without_entry_lists() {
        let fixture = encode_table(
            FORMAT_UNVERSIONED,
            0,
            &[(1, 10, 100, &[]), (2, 20, 200, &[]), (4, 40, 400, &[])],
        );

        let table = ReferenceTable::decode(&fixture).unwrap();
        assert_eq!(table.format(), FORMAT_UNVERSIONED);
        assert_eq!(table.version(), 0);
        assert_eq!(table.file_ids(), vec![1, 2, 4]);
        assert_eq!(table.entry(2).unwrap().crc, 20);
        assert_eq!(table.entry(4).unwrap().version, 400);
    }

    #[test]
    fn unknown_format_is_fatal() {
        let fixture = encode_table(FORMAT_UNVERSIONED, 0, &[]);
        let mut bad = fixture;
        bad[0] = 4;
        assert!(matches!(
            ReferenceTable::decode(&bad),
            Err(Error::UnsupportedFormat(4))
        ));
    }

    #[test]
    fn truncated_table_is_an_error() {
        let fixture = encode_table(FORMAT_VERSIONED, 1, &[(1, 10, 100, &[2, 3])]);
        assert!(matches!(
            ReferenceTable::decode(&fixture[..fixture.len() - 2]),
            Err(Error::Io(_))
        ));
    }
}
