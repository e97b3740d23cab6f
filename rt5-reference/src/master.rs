//! Master reference table: the reference table describing all categories.

use std::collections::BTreeMap;

use crate::reference::ReferenceTable;
use crate::{Error, Result};

/// Expected CRC and version of one category's reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceTableDescriptor {
    /// CRC-32 of the reference table's raw container bytes
    pub crc: u32,
    /// Version of the reference table
    pub version: u32,
}

/// The table of tables.
///
/// Decodes the same binary layout as [`ReferenceTable`]; its "files" are the
/// categories themselves, so ids are re-keyed down to `u8`.
#[derive(Debug, Clone)]
pub struct MasterReferenceTable {
    descriptors: BTreeMap<u8, ReferenceTableDescriptor>,
}

impl MasterReferenceTable {
    /// Decode a master table from a decompressed container.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let table = ReferenceTable::decode(data)?;

        let mut descriptors = BTreeMap::new();
        for (file_id, entry) in table.iter() {
            let category =
                u8::try_from(file_id).map_err(|_| Error::CategoryOutOfRange(file_id))?;
            descriptors.insert(
                category,
                ReferenceTableDescriptor {
                    crc: entry.crc,
                    version: entry.version,
                },
            );
        }

        Ok(Self { descriptors })
    }

    /// Descriptor for one category's reference table
    pub fn descriptor(&self, category: u8) -> Option<&ReferenceTableDescriptor> {
        self.descriptors.get(&category)
    }

    /// Every described category, ascending
    pub fn categories(&self) -> Vec<u8> {
        self.descriptors.keys().copied().collect()
    }

    /// Number of described categories
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the master table describes no categories
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
