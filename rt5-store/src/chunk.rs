//! Chunk layout constants and header parsing.
//!
//! The data file is an array of 520-byte chunks. Each chunk opens with a
//! header naming the file it belongs to, the chunk's ordinal within that
//! file, the chunk number of the next link in the chain, and the category;
//! the payload fills the rest. File ids that need more than 16 bits widen
//! the id field to four bytes, shrinking the payload by two.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};

use crate::Result;

/// Total size of one chunk in the data file
pub const CHUNK_LENGTH: usize = 520;

/// Header size for 16-bit file ids
pub const HEADER_LENGTH: usize = 8;

/// Header size for widened file ids
pub const EXTENDED_HEADER_LENGTH: usize = 10;

/// Payload capacity behind an 8-byte header
pub const PAYLOAD_CAPACITY: usize = CHUNK_LENGTH - HEADER_LENGTH;

/// Payload capacity behind a 10-byte header
pub const EXTENDED_PAYLOAD_CAPACITY: usize = CHUNK_LENGTH - EXTENDED_HEADER_LENGTH;

/// Smallest file id that needs the widened header
pub const EXTENDED_ID_THRESHOLD: u32 = 65536;

/// Decoded chunk header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// File the chunk belongs to
    pub file_id: u32,
    /// Ordinal of this chunk within the file, modulo 65536
    pub chunk_index: u16,
    /// Chunk number of the next link; meaningless on the terminal chunk
    pub next_chunk: u32,
    /// Category the file belongs to
    pub category: u8,
}

impl ChunkHeader {
    /// Parse a header from the front of a chunk.
    pub fn parse(bytes: &[u8], extended: bool) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let file_id = if extended {
            cursor.read_u32::<BigEndian>()?
        } else {
            u32::from(cursor.read_u16::<BigEndian>()?)
        };
        let chunk_index = cursor.read_u16::<BigEndian>()?;
        let next_chunk = cursor.read_u24::<BigEndian>()?;
        let category = cursor.read_u8()?;

        Ok(Self {
            file_id,
            chunk_index,
            next_chunk,
            category,
        })
    }

    /// Header size for a given file id width
    pub fn length(extended: bool) -> usize {
        if extended {
            EXTENDED_HEADER_LENGTH
        } else {
            HEADER_LENGTH
        }
    }

    /// Payload capacity for a given file id width
    pub fn payload_capacity(extended: bool) -> usize {
        if extended {
            EXTENDED_PAYLOAD_CAPACITY
        } else {
            PAYLOAD_CAPACITY
        }
    }
}
