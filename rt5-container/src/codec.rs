//! Compression detection and reversal for container payloads.
//!
//! Stored containers strip the standard stream headers to save space: a
//! gzip payload begins at offset 9 behind the container descriptor, and a
//! bzip2 payload additionally omits the four-byte `BZh1` file header, which
//! has to be reinserted before decompression. Detection goes by magic bytes
//! at fixed offsets, never by the container's type byte.

use std::io::Read;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tracing::trace;

use crate::{Error, Result};

/// Offset of the compressed stream within a container: the 5-byte container
/// header followed by the 4-byte uncompressed length.
const STREAM_OFFSET: usize = 9;

/// Gzip stream magic, found at [`STREAM_OFFSET`].
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Bzip2 block magic (the stream content after the file header), found at
/// [`STREAM_OFFSET`] because the stored form drops the file header.
const BZIP2_BLOCK_MAGIC: [u8; 6] = [0x31, 0x41, 0x59, 0x26, 0x53, 0x59];

/// The omitted bzip2 file header: "BZ" signature, version 'h', 100kB block size.
const BZIP2_FILE_HEADER: [u8; 4] = *b"BZh1";

/// Compression type byte carried in a container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionKind {
    /// Payload is stored as-is
    None = 0,
    /// Headerless bzip2 stream
    Bzip2 = 1,
    /// Gzip stream
    Gzip = 2,
}

impl CompressionKind {
    /// Create from a container type byte
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Bzip2),
            2 => Some(Self::Gzip),
            _ => None,
        }
    }

    /// Whether a container of this kind carries the extra 4-byte
    /// uncompressed-length field after the header.
    pub fn has_uncompressed_length(self) -> bool {
        self != Self::None
    }
}

/// Detect the compression scheme of a reconstructed container and return the
/// decompressed payload.
///
/// Uncompressed containers are returned unchanged, including their 5-byte
/// header; downstream signature sniffing strips it when it recognizes the
/// content at offset 5.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() > 10 && bytes[9..11] == GZIP_MAGIC {
        trace!("container holds a gzip stream ({} bytes)", bytes.len());

        let mut decoder = GzDecoder::new(&bytes[STREAM_OFFSET..]);
        let mut plain = Vec::with_capacity(bytes.len().saturating_mul(2));
        decoder
            .read_to_end(&mut plain)
            .map_err(|e| Error::Decompression(format!("gzip: {e}")))?;

        return Ok(plain);
    }

    if bytes.len() > 14 && bytes[9..15] == BZIP2_BLOCK_MAGIC {
        trace!("container holds a headerless bzip2 stream ({} bytes)", bytes.len());

        let mut stream = Vec::with_capacity(BZIP2_FILE_HEADER.len() + bytes.len() - STREAM_OFFSET);
        stream.extend_from_slice(&BZIP2_FILE_HEADER);
        stream.extend_from_slice(&bytes[STREAM_OFFSET..]);

        let mut decoder = BzDecoder::new(stream.as_slice());
        let mut plain = Vec::with_capacity(bytes.len().saturating_mul(4));
        decoder
            .read_to_end(&mut plain)
            .map_err(|e| Error::Decompression(format!("bzip2: {e}")))?;

        return Ok(plain);
    }

    Ok(bytes.to_vec())
}
