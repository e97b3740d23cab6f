//! Random access over the shared data file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use memmap2::{Mmap, MmapOptions};
use parking_lot::Mutex;
use tracing::debug;

use crate::{Error, Result};

/// The opened `main_file_cache.dat2`.
///
/// Memory-mapped when possible so concurrent reconstructions stay
/// lock-free; the seek-and-read fallback serializes behind a mutex because
/// seek and read must not interleave across threads on one handle.
#[derive(Debug)]
pub struct DataFile {
    backing: Backing,
    length: u64,
}

#[derive(Debug)]
enum Backing {
    Mapped(Mmap),
    Plain(Mutex<File>),
}

impl DataFile {
    /// Open the data file at `path`.
    pub fn open(path: &Path, use_memory_mapping: bool) -> Result<Self> {
        let file = File::open(path)?;
        let length = file.metadata()?.len();

        let backing = if use_memory_mapping && length > 0 {
            // SAFETY: the store assumes no other process writes to the data
            // file while it is open, per the concurrency contract.
            #[allow(unsafe_code)]
            match unsafe { MmapOptions::new().map(&file) } {
                Ok(mmap) => {
                    debug!(path = %path.display(), length, "memory-mapped data file");
                    Backing::Mapped(mmap)
                }
                Err(e) => {
                    debug!(path = %path.display(), "mmap failed, using file reads: {e}");
                    Backing::Plain(Mutex::new(file))
                }
            }
        } else {
            Backing::Plain(Mutex::new(file))
        };

        Ok(Self { backing, length })
    }

    /// Length of the data file in bytes
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Read `length` bytes at `offset`.
    pub fn read_at(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        if offset + length as u64 > self.length {
            return Err(Error::ReadOutOfBounds {
                offset,
                length,
                size: self.length,
            });
        }

        match &self.backing {
            Backing::Mapped(mmap) => {
                let start = offset as usize;
                Ok(mmap[start..start + length].to_vec())
            }
            Backing::Plain(file) => {
                let mut guard = file.lock();
                guard.seek(SeekFrom::Start(offset))?;
                let mut buffer = vec![0u8; length];
                guard.read_exact(&mut buffer)?;
                Ok(buffer)
            }
        }
    }
}
