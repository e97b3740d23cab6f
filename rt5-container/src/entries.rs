//! Archive entry splitting.
//!
//! Archive-style cache files pack their entries front-to-back in one or
//! more stripes and describe the boundaries in a trailing directory: the
//! final byte is the stripe count, preceded by `stripes * entries`
//! big-endian i32 size deltas. Each delta adjusts the previous slice size
//! within its stripe (a running sum), so the directory has to be decoded
//! before the front of the buffer can be sliced.

use std::collections::BTreeMap;
use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use tracing::trace;

use crate::{Error, Result};

/// Split a decompressed archive container into its entries.
///
/// `entry_ids` is the ordered id list declared by the category's reference
/// table; the sliced buffers are mapped onto it positionally. Any
/// disagreement between the directory and the buffer (directory larger than
/// the container, negative running sizes, slices that do not exactly cover
/// the data area) fails the whole container.
pub fn split_entries(data: &[u8], entry_ids: &[u32]) -> Result<BTreeMap<u32, Vec<u8>>> {
    let entry_count = entry_ids.len();

    if data.is_empty() {
        return Err(Error::TruncatedEntryTable {
            expected: 1,
            actual: 0,
        });
    }

    let stripe_count = data[data.len() - 1] as usize;
    let directory_length = 1 + stripe_count * entry_count * 4;
    if directory_length > data.len() {
        return Err(Error::TruncatedEntryTable {
            expected: directory_length,
            actual: data.len(),
        });
    }

    let data_length = data.len() - directory_length;
    trace!(
        stripes = stripe_count,
        entries = entry_count,
        data_length,
        "decoding trailing entry directory"
    );

    // Running-sum decode of the size matrix, stripe-major.
    let mut sizes = vec![vec![0usize; entry_count]; stripe_count];
    let mut cursor = Cursor::new(&data[data_length..data.len() - 1]);
    for (stripe, stripe_sizes) in sizes.iter_mut().enumerate() {
        let mut size = 0i64;
        for slot in stripe_sizes.iter_mut() {
            size += i64::from(cursor.read_i32::<BigEndian>()?);
            if size < 0 || size > data_length as i64 {
                return Err(Error::EntrySizeOutOfRange { stripe, size });
            }
            *slot = size as usize;
        }
    }

    // Slice the data area front-to-back in the same stripe-major order.
    let mut buffers: Vec<Vec<u8>> = vec![Vec::new(); entry_count];
    let mut offset = 0usize;
    for stripe_sizes in &sizes {
        for (slot, &size) in stripe_sizes.iter().enumerate() {
            let end = offset + size;
            if end > data_length {
                return Err(Error::EntrySizeMismatch {
                    accounted: end,
                    available: data_length,
                });
            }
            buffers[slot].extend_from_slice(&data[offset..end]);
            offset = end;
        }
    }

    if offset != data_length {
        return Err(Error::EntrySizeMismatch {
            accounted: offset,
            available: data_length,
        });
    }

    Ok(entry_ids.iter().copied().zip(buffers).collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    /// Build an archive container from per-entry payloads, optionally split
    /// across several stripes.
    fn build_archive(entries: &[&[u8]], stripes: usize) -> Vec<u8> {
        let mut data = Vec::new();
        let mut sizes = vec![vec![0usize; entries.len()]; stripes];

        for stripe in 0..stripes {
            for (slot, entry) in entries.iter().enumerate() {
                let per_stripe = entry.len() / stripes;
                let start = stripe * per_stripe;
                let end = if stripe == stripes - 1 {
                    entry.len()
                } else {
                    start + per_stripe
                };
                data.extend_from_slice(&entry[start..end]);
                sizes[stripe][slot] = end - start;
            }
        }

        for stripe_sizes in &sizes {
            let mut previous = 0i64;
            for &size in stripe_sizes {
                let delta = size as i64 - previous;
                data.extend_from_slice(&(delta as i32).to_be_bytes());
                previous = size as i64;
            }
        }
        data.push(stripes as u8);
        data
    }

    #[test]
    fn splits_single_stripe_archive() {
        let container = build_archive(&[b"first entry", b"second", b""], 1);
        let entries = split_entries(&container, &[3, 9, 255]).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[&3], b"first entry");
        assert_eq!(entries[&9], b"second");
        assert_eq!(entries[&255], b"");
    }

    #[test]
    fn reassembles_entries_across_stripes() {
        let container = build_archive(&[b"interleaved across stripes", b"short"], 3);
        let entries = split_entries(&container, &[10, 20]).unwrap();

        assert_eq!(entries[&10], b"interleaved across stripes");
        assert_eq!(entries[&20], b"short");
    }

    #[test]
    fn truncated_directory_is_rejected() {
        let mut container = build_archive(&[b"abc", b"def"], 1);
        // Claim 200 stripes; the directory cannot fit.
        let len = container.len();
        container[len - 1] = 200;

        assert!(matches!(
            split_entries(&container, &[1, 2]),
            Err(Error::TruncatedEntryTable { .. })
        ));
    }

    #[test]
    fn negative_running_size_is_rejected() {
        let mut container = Vec::new();
        container.extend_from_slice(b"abcdef");
        container.extend_from_slice(&(-3i32).to_be_bytes());
        container.extend_from_slice(&9i32.to_be_bytes());
        container.push(1);

        assert!(matches!(
            split_entries(&container, &[1, 2]),
            Err(Error::EntrySizeOutOfRange { .. })
        ));
    }

    #[test]
    fn sizes_must_cover_the_data_area() {
        let mut container = Vec::new();
        container.extend_from_slice(b"abcdef");
        // Two entries of one byte each leave four bytes unaccounted for.
        container.extend_from_slice(&1i32.to_be_bytes());
        container.extend_from_slice(&0i32.to_be_bytes());
        container.push(1);

        assert!(matches!(
            split_entries(&container, &[1, 2]),
            Err(Error::EntrySizeMismatch { .. })
        ));
    }
}
