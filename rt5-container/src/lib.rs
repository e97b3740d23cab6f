//! JS5 container handling for RuneTek5 caches.
//!
//! A container is the outer envelope of every stored or downloaded cache
//! file: a compression type byte, a length field, and a possibly-compressed
//! payload. This crate detects and reverses the two compression schemes the
//! format uses, sniffs content signatures to assign file extensions, and
//! splits archive-style containers into their numbered entries using the
//! trailing directory.

pub mod codec;
pub mod entries;
pub mod error;
pub mod io;
pub mod sniff;

pub use codec::{CompressionKind, decompress};
pub use entries::split_entries;
pub use error::{Error, Result};
pub use sniff::sniff;

/// Size of the container header: compression type byte plus a 32-bit length.
pub const CONTAINER_HEADER_LENGTH: usize = 5;
