//! Wire encoding for the content protocol.
//!
//! All multi-byte integers on this protocol are big-endian. Packets are
//! built in memory and written in one call so they cannot interleave
//! with packets from other tasks.

use byteorder::{BigEndian, WriteBytesExt};
use rt5_container::io::WriteCstrExt;

use crate::config::Language;
use crate::Result;

/// Packet type opening the version handshake.
pub const HANDSHAKE_TYPE: u8 = 15;
/// Handshake response accepting the offered version.
pub const RESPONSE_SUCCESS: u8 = 0;
/// Handshake response rejecting the offered major version.
pub const RESPONSE_OUTDATED: u8 = 6;
/// Bytes of loading requirements sent after a successful handshake.
pub const LOADING_REQUIREMENTS_LENGTH: usize = 26 * 4;
/// Length of a file request packet.
pub const REQUEST_LENGTH: usize = 6;

/// Builds the handshake packet for the given versions and key.
///
/// Layout: type byte, u8 remaining length, i32 major, i32 minor,
/// NUL-terminated key, language byte.
pub fn handshake_packet(
    major_version: u32,
    minor_version: u32,
    key: &str,
    language: Language,
) -> Result<Vec<u8>> {
    let length = 4 + 4 + key.len() + 1 + 1;
    let mut packet = Vec::with_capacity(2 + length);
    packet.write_u8(HANDSHAKE_TYPE)?;
    packet.write_u8(u8::try_from(length).unwrap_or(u8::MAX))?;
    packet.write_i32::<BigEndian>(major_version as i32)?;
    packet.write_i32::<BigEndian>(minor_version as i32)?;
    packet.write_cstr(key)?;
    packet.write_u8(language as u8)?;
    Ok(packet)
}

/// Builds the two connection info packets sent once after the handshake.
///
/// Their meaning is not publicly documented; the byte values are the
/// ones every known loader sends.
pub fn connection_info_packets() -> Result<Vec<u8>> {
    let mut packet = Vec::with_capacity(12);
    packet.write_u8(6)?;
    packet.write_u24::<BigEndian>(4)?;
    packet.write_u16::<BigEndian>(0)?;
    packet.write_u8(3)?;
    packet.write_u24::<BigEndian>(0)?;
    packet.write_u16::<BigEndian>(0)?;
    Ok(packet)
}

/// Builds a file request packet.
///
/// The leading byte is 1 for reference table requests and 0 for
/// regular file requests, which controls server-side prioritisation.
pub fn request_packet(is_reference: bool, category: u8, file_id: u32) -> Result<Vec<u8>> {
    let mut packet = Vec::with_capacity(REQUEST_LENGTH);
    packet.write_u8(u8::from(is_reference))?;
    packet.write_u8(category)?;
    packet.write_i32::<BigEndian>(file_id as i32)?;
    debug_assert_eq!(packet.len(), REQUEST_LENGTH);
    Ok(packet)
}
