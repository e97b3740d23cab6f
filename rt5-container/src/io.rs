//! Byte-level helpers shared by the wire codec and format decoders.
//!
//! Fixed-width and 24-bit big-endian integers come from `byteorder`; the
//! extension traits here cover the one primitive it lacks, null-terminated
//! strings.

use std::io::{self, Read, Write};

/// Reads null-terminated strings from a byte source.
pub trait ReadCstrExt: Read {
    /// Read bytes up to (and consuming) the terminating NUL.
    fn read_cstr(&mut self) -> io::Result<String> {
        let mut bytes = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            self.read_exact(&mut byte)?;
            if byte[0] == 0 {
                break;
            }
            bytes.push(byte[0]);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl<T: Read> ReadCstrExt for T {}

/// Writes null-terminated strings to a byte sink.
pub trait WriteCstrExt: Write {
    /// Write the string's bytes followed by a terminating NUL.
    fn write_cstr(&mut self, value: &str) -> io::Result<()> {
        self.write_all(value.as_bytes())?;
        self.write_all(&[0])
    }
}

impl<T: Write> WriteCstrExt for T {}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cstr_round_trip() {
        let mut buffer = Vec::new();
        buffer.write_cstr("handshake-key").unwrap();
        buffer.extend_from_slice(b"trailing");

        let mut cursor = Cursor::new(buffer);
        assert_eq!(cursor.read_cstr().unwrap(), "handshake-key");
        assert_eq!(cursor.position(), 14);
    }

    #[test]
    fn empty_cstr() {
        let mut cursor = Cursor::new(vec![0u8, b'x']);
        assert_eq!(cursor.read_cstr().unwrap(), "");
    }

    #[test]
    fn unterminated_cstr_is_an_error() {
        let mut cursor = Cursor::new(b"no terminator".to_vec());
        assert!(cursor.read_cstr().is_err());
    }
}
