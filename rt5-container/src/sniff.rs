//! Content signature sniffing for decompressed cache files.
//!
//! The cache stores no filenames or types, so the only way to give an
//! extracted file a useful extension is to probe the decompressed bytes for
//! known signatures. Each signature is checked at offset 0 and again at
//! offset 5; a match at offset 5 means the bytes are still wrapped in an
//! uncompressed container header, which is stripped from the result.

/// A known content signature and the extension it maps to.
struct Signature {
    magic: &'static [u8],
    extension: &'static str,
}

/// Probed in this order; the first match wins.
const SIGNATURES: [Signature; 3] = [
    Signature {
        magic: b"OggS",
        extension: "ogg",
    },
    Signature {
        magic: b"JAGA",
        extension: "jaga",
    },
    Signature {
        magic: &[0x89, b'P', b'N', b'G'],
        extension: "png",
    },
];

/// Length of the envelope preceding a signature found at offset 5.
const ENVELOPE_LENGTH: usize = 5;

/// Probe `data` for known content signatures.
///
/// Returns the (possibly envelope-stripped) bytes and the matched extension,
/// or the input unchanged and `None` when nothing matches. For each
/// signature the offset-0 probe precedes the offset-5 probe, so an
/// ambiguous buffer always resolves the same way.
pub fn sniff(data: Vec<u8>) -> (Vec<u8>, Option<&'static str>) {
    for signature in &SIGNATURES {
        if data.starts_with(signature.magic) {
            return (data, Some(signature.extension));
        }

        let end = ENVELOPE_LENGTH + signature.magic.len();
        if data.len() >= end && &data[ENVELOPE_LENGTH..end] == signature.magic {
            let stripped = data[ENVELOPE_LENGTH..].to_vec();
            return (stripped, Some(signature.extension));
        }
    }

    (data, None)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn ogg_at_offset_zero_is_not_stripped() {
        let data = b"OggS and the rest of the stream".to_vec();
        let (bytes, extension) = sniff(data.clone());
        assert_eq!(extension, Some("ogg"));
        assert_eq!(bytes, data);
    }

    #[test]
    fn ogg_at_offset_five_strips_the_envelope() {
        let mut data = vec![0u8; ENVELOPE_LENGTH];
        data.extend_from_slice(b"OggS and the rest of the stream");
        let (bytes, extension) = sniff(data);
        assert_eq!(extension, Some("ogg"));
        assert_eq!(bytes, b"OggS and the rest of the stream");
    }

    #[test]
    fn jaga_and_png_signatures() {
        let (_, extension) = sniff(b"JAGA soundtrack index".to_vec());
        assert_eq!(extension, Some("jaga"));

        let (_, extension) = sniff([0x89, b'P', b'N', b'G', 0x0d, 0x0a].to_vec());
        assert_eq!(extension, Some("png"));

        let mut enveloped = vec![0u8; ENVELOPE_LENGTH];
        enveloped.extend_from_slice(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a]);
        let (bytes, extension) = sniff(enveloped);
        assert_eq!(extension, Some("png"));
        assert_eq!(bytes[0], 0x89);
    }

    #[test]
    fn offset_zero_wins_over_offset_five() {
        // OggS at 0 and JAGA at 5; the earlier probe in the fixed order wins.
        let mut data = b"OggS\0".to_vec();
        data.extend_from_slice(b"JAGA");
        let (bytes, extension) = sniff(data.clone());
        assert_eq!(extension, Some("ogg"));
        assert_eq!(bytes, data);
    }

    #[test]
    fn unknown_content_is_untouched() {
        let data = b"nothing recognizable in here".to_vec();
        let (bytes, extension) = sniff(data.clone());
        assert_eq!(extension, None);
        assert_eq!(bytes, data);
    }

    #[test]
    fn short_buffers_do_not_match() {
        let (bytes, extension) = sniff(b"Og".to_vec());
        assert_eq!(extension, None);
        assert_eq!(bytes, b"Og");
    }
}
