use std::borrow::Cow;
use std::io::{Read as _, Write as _};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::GzEncoder;

/// Transport compression of a tile payload, detected from its magic bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zlib,
}

impl Compression {
    #[must_use]
    pub fn detect(data: &[u8]) -> Self {
        match data {
            [0x1f, 0x8b, ..] => Self::Gzip,
            [0x78, 0x9c | 0x01 | 0xda, ..] => Self::Zlib,
            _ => Self::None,
        }
    }
}

/// Inflates `data` if it carries a known compression header, borrowing it unchanged otherwise.
pub fn decompress(data: &[u8]) -> Result<Cow<'_, [u8]>, std::io::Error> {
    Ok(match Compression::detect(data) {
        Compression::None => Cow::Borrowed(data),
        Compression::Gzip => Cow::Owned(decode_gzip(data)?),
        Compression::Zlib => Cow::Owned(decode_zlib(data)?),
    })
}

pub fn decode_gzip(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

pub fn decode_zlib(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

pub fn encode_gzip(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(Compression::detect(b"\x1f\x8b\x08"), Compression::Gzip);
        assert_eq!(Compression::detect(b"\x78\x9c\x01"), Compression::Zlib);
        assert_eq!(Compression::detect(b"\x1a\x05"), Compression::None);
        assert_eq!(Compression::detect(b""), Compression::None);
    }

    #[test]
    fn test_decompress_gzip() {
        let payload = b"vector tile payload".to_vec();
        let compressed = encode_gzip(&payload).unwrap();
        assert_ne!(compressed, payload);
        assert_eq!(decompress(&compressed).unwrap().as_ref(), payload.as_slice());
    }

    #[test]
    fn test_decompress_plain_is_borrowed() {
        let payload = b"\x1a\x00";
        assert!(matches!(decompress(payload).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_corrupt_gzip_fails() {
        // valid gzip header followed by a deflate block with the reserved block type
        let corrupt = b"\x1f\x8b\x08\x00\x00\x00\x00\x00\x00\xff\xff\xff\xff\xff";
        assert!(decompress(corrupt).is_err());
    }
}
