//! Content integrity for uploaded bytes
//!
//! The blob API verifies every payload against an MD5 hex digest and expects
//! the bytes themselves as standard base64 (RFC 4648 alphabet, padded, no line
//! breaks).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use md5::{Digest, Md5};

/// Encoded payload plus its digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    /// Lowercase hex MD5 of the raw bytes
    pub md5: String,
    /// Standard base64 of the raw bytes
    pub data64: String,
    /// Length of the raw bytes
    pub len: usize,
}

/// Lowercase hex MD5 digest
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

/// Standard base64 without line breaks
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Hash and encode `data` in one pass over the slice
pub fn encode_chunk(data: &[u8]) -> EncodedChunk {
    EncodedChunk {
        md5: md5_hex(data),
        data64: encode_base64(data),
        len: data.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(b"", "d41d8cd98f00b204e9800998ecf8427e" ; "empty")]
    #[test_case(b"abc", "900150983cd24fb0d6963f7d28e17f72" ; "abc")]
    #[test_case(b"The quick brown fox jumps over the lazy dog", "9e107d9d372bb6826bd81d3542a419d6" ; "fox")]
    fn test_md5_hex(input: &[u8], expected: &str) {
        assert_eq!(md5_hex(input), expected);
    }

    #[test]
    fn test_base64_has_no_line_breaks() {
        let data = vec![0xABu8; 4096];
        let encoded = encode_base64(&data);
        assert!(!encoded.contains('\n'));
        assert_eq!(encoded.len(), 4096usize.div_ceil(3) * 4);
    }

    #[test]
    fn test_encode_chunk() {
        let chunk = encode_chunk(b"hello");
        assert_eq!(chunk.data64, "aGVsbG8=");
        assert_eq!(chunk.md5, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(chunk.len, 5);
    }
}
