//! Byte codecs: SHA-1, hex, zlib inflate/deflate.
//!
//! The packfile decoder needs to know precisely how many input bytes a
//! single zlib stream consumed, since entries are concatenated back to
//! back with no outer framing. [`inflate`] reports that as an
//! "unread tail length" so callers can advance their own cursor.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};

use crate::error::{DecodeError, GitError};

/// SHA-1 digest of `data`.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Lowercase hex encoding of a 20-byte SHA-1.
pub fn hex_encode(id: &[u8]) -> String {
    hex::encode(id)
}

/// Decode a 40-char hex string into a 20-byte SHA-1.
pub fn hex_decode(s: &str) -> Result<[u8; 20], hex::FromHexError> {
    let bytes = hex::decode(s)?;
    let mut out = [0u8; 20];
    if bytes.len() != 20 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// zlib-deflate `data` at the default compression level, as written to loose objects.
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // Writing to a Vec<u8> via ZlibEncoder cannot fail.
    encoder.write_all(data).expect("in-memory zlib write");
    encoder.finish().expect("in-memory zlib finish")
}

/// Inflate a zlib stream from the front of `data`, returning the decompressed
/// bytes and the number of trailing bytes of `data` the decoder did not
/// consume. `offset` is only used to annotate errors with a pack position.
pub fn inflate(data: &[u8], offset: u64) -> Result<(Vec<u8>, usize), GitError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|source| DecodeError::Zlib { offset, source })?;
    let consumed = decoder.total_in() as usize;
    Ok((out, data.len() - consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_matches_known_vector() {
        let digest = sha1(b"blob 6\0hello\n");
        assert_eq!(hex_encode(&digest), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn deflate_inflate_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let compressed = deflate(&data);
        let (decompressed, tail) = inflate(&compressed, 0).unwrap();
        assert_eq!(decompressed, data);
        assert_eq!(tail, 0);
    }

    #[test]
    fn inflate_reports_unread_tail() {
        let data = b"hello world".to_vec();
        let mut compressed = deflate(&data);
        compressed.extend_from_slice(b"trailing garbage that follows in a packfile");
        let (decompressed, tail) = inflate(&compressed, 0).unwrap();
        assert_eq!(decompressed, data);
        assert_eq!(tail, "trailing garbage that follows in a packfile".len());
    }
}
