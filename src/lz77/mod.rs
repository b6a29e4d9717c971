//! Sliding-window dictionary coder
//!
//! This module implements the dictionary stage of the compression pipeline:
//! a streaming compressor that emits back-reference and literal tokens over
//! a bounded sliding window, the byte serialization of those tokens, and a
//! pure in-memory decompressor.

mod chain;
mod stream;
mod token;

pub use chain::ChainIndex;
pub use stream::StreamCompressor;
pub use token::{decompress, deserialize, serialize, serialize_into, Token};

use crate::common::{KEY_LEN, MAX_POS_PER_KEY, MAX_TRIES, MIN_MATCH};

/// Wire tag introducing a literal record.
pub const TAG_LITERAL: u8 = 0x00;

/// Wire tag introducing a back-reference record.
pub const TAG_BACKREF: u8 = 0x01;

/// Pack the leading [`KEY_LEN`] bytes of `p` into a 24-bit chain-index key.
///
/// Callers guarantee at least `KEY_LEN` bytes remain.
pub(crate) fn make_key(p: &[u8]) -> u32 {
    (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2])
}

/// Convenience function to run the streaming compressor over an in-memory
/// buffer in a single pass and collect the emitted tokens.
pub fn compress(data: &[u8]) -> Vec<Token> {
    let mut coder = StreamCompressor::new();
    coder.feed(data, true);
    coder.take_tokens()
}

/// Convenience function to recover the original bytes from a serialized
/// token stream.
pub fn decompress_bytes(bytes: &[u8]) -> crate::Result<Vec<u8>> {
    decompress(&deserialize(bytes))
}

// The index key covers exactly the minimum match, so every emittable match
// has a key; the candidate scan budget must fit inside one chain slot.
const _: () = assert!(MIN_MATCH == KEY_LEN);
const _: () = assert!(MAX_TRIES <= MAX_POS_PER_KEY);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_key_is_big_endian_packed() {
        assert_eq!(make_key(&[0x01, 0x02, 0x03]), 0x0001_0203);
        assert_eq!(make_key(&[0xFF, 0x00, 0xFF]), 0x00FF_00FF);
    }

    #[test]
    fn test_compress_roundtrip() {
        let data = b"abcabcabcabc the quick brown fox abcabc";
        let tokens = compress(data);
        assert_eq!(decompress(&tokens).unwrap(), data);
    }

    #[test]
    fn test_decompress_bytes_roundtrip() {
        let data = b"hello hello hello";
        let tokens = compress(data);
        let wire = serialize(&tokens);
        assert_eq!(decompress_bytes(&wire).unwrap(), data);
    }
}
