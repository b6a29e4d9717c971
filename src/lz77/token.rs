//! Token type, wire serialization, and in-memory decompression

use super::{TAG_BACKREF, TAG_LITERAL};
use crate::common::{KittyError, Result};

/// One unit of dictionary-coder output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A single uncompressed byte.
    Literal(u8),
    /// Copy `length` bytes starting `offset` bytes before the current
    /// output position. `offset` is never 0.
    BackRef {
        /// Backward distance into already-produced output.
        offset: u16,
        /// Number of bytes to copy.
        length: u8,
    },
}

/// Append the wire records for `tokens` to `out`.
///
/// Literal: `0x00, byte`. Back-reference: `0x01, offset_lo, offset_hi,
/// length` (little-endian offset).
pub fn serialize_into(tokens: &[Token], out: &mut Vec<u8>) {
    for token in tokens {
        match *token {
            Token::Literal(byte) => {
                out.push(TAG_LITERAL);
                out.push(byte);
            }
            Token::BackRef { offset, length } => {
                out.push(TAG_BACKREF);
                out.push((offset & 0xFF) as u8);
                out.push((offset >> 8) as u8);
                out.push(length);
            }
        }
    }
}

/// Serialize `tokens` into a fresh byte vector.
pub fn serialize(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tokens.len() * 3);
    serialize_into(tokens, &mut out);
    out
}

/// Parse wire records back into tokens.
///
/// A truncated trailing record or an unknown tag ends parsing cleanly; the
/// tokens decoded so far are returned. The entropy stage guarantees whole
/// records for well-formed containers, so a hard stop here is the decode
/// path's corruption signal.
pub fn deserialize(bytes: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    let n = bytes.len();
    while i < n {
        let tag = bytes[i];
        i += 1;
        match tag {
            TAG_LITERAL => {
                if i >= n {
                    break;
                }
                tokens.push(Token::Literal(bytes[i]));
                i += 1;
            }
            TAG_BACKREF => {
                if i + 2 >= n {
                    break;
                }
                let offset = u16::from_le_bytes([bytes[i], bytes[i + 1]]);
                let length = bytes[i + 2];
                i += 3;
                tokens.push(Token::BackRef { offset, length });
            }
            _ => break,
        }
    }
    tokens
}

/// Replay `tokens` into the original byte sequence.
///
/// Back-references copy byte-by-byte from the growing output, so
/// `length > offset` yields run-length-style repetition. An offset that
/// reaches past the start of the output marks the stream as corrupt.
pub fn decompress(tokens: &[Token]) -> Result<Vec<u8>> {
    let mut out: Vec<u8> = Vec::with_capacity(tokens.len() * 2);
    for token in tokens {
        match *token {
            Token::Literal(byte) => out.push(byte),
            Token::BackRef { offset, length } => {
                let offset = offset as usize;
                if offset == 0 || offset > out.len() {
                    return Err(KittyError::Corrupt(format!(
                        "back-reference offset {offset} exceeds {} bytes of output",
                        out.len()
                    )));
                }
                let start = out.len() - offset;
                for k in 0..length as usize {
                    let byte = out[start + k];
                    out.push(byte);
                }
            }
        }
    }
    Ok(out)
}
