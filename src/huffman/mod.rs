//! Canonical prefix (Huffman) coder
//!
//! Builds a prefix code over the dictionary coder's serialized byte stream
//! and packs it through [`crate::bitio`]. The writer is two-pass: the exact
//! encoded bit length is computed and stored ahead of the payload so the
//! reader can ignore the final pad bits. The code table itself travels
//! in-band, so decoders never rebuild the tree.

mod tree;

pub use tree::{build_tree, HuffNode};

use std::collections::HashMap;
use std::io::Read;
use std::io::Write;

use crate::bitio::{BitReader, BitWriter};
use crate::common::{KittyError, Result, READ_CHUNK};

/// Longest acceptable code in bits when reading a table from a container.
///
/// A 256-leaf tree cannot exceed depth 255, so anything longer is corrupt.
pub const MAX_CODE_LEN: usize = 256;

/// Mapping from byte symbol to its prefix code.
#[derive(Debug)]
pub struct CodeTable {
    codes: Vec<Option<String>>,
}

impl Default for CodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            codes: vec![None; 256],
        }
    }

    /// Derive the table from a Huffman tree: left edges append `'0'`,
    /// right edges `'1'`, a lone leaf gets `"0"`.
    pub fn from_tree(root: &HuffNode) -> Self {
        fn walk(node: &HuffNode, prefix: &mut String, table: &mut CodeTable) {
            match node {
                HuffNode::Leaf { byte, .. } => {
                    let code = if prefix.is_empty() {
                        "0".to_string()
                    } else {
                        prefix.clone()
                    };
                    table.insert(*byte, code);
                }
                HuffNode::Internal { left, right, .. } => {
                    prefix.push('0');
                    walk(left, prefix, table);
                    prefix.pop();
                    prefix.push('1');
                    walk(right, prefix, table);
                    prefix.pop();
                }
            }
        }

        let mut table = Self::new();
        let mut prefix = String::new();
        walk(root, &mut prefix, &mut table);
        table
    }

    /// Set the code for `byte`, replacing any previous one.
    pub fn insert(&mut self, byte: u8, code: String) {
        self.codes[byte as usize] = Some(code);
    }

    /// The code assigned to `byte`, if any.
    pub fn code(&self, byte: u8) -> Option<&str> {
        self.codes[byte as usize].as_deref()
    }

    /// Number of symbols carrying a code.
    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    /// Whether no symbol carries a code.
    pub fn is_empty(&self) -> bool {
        self.codes.iter().all(|c| c.is_none())
    }

    /// Iterate `(symbol, code)` pairs in ascending symbol order.
    ///
    /// The order is part of the writer's determinism: identical inputs
    /// produce identical containers.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(byte, code)| code.as_deref().map(|c| (byte as u8, c)))
    }

    /// Sum the code lengths of every byte read from `src`.
    ///
    /// This is the first pass of the two-pass encode; the result is written
    /// ahead of the bit stream as the advertised payload length.
    pub fn encoded_bit_len<R: Read>(&self, mut src: R) -> Result<u64> {
        let mut total = 0u64;
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let got = src.read(&mut buf)?;
            if got == 0 {
                break;
            }
            for &byte in &buf[..got] {
                let code = self
                    .code(byte)
                    .ok_or_else(|| missing_code(byte))?;
                total += code.len() as u64;
            }
        }
        Ok(total)
    }

    /// Encode every byte read from `src` through `writer`.
    ///
    /// The caller flushes the writer once all payload sources are drained.
    pub fn encode_stream<R: Read, W: Write>(
        &self,
        mut src: R,
        writer: &mut BitWriter<W>,
    ) -> Result<()> {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let got = src.read(&mut buf)?;
            if got == 0 {
                break;
            }
            for &byte in &buf[..got] {
                let code = self
                    .code(byte)
                    .ok_or_else(|| missing_code(byte))?;
                writer.write_bits(code)?;
            }
        }
        Ok(())
    }

    /// Decode exactly `encoded_bits` meaningful bits from `src`.
    ///
    /// Pad bits beyond `encoded_bits` are never consumed into the output.
    /// Fails with [`KittyError::Truncated`] when the stream ends early and
    /// [`KittyError::Corrupt`] when the bits do not resolve to known codes.
    pub fn decode_stream<R: Read>(&self, src: R, encoded_bits: u64) -> Result<Vec<u8>> {
        let mut reverse: HashMap<&str, u8> = HashMap::with_capacity(self.len());
        let mut max_len = 0usize;
        for (byte, code) in self.iter() {
            max_len = max_len.max(code.len());
            reverse.insert(code, byte);
        }

        let mut reader = BitReader::new(src);
        let mut out = Vec::new();
        let mut current = String::new();
        for _ in 0..encoded_bits {
            let bit = reader
                .read_bit()?
                .ok_or(KittyError::Truncated("entropy payload"))?;
            current.push(if bit { '1' } else { '0' });
            if let Some(&byte) = reverse.get(current.as_str()) {
                out.push(byte);
                current.clear();
            } else if current.len() >= max_len {
                return Err(KittyError::Corrupt(format!(
                    "bit sequence {current} matches no code"
                )));
            }
        }
        if !current.is_empty() {
            return Err(KittyError::Corrupt(
                "entropy payload ends mid-code".to_string(),
            ));
        }
        Ok(out)
    }
}

fn missing_code(byte: u8) -> KittyError {
    KittyError::Corrupt(format!("no prefix code for byte {byte:#04x}"))
}
