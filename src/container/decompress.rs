//! Container reader: KP03 plus the legacy KP01/KP02 layouts.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::{read_bool, read_magic, read_u64, read_u8, Version};
use crate::common::{KittyError, PathContext, Result};
use crate::huffman::{CodeTable, MAX_CODE_LEN};
use crate::lz77;

/// Upper bound accepted for the extension-hint length field.
const MAX_EXT_LEN: u64 = 1024;

/// Restore the original bytes of the container at `input` into `output`.
///
/// Dispatches on the magic: KP01 (entropy body only), KP02 (raw or entropy
/// over plain bytes), KP03 (raw, or entropy over dictionary tokens). A KP04
/// archive is rejected as the wrong container kind for this path.
pub fn decompress_file(input: &Path, output: &Path) -> Result<()> {
    decompress_inner(input, output).with_path(input)
}

fn decompress_inner(input: &Path, output: &Path) -> Result<()> {
    let mut reader = BufReader::new(File::open(input)?);
    let magic = read_magic(&mut reader)?;

    match Version::from_magic(magic) {
        Some(Version::V1) => {
            let bytes = read_entropy_block(&mut reader)?;
            fs::write(output, bytes)?;
            Ok(())
        }
        Some(Version::V2) => {
            if read_prelude(&mut reader)? {
                let bytes = read_entropy_block(&mut reader)?;
                fs::write(output, bytes)?;
                Ok(())
            } else {
                restore_raw(&mut reader, output)
            }
        }
        Some(Version::V3) => {
            if read_prelude(&mut reader)? {
                let token_bytes = read_entropy_block(&mut reader)?;
                let original = lz77::decompress(&lz77::deserialize(&token_bytes))?;
                fs::write(output, original)?;
                Ok(())
            } else {
                restore_raw(&mut reader, output)
            }
        }
        Some(Version::V4) => Err(KittyError::UnsupportedVersion {
            found: Version::V4.name(),
            expected: Version::V3.name(),
        }),
        None => Err(KittyError::BadSignature { found: magic }),
    }
}

/// Read the KP02/KP03 prelude after the magic: the compression flag and
/// the extension hint (consumed but unused — the caller names the output).
fn read_prelude<R: Read>(r: &mut R) -> Result<bool> {
    let compressed = read_bool(r, "compression flag")?;
    let ext_len = read_u64(r, "extension length")?;
    if ext_len > MAX_EXT_LEN {
        return Err(KittyError::Corrupt(format!(
            "implausible extension length {ext_len}"
        )));
    }
    let mut ext = vec![0u8; ext_len as usize];
    super::read_exact_field(r, &mut ext, "extension")?;
    Ok(compressed)
}

/// Read the in-band code table.
fn read_code_table<R: Read>(r: &mut R) -> Result<CodeTable> {
    let map_size = read_u64(r, "code table size")?;
    if map_size > 256 {
        return Err(KittyError::Corrupt(format!(
            "code table declares {map_size} symbols"
        )));
    }

    let mut table = CodeTable::new();
    for _ in 0..map_size {
        let symbol = read_u8(r, "code table symbol")?;
        let code_len = read_u64(r, "code length")?;
        if code_len == 0 || code_len > MAX_CODE_LEN as u64 {
            return Err(KittyError::Corrupt(format!(
                "code for symbol {symbol:#04x} declares {code_len} bits"
            )));
        }
        let mut code = vec![0u8; code_len as usize];
        super::read_exact_field(r, &mut code, "code")?;
        if !code.iter().all(|&c| c == b'0' || c == b'1') {
            return Err(KittyError::Corrupt(format!(
                "code for symbol {symbol:#04x} contains non-binary characters"
            )));
        }
        let code = String::from_utf8(code).expect("validated as ASCII 0/1");
        table.insert(symbol, code);
    }
    Ok(table)
}

/// Read a code table, the advertised bit count, and the payload itself.
fn read_entropy_block<R: Read>(r: &mut R) -> Result<Vec<u8>> {
    let table = read_code_table(r)?;
    let encoded_bits = read_u64(r, "encoded bit length")?;
    table.decode_stream(r, encoded_bits)
}

/// Copy a raw-stored payload to `output`.
fn restore_raw<R: Read>(r: &mut R, output: &Path) -> Result<()> {
    let raw_size = read_u64(r, "raw size")?;
    let mut out = BufWriter::new(File::create(output)?);
    let copied = std::io::copy(&mut r.by_ref().take(raw_size), &mut out)?;
    if copied != raw_size {
        return Err(KittyError::Truncated("raw payload"));
    }
    out.flush()?;
    Ok(())
}
