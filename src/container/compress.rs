//! KP03 writer: entropy skip, two-pass dictionary + entropy encode, and
//! the adopt-or-store decision.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use super::{extension_with_dot, path_with_suffix, read_up_to, ScratchFile};
use crate::bitio::BitWriter;
use crate::common::{
    PathContext, Result, ENTROPY_SAMPLE, ENTROPY_SKIP_THRESHOLD, MAGIC_V3, READ_CHUNK,
};
use crate::huffman::{build_tree, CodeTable};
use crate::lz77::StreamCompressor;

/// Compress `input` into a KP03 container at `output`.
///
/// High-entropy inputs (sampled head at or above 7.7 bits/byte), empty
/// inputs, and inputs the pipeline fails to shrink are stored raw inside
/// the same container layout. Temporaries (`<output>.lz77.tmp`,
/// `<output>.enc.tmp`) are removed on every exit path.
pub fn compress_file(input: &Path, output: &Path) -> Result<()> {
    compress_inner(input, output).with_path(input)
}

fn compress_inner(input: &Path, output: &Path) -> Result<()> {
    let original_size = fs::metadata(input)?.len();
    let mut reader = File::open(input)?;

    // Entropy skip check on the head sample: near-incompressible data is
    // stored raw without running the pipeline at all.
    if original_size > 0 {
        let sample_len = original_size.min(ENTROPY_SAMPLE as u64) as usize;
        let mut sample = vec![0u8; sample_len];
        let got = read_up_to(&mut reader, &mut sample)?;
        if got > 0 && shannon_entropy(&sample[..got]) >= ENTROPY_SKIP_THRESHOLD {
            return store_raw_file(input, output);
        }
        // Rewind so the dictionary pass sees the sampled prefix again.
        reader.seek(SeekFrom::Start(0))?;
    }

    // First pass: stream the dictionary coder into a temporary while
    // tallying byte frequencies of the serialized tokens.
    let lz_tmp = ScratchFile::claim(path_with_suffix(output, ".lz77.tmp"));
    let mut freq = [0u64; 256];
    {
        let mut lz_out = BufWriter::new(File::create(lz_tmp.path())?);
        let mut coder = StreamCompressor::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let got = read_up_to(&mut reader, &mut buf)?;
            if got == 0 {
                break;
            }
            coder.feed(&buf[..got], false);
            let bytes = coder.consume_output();
            tally(&mut freq, &bytes);
            lz_out.write_all(&bytes)?;
            if got < READ_CHUNK {
                break;
            }
        }
        coder.feed(&[], true);
        let bytes = coder.consume_output();
        tally(&mut freq, &bytes);
        lz_out.write_all(&bytes)?;
        lz_out.flush()?;
    }
    drop(reader);

    // Zero-length input produces no tokens; there is nothing to encode.
    let Some(tree) = build_tree(&freq) else {
        return store_raw_file(input, output);
    };
    let table = CodeTable::from_tree(&tree);

    // Second pass: exact payload length, then the container body.
    let encoded_bits = table.encoded_bit_len(BufReader::new(File::open(lz_tmp.path())?))?;

    let enc_tmp = ScratchFile::claim(path_with_suffix(output, ".enc.tmp"));
    {
        let mut enc_out = BufWriter::new(File::create(enc_tmp.path())?);
        enc_out.write_all(&MAGIC_V3)?;
        enc_out.write_all(&[1u8])?;

        let ext = extension_with_dot(input);
        enc_out.write_all(&(ext.len() as u64).to_le_bytes())?;
        enc_out.write_all(ext.as_bytes())?;

        enc_out.write_all(&(table.len() as u64).to_le_bytes())?;
        for (symbol, code) in table.iter() {
            enc_out.write_all(&[symbol])?;
            enc_out.write_all(&(code.len() as u64).to_le_bytes())?;
            enc_out.write_all(code.as_bytes())?;
        }

        enc_out.write_all(&encoded_bits.to_le_bytes())?;
        let mut bits = BitWriter::new(&mut enc_out);
        table.encode_stream(BufReader::new(File::open(lz_tmp.path())?), &mut bits)?;
        bits.flush()?;
        enc_out.flush()?;
    }

    // Adopt the encoded container only when it is strictly smaller than
    // the input; otherwise fall back to raw storage.
    let encoded_size = fs::metadata(enc_tmp.path())?.len();
    if encoded_size < original_size {
        persist(enc_tmp, output)
    } else {
        drop(enc_tmp);
        drop(lz_tmp);
        store_raw_file(input, output)
    }
}

/// Write `input` into a KP03 container with `is_compressed = false`.
pub(crate) fn store_raw_file(input: &Path, output: &Path) -> Result<()> {
    let bytes = fs::read(input)?;
    let mut out = BufWriter::new(File::create(output)?);

    out.write_all(&MAGIC_V3)?;
    out.write_all(&[0u8])?;

    let ext = extension_with_dot(input);
    out.write_all(&(ext.len() as u64).to_le_bytes())?;
    out.write_all(ext.as_bytes())?;

    out.write_all(&(bytes.len() as u64).to_le_bytes())?;
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(())
}

/// Move the finished temporary onto `output`, copying when rename fails
/// (for example across filesystems).
fn persist(tmp: ScratchFile, output: &Path) -> Result<()> {
    if fs::rename(tmp.path(), output).is_ok() {
        tmp.disarm();
        return Ok(());
    }
    fs::copy(tmp.path(), output)?;
    Ok(())
}

/// Shannon entropy of `sample` in bits per byte.
pub(crate) fn shannon_entropy(sample: &[u8]) -> f64 {
    let mut freq = [0u64; 256];
    for &byte in sample {
        freq[byte as usize] += 1;
    }
    let total = sample.len() as f64;
    let mut entropy = 0.0;
    for &count in freq.iter() {
        if count == 0 {
            continue;
        }
        let p = count as f64 / total;
        entropy -= p * p.log2();
    }
    entropy
}

fn tally(freq: &mut [u64; 256], bytes: &[u8]) {
    for &byte in bytes {
        freq[byte as usize] += 1;
    }
}
