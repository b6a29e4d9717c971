//! Per-file compressed container (KP01/KP02/KP03)
//!
//! The writer produces KP03 streams: a magic, a compression flag, an
//! extension hint, then either the raw bytes or an in-band Huffman code
//! table followed by the bit-packed entropy stream over serialized
//! dictionary tokens. The reader additionally understands the two legacy
//! layouts (KP01: entropy body only; KP02: entropy over raw bytes).

mod compress;
mod decompress;

pub use compress::compress_file;
pub use decompress::decompress_file;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::common::{KittyError, Result, MAGIC_V1, MAGIC_V2, MAGIC_V3, MAGIC_V4};

/// Container generation identified by the leading 4-byte magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// Legacy single-stage entropy container (read-only).
    V1,
    /// Legacy store-or-entropy container (read-only).
    V2,
    /// Current per-file container.
    V3,
    /// Multi-file archive.
    V4,
}

impl Version {
    /// Identify a magic, or `None` for an unknown signature.
    pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
        match magic {
            MAGIC_V1 => Some(Version::V1),
            MAGIC_V2 => Some(Version::V2),
            MAGIC_V3 => Some(Version::V3),
            MAGIC_V4 => Some(Version::V4),
            _ => None,
        }
    }

    /// The ASCII name of this version's magic.
    pub fn name(self) -> &'static str {
        match self {
            Version::V1 => "KP01",
            Version::V2 => "KP02",
            Version::V3 => "KP03",
            Version::V4 => "KP04",
        }
    }
}

// Little-endian field readers. A short read while a declared field is
// expected maps to Truncated with the field name.

pub(crate) fn read_exact_field<R: Read>(
    r: &mut R,
    buf: &mut [u8],
    what: &'static str,
) -> Result<()> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            KittyError::Truncated(what)
        } else {
            KittyError::Io(e)
        }
    })
}

pub(crate) fn read_magic<R: Read>(r: &mut R) -> Result<[u8; 4]> {
    let mut buf = [0u8; 4];
    read_exact_field(r, &mut buf, "container magic")?;
    Ok(buf)
}

pub(crate) fn read_u8<R: Read>(r: &mut R, what: &'static str) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_exact_field(r, &mut buf, what)?;
    Ok(buf[0])
}

pub(crate) fn read_bool<R: Read>(r: &mut R, what: &'static str) -> Result<bool> {
    Ok(read_u8(r, what)? != 0)
}

pub(crate) fn read_u16<R: Read>(r: &mut R, what: &'static str) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_exact_field(r, &mut buf, what)?;
    Ok(u16::from_le_bytes(buf))
}

pub(crate) fn read_u32<R: Read>(r: &mut R, what: &'static str) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact_field(r, &mut buf, what)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64<R: Read>(r: &mut R, what: &'static str) -> Result<u64> {
    let mut buf = [0u8; 8];
    read_exact_field(r, &mut buf, what)?;
    Ok(u64::from_le_bytes(buf))
}

/// Fill `buf` as far as the stream allows, returning the byte count.
pub(crate) fn read_up_to<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// A temporary file removed on drop unless explicitly persisted.
///
/// Every temporary in the pipeline lives inside one call; the guard keeps
/// the delete-on-every-exit-path rule honest across `?` returns.
#[derive(Debug)]
pub(crate) struct ScratchFile {
    path: PathBuf,
    armed: bool,
}

impl ScratchFile {
    /// Claim `path` as a temporary, clearing any stale leftover first.
    pub(crate) fn claim(path: PathBuf) -> Self {
        let _ = fs::remove_file(&path);
        Self { path, armed: true }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file on disk; the guard no longer deletes it.
    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Append `suffix` to the final component of `path`.
pub(crate) fn path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// The original file extension including the leading dot, or empty.
pub(crate) fn extension_with_dot(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
