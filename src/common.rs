//! Common types and constants for the KittyPress formats
//!
//! This module defines the error type, the `Result` alias, the container
//! magic values, and the tuning constants shared by the dictionary and
//! entropy coding stages.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Container magics (4 ASCII bytes each)

/// Magic of the legacy single-stage Huffman container (read-only).
pub const MAGIC_V1: [u8; 4] = *b"KP01";
/// Magic of the legacy store-or-Huffman container (read-only).
pub const MAGIC_V2: [u8; 4] = *b"KP02";
/// Magic of the current per-file container (read + write).
pub const MAGIC_V3: [u8; 4] = *b"KP03";
/// Magic of the multi-file archive container (read + write).
pub const MAGIC_V4: [u8; 4] = *b"KP04";

/// Version byte written after the archive magic.
pub const ARCHIVE_VERSION: u8 = 4;

// Dictionary coder tuning

/// Default sliding window size in bytes.
pub const WINDOW_SIZE: usize = 65_535;

/// Default maximum back-reference length in bytes.
pub const MAX_MATCH: usize = 255;

/// Minimum back-reference length; shorter matches are emitted as literals.
pub const MIN_MATCH: usize = 3;

/// Number of bytes hashed into a chain-index key.
pub const KEY_LEN: usize = 3;

/// Maximum candidate positions examined per match search.
pub const MAX_TRIES: usize = 32;

/// Maximum positions remembered per chain-index key (newest win).
pub const MAX_POS_PER_KEY: usize = 64;

// Entry codec tuning

/// Chunk size used when streaming files through the coders.
pub const READ_CHUNK: usize = 64 * 1024;

/// Number of head bytes sampled for the entropy skip check.
pub const ENTROPY_SAMPLE: usize = 1024 * 1024;

/// Shannon entropy (bits/byte) at or above which a file is stored raw.
pub const ENTROPY_SKIP_THRESHOLD: f64 = 7.7;

/// Error type for KittyPress operations
#[derive(Debug, Error)]
pub enum KittyError {
    /// I/O error from the filesystem or an underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The leading 4 bytes match no known container magic
    #[error("unknown or corrupted container (bad signature {found:02x?})")]
    BadSignature {
        /// The 4 bytes actually found.
        found: [u8; 4],
    },

    /// The stream ended while a declared-length field or payload was expected
    #[error("unexpected end of stream while reading {0}")]
    Truncated(&'static str),

    /// Structurally well-formed but semantically invalid data
    #[error("corrupt stream: {0}")]
    Corrupt(String),

    /// A valid container of the wrong kind for this operation
    #[error("unsupported container version: found {found}, expected {expected}")]
    UnsupportedVersion {
        /// Magic name of the container that was found.
        found: &'static str,
        /// Magic name this operation requires.
        expected: &'static str,
    },

    /// An archive entry path that would escape the extraction directory
    #[error("refusing unsafe entry path {path:?}")]
    UnsafePath {
        /// The offending relative path as stored in the archive.
        path: String,
    },

    /// An error annotated with the path it originated from
    #[error("{}: {source}", .path.display())]
    WithPath {
        /// Path of the file the failing operation was working on.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<KittyError>,
    },
}

/// Result type alias for KittyPress operations
pub type Result<T> = std::result::Result<T, KittyError>;

/// Attach an originating path to errors crossing a public file-operation
/// boundary.
pub(crate) trait PathContext<T> {
    /// Wrap the error in [`KittyError::WithPath`] unless it already carries
    /// a path.
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T> PathContext<T> for Result<T> {
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| match e {
            already @ KittyError::WithPath { .. } => already,
            other => KittyError::WithPath {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        })
    }
}
