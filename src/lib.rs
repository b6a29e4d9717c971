//! KittyPress - lossless multi-file archiver
//!
//! This crate bundles files into `.kitty` archives (the KP04 container),
//! compressing each entry with a two-stage pipeline: a streaming
//! sliding-window dictionary coder followed by a Huffman entropy coder
//! whose code table travels in-band. It reads the three legacy per-file
//! container generations (KP01-KP03) and always writes KP03 entries
//! inside KP04 archives.
//!
//! # Features
//!
//! - Streaming dictionary coding over a 64 KB sliding window with a
//!   bounded hash chain (at most 64 remembered positions per 3-byte key)
//! - Two-pass Huffman encoding with an exact advertised bit length, so
//!   decoders never consume pad bits
//! - Adaptive skip: high-entropy files (sampled head at or above
//!   7.7 bits/byte) and files the pipeline fails to shrink are stored raw
//! - Backward-compatible reading of KP01/KP02/KP03 per-file containers
//! - Path-traversal hardening on extraction
//!
//! # Example - Archiving
//!
//! ```no_run
//! use kittypress::{collect_inputs, create_archive};
//! use std::path::PathBuf;
//!
//! let inputs = collect_inputs(&[PathBuf::from("photos"), PathBuf::from("notes.txt")])?;
//! create_archive(&inputs, std::path::Path::new("backup.kitty"))?;
//! # Ok::<(), kittypress::KittyError>(())
//! ```
//!
//! # Example - Extraction
//!
//! ```no_run
//! use kittypress::extract_archive;
//! use std::path::Path;
//!
//! extract_archive(Path::new("backup.kitty"), Path::new("restored"))?;
//! # Ok::<(), kittypress::KittyError>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

// Public modules
pub mod archive;
pub mod bitio;
pub mod common;
pub mod container;
pub mod error;
pub mod huffman;
pub mod lz77;

// Re-export commonly used types
pub use archive::{
    collect_inputs, create_archive, extract_archive, list_entries, ArchiveInfo, ArchiveInput,
    EntryInfo,
};
pub use common::{KittyError, Result, MAX_MATCH, MIN_MATCH, WINDOW_SIZE};
pub use container::{compress_file, decompress_file, Version};
pub use lz77::{StreamCompressor, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        // Core types and entry points are reachable from the crate root.
        let _ = Version::V3;
        let _ = Token::Literal(0);
        let _ = StreamCompressor::new();
        assert_eq!(WINDOW_SIZE, 65_535);
    }
}
