//! Multi-file archive container (KP04)
//!
//! An archive is a magic, a version byte, an entry count, then a sequence
//! of entries, each carrying its relative path and an embedded per-file
//! container produced by [`crate::container`]. Extraction stages every
//! entry through a `.tmpkitty` temporary next to its destination, exactly
//! one entry at a time.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::common::{
    KittyError, PathContext, Result, ARCHIVE_VERSION, MAGIC_V4,
};
use crate::container::{
    compress_file, decompress_file, path_with_suffix, read_exact_field, read_magic, read_u16,
    read_u32, read_u64, read_u8, ScratchFile, Version,
};

/// One file queued for archiving.
#[derive(Debug, Clone)]
pub struct ArchiveInput {
    /// Path of the file on disk.
    pub source: PathBuf,
    /// Path the entry will carry inside the archive.
    pub rel_path: String,
}

/// Header fields of one stored entry.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Relative path as stored.
    pub rel_path: String,
    /// Entry flags; `0x01` marks an embedded per-file container.
    pub flags: u8,
    /// Uncompressed length of the original file.
    pub orig_size: u64,
    /// Length of the embedded container stream.
    pub data_size: u64,
}

/// Archive header plus per-entry metadata, without payloads.
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    /// Version byte stored after the magic.
    pub version: u8,
    /// Entry headers in archive order.
    pub entries: Vec<EntryInfo>,
}

/// Expand a mixed list of file and directory paths into archive inputs.
///
/// A directory input contributes every regular file beneath it, named
/// relative to the directory's parent so the directory itself appears in
/// the archive. A plain file contributes its file name. Symlinks are not
/// followed during traversal.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<ArchiveInput>> {
    let mut list = Vec::new();
    for input in inputs {
        collect_one(input, &mut list).with_path(input)?;
    }
    Ok(list)
}

fn collect_one(input: &Path, list: &mut Vec<ArchiveInput>) -> Result<()> {
    let abs = std::path::absolute(input)?;
    let meta = fs::metadata(&abs)?;

    if meta.is_dir() {
        let base = abs.parent().unwrap_or(Path::new("/")).to_path_buf();
        for entry in WalkDir::new(&abs) {
            let entry = entry.map_err(walkdir_io)?;
            if entry.file_type().is_file() {
                let rel = entry
                    .path()
                    .strip_prefix(&base)
                    .expect("walk stays under its base")
                    .to_string_lossy()
                    .into_owned();
                list.push(ArchiveInput {
                    source: entry.into_path(),
                    rel_path: rel,
                });
            }
        }
    } else {
        let rel = abs
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "input has no file name"))?
            .to_string_lossy()
            .into_owned();
        list.push(ArchiveInput {
            source: abs,
            rel_path: rel,
        });
    }
    Ok(())
}

fn walkdir_io(e: walkdir::Error) -> KittyError {
    let io = e
        .io_error()
        .map(|io| io::Error::new(io.kind(), io.to_string()))
        .unwrap_or_else(|| io::Error::other(e.to_string()));
    KittyError::Io(io)
}

/// Write a KP04 archive containing `entries` to `output`.
pub fn create_archive(entries: &[ArchiveInput], output: &Path) -> Result<()> {
    create_inner(entries, output).with_path(output)
}

fn create_inner(entries: &[ArchiveInput], output: &Path) -> Result<()> {
    let count = u32::try_from(entries.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many entries"))?;

    let mut out = BufWriter::new(File::create(output)?);
    out.write_all(&MAGIC_V4)?;
    out.write_all(&[ARCHIVE_VERSION])?;
    out.write_all(&count.to_le_bytes())?;

    for entry in entries {
        append_entry(&mut out, entry).with_path(&entry.source)?;
    }

    out.flush()?;
    Ok(())
}

fn append_entry<W: Write>(out: &mut W, entry: &ArchiveInput) -> Result<()> {
    // Paths are normalized to forward slashes on write so archives move
    // across platforms; the reader accepts what is stored.
    let rel = entry.rel_path.replace('\\', "/");
    let path_len = u16::try_from(rel.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "relative path longer than 65535 bytes",
        )
    })?;

    let orig_size = fs::metadata(&entry.source)?.len();

    // Stage the per-file container next to the source, then embed it.
    let tmp = ScratchFile::claim(path_with_suffix(&entry.source, ".tmpkitty"));
    compress_file(&entry.source, tmp.path())?;
    let stored = fs::read(tmp.path())?;
    drop(tmp);

    out.write_all(&path_len.to_le_bytes())?;
    out.write_all(rel.as_bytes())?;
    out.write_all(&[0x01])?; // embedded container
    out.write_all(&orig_size.to_le_bytes())?;
    out.write_all(&(stored.len() as u64).to_le_bytes())?;
    out.write_all(&stored)?;
    Ok(())
}

/// Extract every entry of the archive at `archive` below `out_dir`,
/// creating parent directories as needed.
pub fn extract_archive(archive: &Path, out_dir: &Path) -> Result<()> {
    extract_inner(archive, out_dir).with_path(archive)
}

fn extract_inner(archive: &Path, out_dir: &Path) -> Result<()> {
    let mut reader = BufReader::new(File::open(archive)?);
    expect_archive_magic(&mut reader)?;
    let _version = read_u8(&mut reader, "archive version")?;
    let count = read_u32(&mut reader, "entry count")?;

    for _ in 0..count {
        let rel = read_entry_path(&mut reader)?;
        validate_entry_path(&rel)?;
        let _flags = read_u8(&mut reader, "entry flags")?;
        let _orig_size = read_u64(&mut reader, "original size")?;
        let data_size = read_u64(&mut reader, "entry data size")?;

        let dest = out_dir.join(&rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = ScratchFile::claim(path_with_suffix(&dest, ".tmpkitty"));
        {
            let mut tmp_out = BufWriter::new(File::create(tmp.path())?);
            let copied = io::copy(&mut reader.by_ref().take(data_size), &mut tmp_out)?;
            if copied != data_size {
                return Err(KittyError::Truncated("entry data"));
            }
            tmp_out.flush()?;
        }
        decompress_file(tmp.path(), &dest)?;
    }
    Ok(())
}

/// Read the archive header and entry metadata without decoding payloads.
pub fn list_entries(archive: &Path) -> Result<ArchiveInfo> {
    list_inner(archive).with_path(archive)
}

fn list_inner(archive: &Path) -> Result<ArchiveInfo> {
    let mut reader = BufReader::new(File::open(archive)?);
    expect_archive_magic(&mut reader)?;
    let version = read_u8(&mut reader, "archive version")?;
    let count = read_u32(&mut reader, "entry count")?;

    let mut entries = Vec::with_capacity(count.min(1024) as usize);
    for _ in 0..count {
        let rel_path = read_entry_path(&mut reader)?;
        let flags = read_u8(&mut reader, "entry flags")?;
        let orig_size = read_u64(&mut reader, "original size")?;
        let data_size = read_u64(&mut reader, "entry data size")?;
        let skipped = io::copy(&mut reader.by_ref().take(data_size), &mut io::sink())?;
        if skipped != data_size {
            return Err(KittyError::Truncated("entry data"));
        }
        entries.push(EntryInfo {
            rel_path,
            flags,
            orig_size,
            data_size,
        });
    }
    Ok(ArchiveInfo { version, entries })
}

fn expect_archive_magic<R: Read>(reader: &mut R) -> Result<()> {
    let magic = read_magic(reader)?;
    match Version::from_magic(magic) {
        Some(Version::V4) => Ok(()),
        Some(per_file) => Err(KittyError::UnsupportedVersion {
            found: per_file.name(),
            expected: Version::V4.name(),
        }),
        None => Err(KittyError::BadSignature { found: magic }),
    }
}

fn read_entry_path<R: Read>(reader: &mut R) -> Result<String> {
    let path_len = read_u16(reader, "entry path length")?;
    let mut bytes = vec![0u8; path_len as usize];
    read_exact_field(reader, &mut bytes, "entry path")?;
    String::from_utf8(bytes)
        .map_err(|_| KittyError::Corrupt("entry path is not valid UTF-8".to_string()))
}

/// Reject entry paths that would write outside the extraction directory.
fn validate_entry_path(rel: &str) -> Result<()> {
    let unsafe_path = || KittyError::UnsafePath {
        path: rel.to_string(),
    };

    if rel.is_empty() || rel.contains('\0') {
        return Err(unsafe_path());
    }
    for component in Path::new(rel).components() {
        match component {
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_path());
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_entry_path_accepts_nested() {
        assert!(validate_entry_path("a.txt").is_ok());
        assert!(validate_entry_path("dir/sub/a.txt").is_ok());
        assert!(validate_entry_path("./dir/a.txt").is_ok());
    }

    #[test]
    fn test_validate_entry_path_rejects_traversal() {
        assert!(validate_entry_path("../a.txt").is_err());
        assert!(validate_entry_path("dir/../../a.txt").is_err());
        assert!(validate_entry_path("/etc/passwd").is_err());
        assert!(validate_entry_path("").is_err());
        assert!(validate_entry_path("a\0b").is_err());
    }

    #[test]
    fn test_collect_single_file_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("note.txt");
        fs::write(&file, b"hi").unwrap();

        let list = collect_inputs(&[file.clone()]).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].rel_path, "note.txt");
        assert_eq!(list[0].source, std::path::absolute(&file).unwrap());
    }

    #[test]
    fn test_collect_directory_keeps_its_name() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("data");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("a.txt"), b"a").unwrap();
        fs::create_dir(sub.join("inner")).unwrap();
        fs::write(sub.join("inner/b.txt"), b"b").unwrap();

        let mut rels: Vec<String> = collect_inputs(&[sub])
            .unwrap()
            .into_iter()
            .map(|e| e.rel_path)
            .collect();
        rels.sort();
        assert_eq!(rels, vec!["data/a.txt", "data/inner/b.txt"]);
    }

    #[test]
    fn test_collect_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.txt");
        assert!(collect_inputs(&[missing]).is_err());
    }
}
