//! End-to-end tests for the KP04 archive: multi-file roundtrips, header
//! layout, entry listing, and extraction hardening.

use kittypress::{
    collect_inputs, create_archive, extract_archive, list_entries, ArchiveInput, KittyError,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn input(dir: &Path, name: &str, data: &[u8]) -> ArchiveInput {
    let source = dir.join(name);
    fs::write(&source, data).unwrap();
    ArchiveInput {
        source,
        rel_path: name.to_string(),
    }
}

#[test]
fn two_file_archive_roundtrips() {
    let dir = tempdir().unwrap();
    let a_data = b"hello\nhello\nhello\n".to_vec();
    let b_data: Vec<u8> = (0..=255u8).collect();

    let entries = vec![
        input(dir.path(), "a.txt", &a_data),
        input(dir.path(), "b.bin", &b_data),
    ];
    let archive = dir.path().join("pair.kitty");
    create_archive(&entries, &archive).unwrap();

    // Magic, version byte, little-endian count.
    let bytes = fs::read(&archive).unwrap();
    assert_eq!(&bytes[..4], b"KP04");
    assert_eq!(bytes[4], 4);
    assert_eq!(u32::from_le_bytes(bytes[5..9].try_into().unwrap()), 2);

    let out = dir.path().join("out");
    extract_archive(&archive, &out).unwrap();
    assert_eq!(fs::read(out.join("a.txt")).unwrap(), a_data);
    assert_eq!(fs::read(out.join("b.bin")).unwrap(), b_data);
}

#[test]
fn extraction_is_idempotent() {
    let dir = tempdir().unwrap();
    let entries = vec![
        input(dir.path(), "one.txt", b"once upon a time, once upon a time"),
        input(dir.path(), "two.txt", &[0u8; 4096]),
    ];
    let archive = dir.path().join("twice.kitty");
    create_archive(&entries, &archive).unwrap();

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    extract_archive(&archive, &first).unwrap();
    extract_archive(&archive, &second).unwrap();

    for name in ["one.txt", "two.txt"] {
        assert_eq!(
            fs::read(first.join(name)).unwrap(),
            fs::read(second.join(name)).unwrap()
        );
    }
}

#[test]
fn nested_paths_create_parents() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("deep.txt");
    fs::write(&source, b"buried treasure").unwrap();

    let entries = vec![ArchiveInput {
        source,
        rel_path: "a/b/c/deep.txt".to_string(),
    }];
    let archive = dir.path().join("nested.kitty");
    create_archive(&entries, &archive).unwrap();

    let out = dir.path().join("out");
    extract_archive(&archive, &out).unwrap();
    assert_eq!(
        fs::read(out.join("a/b/c/deep.txt")).unwrap(),
        b"buried treasure"
    );
}

#[test]
fn directory_inputs_roundtrip() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    fs::create_dir_all(tree.join("branch")).unwrap();
    fs::write(tree.join("root.txt"), b"root file").unwrap();
    fs::write(tree.join("branch/leaf.txt"), b"leaf file").unwrap();

    let entries = collect_inputs(&[tree]).unwrap();
    assert_eq!(entries.len(), 2);

    let archive = dir.path().join("tree.kitty");
    create_archive(&entries, &archive).unwrap();

    let out = dir.path().join("out");
    extract_archive(&archive, &out).unwrap();
    assert_eq!(fs::read(out.join("tree/root.txt")).unwrap(), b"root file");
    assert_eq!(
        fs::read(out.join("tree/branch/leaf.txt")).unwrap(),
        b"leaf file"
    );
}

#[test]
fn list_entries_reports_headers() {
    let dir = tempdir().unwrap();
    let data = vec![0x55u8; 10_000];
    let entries = vec![
        input(dir.path(), "listed.bin", &data),
        input(dir.path(), "small.txt", b"tiny"),
    ];
    let archive = dir.path().join("listed.kitty");
    create_archive(&entries, &archive).unwrap();

    let info = list_entries(&archive).unwrap();
    assert_eq!(info.version, 4);
    assert_eq!(info.entries.len(), 2);
    assert_eq!(info.entries[0].rel_path, "listed.bin");
    assert_eq!(info.entries[0].flags, 0x01);
    assert_eq!(info.entries[0].orig_size, 10_000);
    assert!(info.entries[0].data_size > 0);
    assert_eq!(info.entries[1].orig_size, 4);
}

/// A minimal raw KP03 container wrapping `data`, for hand-built archives.
fn raw_container(data: &[u8]) -> Vec<u8> {
    let mut c = Vec::new();
    c.extend_from_slice(b"KP03");
    c.push(0);
    c.extend_from_slice(&0u64.to_le_bytes());
    c.extend_from_slice(&(data.len() as u64).to_le_bytes());
    c.extend_from_slice(data);
    c
}

fn hand_built_archive(rel_path: &str, data: &[u8]) -> Vec<u8> {
    let container = raw_container(data);
    let mut a = Vec::new();
    a.extend_from_slice(b"KP04");
    a.push(4);
    a.extend_from_slice(&1u32.to_le_bytes());
    a.extend_from_slice(&(rel_path.len() as u16).to_le_bytes());
    a.extend_from_slice(rel_path.as_bytes());
    a.push(0x01);
    a.extend_from_slice(&(data.len() as u64).to_le_bytes());
    a.extend_from_slice(&(container.len() as u64).to_le_bytes());
    a.extend_from_slice(&container);
    a
}

#[test]
fn traversal_paths_are_rejected() {
    for evil in ["../evil.txt", "/etc/evil.txt", "a/../../evil.txt"] {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("evil.kitty");
        fs::write(&archive, hand_built_archive(evil, b"gotcha")).unwrap();

        let out = dir.path().join("out");
        let err = extract_archive(&archive, &out).unwrap_err();
        assert!(
            err.to_string().contains("unsafe entry path"),
            "{evil}: {err}"
        );
        assert!(!dir.path().join("evil.txt").exists());
    }
}

#[test]
fn hand_built_archive_extracts() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("hand.kitty");
    fs::write(&archive, hand_built_archive("plain.txt", b"stored raw")).unwrap();

    let out = dir.path().join("out");
    extract_archive(&archive, &out).unwrap();
    assert_eq!(fs::read(out.join("plain.txt")).unwrap(), b"stored raw");
}

#[test]
fn per_file_container_rejected_as_archive() {
    let dir = tempdir().unwrap();
    let not_archive = dir.path().join("single.kitty");
    fs::write(&not_archive, raw_container(b"data")).unwrap();

    let err = extract_archive(&not_archive, &dir.path().join("out")).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("KP03") && msg.contains("KP04"), "{msg}");
}

#[test]
fn garbage_rejected_as_archive() {
    let dir = tempdir().unwrap();
    let garbage = dir.path().join("garbage.kitty");
    fs::write(&garbage, b"not an archive at all").unwrap();

    let err = extract_archive(&garbage, &dir.path().join("out")).unwrap_err();
    assert!(err.to_string().contains("bad signature"));
}

#[test]
fn truncated_archive_is_detected() {
    let dir = tempdir().unwrap();
    let entries = vec![input(dir.path(), "cut.txt", &vec![0x33u8; 5000])];
    let archive = dir.path().join("cut.kitty");
    create_archive(&entries, &archive).unwrap();

    let mut bytes = fs::read(&archive).unwrap();
    bytes.truncate(bytes.len() / 2);
    let cut = dir.path().join("cut-short.kitty");
    fs::write(&cut, bytes).unwrap();

    let err = extract_archive(&cut, &dir.path().join("out")).unwrap_err();
    assert!(
        err.to_string().contains("unexpected end of stream"),
        "{err}"
    );
}

#[test]
fn archive_error_names_archive_path() {
    let missing = PathBuf::from("/definitely/not/here.kitty");
    let err = extract_archive(&missing, Path::new("/tmp")).unwrap_err();
    assert!(matches!(err, KittyError::WithPath { .. }));
    assert!(err.to_string().contains("here.kitty"));
}
