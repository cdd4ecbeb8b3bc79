//! Listing behavior and its interaction with extraction.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use sealpack_core::ArchiveError;
use sealpack_core::Extractor;
use sealpack_core::Packer;
use sealpack_core::RecordType;
use sealpack_core::test_utils::RecordStreamBuilder;
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

fn sample_archive() -> Cursor<Vec<u8>> {
    RecordStreamBuilder::new()
        .add_directory("app")
        .add_file_with_mode("app/start", b"#!/bin/sh\nexec app\n", 0o755)
        .add_file("app/config.toml", b"debug = false\n")
        .add_symlink("app/current", "config.toml")
        .build_cursor()
}

#[test]
fn test_list_repeated_is_identical() {
    let mut extractor = Extractor::new(sample_archive()).unwrap();

    let first = extractor.list().unwrap();
    let second = extractor.list().unwrap();
    let third = extractor.list().unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(first.len(), 4);
}

#[test]
fn test_list_contents() {
    let mut extractor = Extractor::new(sample_archive()).unwrap();
    let entries = extractor.list().unwrap();

    let summary: Vec<(String, String, Option<String>)> = entries
        .iter()
        .map(|e| (e.path.clone(), e.mode_string(), e.link_target.clone()))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("app".to_string(), "drwxr-xr-x".to_string(), None),
            ("app/start".to_string(), "-rwxr-xr-x".to_string(), None),
            ("app/config.toml".to_string(), "-rw-r--r--".to_string(), None),
            (
                "app/current".to_string(),
                "lrwxrwxrwx".to_string(),
                Some("config.toml".to_string())
            ),
        ]
    );
}

#[test]
fn test_extract_after_list_matches_fresh_extract() {
    let listed_dest = TempDir::new().unwrap();
    let fresh_dest = TempDir::new().unwrap();

    let mut listed = Extractor::new(sample_archive()).unwrap();
    listed.list().unwrap();
    listed.list().unwrap();
    let listed_report = listed.extract_all(listed_dest.path()).unwrap();

    let mut fresh = Extractor::new(sample_archive()).unwrap();
    let fresh_report = fresh.extract_all(fresh_dest.path()).unwrap();

    assert_eq!(listed_report.total_items(), fresh_report.total_items());
    assert_eq!(listed_report.bytes_written, fresh_report.bytes_written);
    for name in ["app/start", "app/config.toml"] {
        assert_eq!(
            fs::read(listed_dest.path().join(name)).unwrap(),
            fs::read(fresh_dest.path().join(name)).unwrap()
        );
    }
}

#[test]
fn test_list_after_extract() {
    let dest = TempDir::new().unwrap();
    let mut extractor = Extractor::new(sample_archive()).unwrap();

    let before = extractor.list().unwrap();
    extractor.extract_all(dest.path()).unwrap();
    let after = extractor.list().unwrap();

    assert_eq!(before, after);
}

#[test]
fn test_list_does_not_validate() {
    // Listing is for inspection: hostile names are shown, not rejected.
    let mut extractor = Extractor::new(
        RecordStreamBuilder::new()
            .add_file("../../etc/passwd", b"x")
            .add_symlink("link", "/etc/shadow")
            .add_fifo("pipe")
            .build_cursor(),
    )
    .unwrap();

    let entries = extractor.list().unwrap();
    assert_eq!(entries[0].path, "../../etc/passwd");
    assert_eq!(entries[1].link_target.as_deref(), Some("/etc/shadow"));
    assert_eq!(entries[2].record_type, RecordType::Other(b'6'));

    let dest = TempDir::new().unwrap();
    assert!(matches!(
        extractor.extract_all(dest.path()),
        Err(ArchiveError::InvalidLocation { .. })
    ));
}

#[cfg(unix)]
#[test]
fn test_packing_unsupported_type_leaves_no_record() {
    let source = TempDir::new().unwrap();
    let root = source.path().join("tree");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), b"a").unwrap();
    let _socket = std::os::unix::net::UnixListener::bind(root.join("m.sock")).unwrap();
    fs::write(root.join("z.txt"), b"z").unwrap();

    let mut packer = Packer::new(Vec::new());
    let err = packer.add_all(&[&root]).unwrap_err();
    assert!(
        matches!(&err, ArchiveError::UnsupportedEntryType { path } if path.ends_with("m.sock")),
        "{err}"
    );

    let data = packer.finish().unwrap();
    let entries = Extractor::new(Cursor::new(data)).unwrap().list().unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();

    assert_eq!(names.len(), 2, "{names:?}");
    assert!(names[0].ends_with("tree"));
    assert!(names[1].ends_with("tree/a.txt"));
}
