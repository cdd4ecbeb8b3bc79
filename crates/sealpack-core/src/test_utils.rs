//! Helpers for building record streams in tests.
//!
//! [`RecordStreamBuilder`] writes header bytes directly instead of going
//! through `tar::Builder::append_data`, which refuses `..` and absolute
//! names. That makes it possible to forge the hostile archives the
//! extractor has to reject.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors or on names longer
//! than 100 bytes since they are designed for test use only.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;

/// Builder for in-memory record streams with arbitrary names and types.
///
/// # Examples
///
/// ```
/// use sealpack_core::test_utils::RecordStreamBuilder;
///
/// let data = RecordStreamBuilder::new()
///     .add_directory("dir")
///     .add_file("dir/file.txt", b"content")
///     .add_symlink("escape", "../../../etc/passwd")
///     .add_file("../outside.txt", b"pwned")
///     .build();
/// ```
pub struct RecordStreamBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl RecordStreamBuilder {
    /// Creates an empty stream builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    /// Adds a regular file with mode `0644`.
    #[must_use]
    pub fn add_file(self, path: &str, data: &[u8]) -> Self {
        self.add_file_with_mode(path, data, 0o644)
    }

    /// Adds a regular file with a custom mode.
    #[must_use]
    pub fn add_file_with_mode(self, path: &str, data: &[u8], mode: u32) -> Self {
        self.add_record(
            path.as_bytes(),
            tar::EntryType::Regular,
            mode,
            None,
            data,
        )
    }

    /// Adds a regular file whose name is given as raw bytes.
    #[must_use]
    pub fn add_file_raw_name(self, path: &[u8], data: &[u8]) -> Self {
        self.add_record(path, tar::EntryType::Regular, 0o644, None, data)
    }

    /// Adds a directory with mode `0755`.
    #[must_use]
    pub fn add_directory(self, path: &str) -> Self {
        self.add_record(
            path.as_bytes(),
            tar::EntryType::Directory,
            0o755,
            None,
            &[],
        )
    }

    /// Adds a symlink with a raw, unvalidated target.
    #[must_use]
    pub fn add_symlink(self, path: &str, target: &str) -> Self {
        self.add_symlink_raw_target(path, target.as_bytes())
    }

    /// Adds a symlink whose target is given as raw bytes.
    #[must_use]
    pub fn add_symlink_raw_target(self, path: &str, target: &[u8]) -> Self {
        self.add_record(
            path.as_bytes(),
            tar::EntryType::Symlink,
            0o777,
            Some(target),
            &[],
        )
    }

    /// Adds a FIFO record.
    #[must_use]
    pub fn add_fifo(self, path: &str) -> Self {
        self.add_record(path.as_bytes(), tar::EntryType::Fifo, 0o644, None, &[])
    }

    /// Finishes the stream and returns its bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }

    /// Finishes the stream and wraps it in a seekable cursor.
    #[must_use]
    pub fn build_cursor(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.build())
    }

    fn add_record(
        mut self,
        path: &[u8],
        entry_type: tar::EntryType,
        mode: u32,
        link_target: Option<&[u8]>,
        data: &[u8],
    ) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(entry_type);
        header.set_mode(mode);
        header.set_uid(0);
        header.set_gid(0);
        header.set_mtime(0);
        header.set_size(data.len() as u64);

        let raw = header.as_old_mut();
        raw.name[..path.len()].copy_from_slice(path);
        if let Some(target) = link_target {
            raw.linkname[..target.len()].copy_from_slice(target);
        }

        header.set_cksum();
        self.builder.append(&header, data).unwrap();
        self
    }
}

impl Default for RecordStreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}
