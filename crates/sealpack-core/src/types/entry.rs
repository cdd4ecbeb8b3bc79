//! Parsed record headers.

use std::io::Read;
use std::path::PathBuf;

use super::RecordType;
use crate::ArchiveError;
use crate::Result;

/// In-memory view of one record header, as read from an untrusted stream.
///
/// Nothing in an `Entry` has been validated: `path` and `link_target` are
/// exactly what the header says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path stored in the header.
    pub path: String,

    /// Record type tag.
    pub record_type: RecordType,

    /// Permission bits stored in the header.
    pub mode: u32,

    /// Payload size in bytes (zero for non-regular records).
    pub size: u64,

    /// Raw symlink target, present only for `Symlink` records.
    pub link_target: Option<String>,
}

impl Entry {
    /// Renders the type and permission bits the way `ls -l` does.
    ///
    /// # Examples
    ///
    /// ```
    /// use sealpack_core::Entry;
    /// use sealpack_core::RecordType;
    ///
    /// let entry = Entry {
    ///     path: "bin/run.sh".to_string(),
    ///     record_type: RecordType::Regular,
    ///     mode: 0o755,
    ///     size: 12,
    ///     link_target: None,
    /// };
    /// assert_eq!(entry.mode_string(), "-rwxr-xr-x");
    /// ```
    #[must_use]
    pub fn mode_string(&self) -> String {
        const BITS: [(u32, char); 9] = [
            (0o400, 'r'),
            (0o200, 'w'),
            (0o100, 'x'),
            (0o040, 'r'),
            (0o020, 'w'),
            (0o010, 'x'),
            (0o004, 'r'),
            (0o002, 'w'),
            (0o001, 'x'),
        ];

        let mut out = String::with_capacity(10);
        out.push(self.record_type.type_char());
        for (bit, ch) in BITS {
            out.push(if self.mode & bit == 0 { '-' } else { ch });
        }
        out
    }

    /// Builds an entry from a tar header without reading its payload.
    pub(crate) fn from_tar<R: Read>(entry: &tar::Entry<'_, R>) -> Result<Self> {
        let header = entry.header();
        let path_bytes = entry.path_bytes();
        let path = String::from_utf8(path_bytes.to_vec()).map_err(|_| {
            ArchiveError::InvalidCharacters {
                path: PathBuf::from(String::from_utf8_lossy(&path_bytes).into_owned()),
            }
        })?;

        let record_type = RecordType::from_tar(header.entry_type());
        let mode = header
            .mode()
            .map_err(|e| ArchiveError::InvalidArchive(format!("{path}: invalid mode: {e}")))?;

        let link_target = if record_type == RecordType::Symlink {
            let target = entry.link_name_bytes().unwrap_or_default();
            let target = String::from_utf8(target.to_vec()).map_err(|_| {
                ArchiveError::InvalidSymlinkCharacters {
                    path: PathBuf::from(&path),
                    target: PathBuf::from(String::from_utf8_lossy(&target).into_owned()),
                }
            })?;
            Some(target)
        } else {
            None
        };

        let size = if record_type == RecordType::Regular {
            entry.size()
        } else {
            0
        };

        Ok(Self {
            path,
            record_type,
            mode: mode & 0o7777,
            size,
            link_target,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::RecordStreamBuilder;

    fn parse_all(data: Vec<u8>) -> Vec<Entry> {
        let mut archive = tar::Archive::new(std::io::Cursor::new(data));
        archive
            .entries()
            .unwrap()
            .map(|e| Entry::from_tar(&e.unwrap()).unwrap())
            .collect()
    }

    fn entry(record_type: RecordType, mode: u32) -> Entry {
        Entry {
            path: "x".to_string(),
            record_type,
            mode,
            size: 0,
            link_target: None,
        }
    }

    #[test]
    fn test_mode_string() {
        assert_eq!(entry(RecordType::Regular, 0o644).mode_string(), "-rw-r--r--");
        assert_eq!(entry(RecordType::Directory, 0o700).mode_string(), "drwx------");
        assert_eq!(entry(RecordType::Symlink, 0o777).mode_string(), "lrwxrwxrwx");
        assert_eq!(entry(RecordType::Other(b'6'), 0o600).mode_string(), "prw-------");
    }

    #[test]
    fn test_from_tar_regular() {
        let data = RecordStreamBuilder::new()
            .add_file_with_mode("bin/tool", b"#!/bin/sh\n", 0o755)
            .build();
        let entries = parse_all(data);
        assert_eq!(
            entries,
            vec![Entry {
                path: "bin/tool".to_string(),
                record_type: RecordType::Regular,
                mode: 0o755,
                size: 10,
                link_target: None,
            }]
        );
    }

    #[test]
    fn test_from_tar_symlink_keeps_raw_target() {
        let data = RecordStreamBuilder::new()
            .add_symlink("link", "../../etc/passwd")
            .build();
        let entries = parse_all(data);
        assert_eq!(entries[0].record_type, RecordType::Symlink);
        assert_eq!(entries[0].link_target.as_deref(), Some("../../etc/passwd"));
    }

    #[test]
    fn test_from_tar_keeps_hostile_path() {
        let data = RecordStreamBuilder::new()
            .add_file("../../etc/passwd", b"x")
            .build();
        let entries = parse_all(data);
        assert_eq!(entries[0].path, "../../etc/passwd");
    }

    #[test]
    fn test_from_tar_non_utf8_path() {
        let data = RecordStreamBuilder::new()
            .add_file_raw_name(b"bad\xffname", b"x")
            .build();
        let mut archive = tar::Archive::new(std::io::Cursor::new(data));
        let raw = archive.entries().unwrap().next().unwrap().unwrap();
        assert!(matches!(
            Entry::from_tar(&raw),
            Err(ArchiveError::InvalidCharacters { .. })
        ));
    }
}
