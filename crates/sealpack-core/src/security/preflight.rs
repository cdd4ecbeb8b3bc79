//! Whole-archive validation run before anything is written.
//!
//! Every rule is checked against the complete entry list, so a hostile
//! record at the very end of an archive still stops extraction before the
//! first directory is created.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::ArchiveError;
use crate::ExtractionConfig;
use crate::Result;
use crate::error::IoResultExt;
use crate::security::path::is_within;
use crate::security::path::path_depth;
use crate::security::path::resolve_entry_path;
use crate::security::symlink::resolve_link_target;
use crate::security::symlink::climbs_through_symlink;
use crate::types::Basedir;
use crate::types::Entry;
use crate::types::RecordType;

/// Destination computed for one entry during preflight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEntry {
    /// Cleaned destination path, strictly inside the extraction root.
    pub dst: PathBuf,
}

/// Validates a full entry list against an extraction root.
///
/// # Examples
///
/// ```no_run
/// use sealpack_core::Basedir;
/// use sealpack_core::Entry;
/// use sealpack_core::ExtractionConfig;
/// use sealpack_core::RecordType;
/// use sealpack_core::security::Preflight;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let basedir = Basedir::new("/tmp/out")?;
/// let config = ExtractionConfig::default();
/// let entries = vec![Entry {
///     path: "../../etc/passwd".to_string(),
///     record_type: RecordType::Regular,
///     mode: 0o644,
///     size: 0,
///     link_target: None,
/// }];
///
/// assert!(Preflight::new(&basedir, &config).validate(&entries).is_err());
/// # Ok(())
/// # }
/// ```
pub struct Preflight<'a> {
    basedir: &'a Basedir,
    config: &'a ExtractionConfig,
}

impl<'a> Preflight<'a> {
    /// Creates a validator for `basedir`.
    #[must_use]
    pub const fn new(basedir: &'a Basedir, config: &'a ExtractionConfig) -> Self {
        Self { basedir, config }
    }

    /// Validates `entries` in archive order.
    ///
    /// Returns one [`ValidatedEntry`] per input entry, in the same order.
    ///
    /// # Errors
    ///
    /// Returns the first violation found:
    ///
    /// - `UnsupportedEntryType` for any tag other than regular, directory,
    ///   or symlink
    /// - `InvalidLocation` / `InvalidCharacters` for a bad entry path, or for
    ///   an entry placed underneath a symlink or a regular file (from the
    ///   archive or on disk)
    /// - `PathTooDeep` if a path exceeds the configured depth
    /// - `AlreadyExists` if a destination or a resolved symlink target is
    ///   already on disk, or two entries share a destination
    /// - `AbsoluteSymlinkTarget` / `InvalidSymlinkTarget` /
    ///   `InvalidSymlinkCharacters` for a bad symlink target
    /// - `Io` if the filesystem cannot be queried
    pub fn validate(&self, entries: &[Entry]) -> Result<Vec<ValidatedEntry>> {
        debug!(
            entries = entries.len(),
            basedir = %self.basedir.as_path().display(),
            "preflight validation started"
        );

        let symlinks = self.collect_destinations(entries, |t| t == RecordType::Symlink);
        let leaves = self.collect_destinations(entries, |t| t != RecordType::Directory);
        let mut seen: HashSet<PathBuf> = HashSet::with_capacity(entries.len());
        let mut validated = Vec::with_capacity(entries.len());

        for entry in entries {
            if !entry.record_type.is_supported() {
                return Err(ArchiveError::UnsupportedEntryType {
                    path: PathBuf::from(&entry.path),
                });
            }

            let dst = resolve_entry_path(self.basedir, &entry.path)?;
            self.check_depth(&dst)?;

            if !seen.insert(dst.clone()) {
                return Err(ArchiveError::AlreadyExists { path: dst });
            }

            self.check_ancestors(&dst, &leaves)?;
            ensure_absent(&dst)?;

            if entry.record_type == RecordType::Symlink {
                let target = entry.link_target.as_deref().unwrap_or_default();
                let resolved = resolve_link_target(self.basedir, &dst, target)?;
                if climbs_through_symlink(&dst, target, &symlinks) {
                    return Err(ArchiveError::InvalidSymlinkTarget {
                        path: dst,
                        target: PathBuf::from(target),
                    });
                }
                ensure_absent(&resolved)?;
            }

            validated.push(ValidatedEntry { dst });
        }

        debug!(entries = validated.len(), "preflight validation passed");
        Ok(validated)
    }

    /// Destinations of every entry of a matching type whose own path is
    /// valid.
    ///
    /// Collected up front so an entry can be rejected for sitting under a
    /// symlink or file that appears later in the archive.
    fn collect_destinations(
        &self,
        entries: &[Entry],
        matches: impl Fn(RecordType) -> bool,
    ) -> HashSet<PathBuf> {
        entries
            .iter()
            .filter(|e| matches(e.record_type))
            .filter_map(|e| resolve_entry_path(self.basedir, &e.path).ok())
            .collect()
    }

    fn check_depth(&self, dst: &Path) -> Result<()> {
        let depth = path_depth(dst).saturating_sub(path_depth(self.basedir.as_path()));
        if depth > self.config.max_path_depth {
            return Err(ArchiveError::PathTooDeep {
                path: dst.to_path_buf(),
                depth,
                max: self.config.max_path_depth,
            });
        }
        Ok(())
    }

    /// Rejects `dst` if anything between it and the root is not a real
    /// directory, either in the archive (`leaves`) or on disk.
    fn check_ancestors(&self, dst: &Path, leaves: &HashSet<PathBuf>) -> Result<()> {
        let root = self.basedir.as_path();
        for ancestor in dst.ancestors().skip(1) {
            if !is_within(root, ancestor) {
                break;
            }

            if leaves.contains(ancestor) {
                return Err(ArchiveError::InvalidLocation {
                    path: dst.to_path_buf(),
                });
            }

            match std::fs::symlink_metadata(ancestor) {
                Ok(meta) if !meta.is_dir() => {
                    return Err(ArchiveError::InvalidLocation {
                        path: dst.to_path_buf(),
                    });
                }
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e).with_path(ancestor),
            }
        }
        Ok(())
    }
}

/// Fails with `AlreadyExists` if anything, including a dangling symlink,
/// is present at `path`.
fn ensure_absent(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => Err(ArchiveError::AlreadyExists {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_path(path),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_basedir() -> (TempDir, Basedir) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let basedir = Basedir::new(temp.path()).expect("failed to create basedir");
        (temp, basedir)
    }

    fn file(path: &str) -> Entry {
        Entry {
            path: path.to_string(),
            record_type: RecordType::Regular,
            mode: 0o644,
            size: 0,
            link_target: None,
        }
    }

    fn dir(path: &str) -> Entry {
        Entry {
            path: path.to_string(),
            record_type: RecordType::Directory,
            mode: 0o755,
            size: 0,
            link_target: None,
        }
    }

    fn symlink(path: &str, target: &str) -> Entry {
        Entry {
            path: path.to_string(),
            record_type: RecordType::Symlink,
            mode: 0o777,
            size: 0,
            link_target: Some(target.to_string()),
        }
    }

    fn validate(basedir: &Basedir, entries: &[Entry]) -> Result<Vec<ValidatedEntry>> {
        let config = ExtractionConfig::default();
        Preflight::new(basedir, &config).validate(entries)
    }

    #[test]
    fn test_valid_tree() {
        let (_temp, basedir) = create_test_basedir();
        let entries = [
            dir("a"),
            file("a/one.txt"),
            symlink("a/link", "one.txt"),
            symlink("up", "a/one.txt"),
        ];
        let validated = validate(&basedir, &entries).unwrap();

        assert_eq!(validated.len(), 4);
        assert_eq!(validated[1].dst, basedir.as_path().join("a/one.txt"));
        assert_eq!(validated[3].dst, basedir.as_path().join("up"));
    }

    #[test]
    fn test_unsupported_type() {
        let (_temp, basedir) = create_test_basedir();
        let mut fifo = file("pipe");
        fifo.record_type = RecordType::Other(b'6');
        let result = validate(&basedir, &[file("ok"), fifo]);
        assert!(matches!(
            result,
            Err(ArchiveError::UnsupportedEntryType { .. })
        ));
    }

    #[test]
    fn test_collision_with_last_entry() {
        let (temp, basedir) = create_test_basedir();
        std::fs::write(temp.path().join("existing"), b"keep").unwrap();

        let entries = [file("a"), file("b"), file("existing")];
        let result = validate(&basedir, &entries);
        assert!(matches!(result, Err(ArchiveError::AlreadyExists { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_collision_with_dangling_symlink() {
        let (temp, basedir) = create_test_basedir();
        std::os::unix::fs::symlink("/nonexistent", temp.path().join("dangling")).unwrap();

        let result = validate(&basedir, &[file("dangling")]);
        assert!(matches!(result, Err(ArchiveError::AlreadyExists { .. })));
    }

    #[test]
    fn test_duplicate_entries() {
        let (_temp, basedir) = create_test_basedir();
        let entries = [file("a/b"), file("a/./b")];
        let result = validate(&basedir, &entries);
        assert!(matches!(result, Err(ArchiveError::AlreadyExists { .. })));
    }

    #[test]
    fn test_symlink_target_exists_on_disk() {
        let (temp, basedir) = create_test_basedir();
        std::fs::write(temp.path().join("present"), b"x").unwrap();

        let result = validate(&basedir, &[symlink("link", "present")]);
        assert!(matches!(result, Err(ArchiveError::AlreadyExists { .. })));
    }

    #[test]
    fn test_entry_under_archive_symlink() {
        let (_temp, basedir) = create_test_basedir();
        // The symlink comes after the entry that relies on it.
        let entries = [file("d/file"), symlink("d", "elsewhere")];
        let result = validate(&basedir, &entries);
        assert!(matches!(result, Err(ArchiveError::InvalidLocation { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_entry_under_disk_symlink() {
        let (temp, basedir) = create_test_basedir();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("d")).unwrap();

        let result = validate(&basedir, &[file("d/file")]);
        assert!(matches!(result, Err(ArchiveError::InvalidLocation { .. })));
        assert!(!outside.path().join("file").exists());
    }

    #[test]
    fn test_symlink_chain_escape() {
        let (_temp, basedir) = create_test_basedir();
        // Lexically `x` points at `a/y`, but the kernel would climb from
        // wherever `l` points.
        let entries = [
            dir("a"),
            dir("a/b"),
            symlink("a/b/l", ".."),
            symlink("x", "a/b/l/../../y"),
        ];
        let result = validate(&basedir, &entries);
        assert!(matches!(
            result,
            Err(ArchiveError::InvalidSymlinkTarget { .. })
        ));
    }

    #[test]
    fn test_entry_under_archive_file() {
        let (_temp, basedir) = create_test_basedir();
        for entries in [
            [file("first.txt"), file("a"), file("a/b")],
            [file("first.txt"), file("a/b"), file("a")],
        ] {
            let result = validate(&basedir, &entries);
            assert!(matches!(result, Err(ArchiveError::InvalidLocation { .. })));
        }
    }

    #[test]
    fn test_entry_under_disk_file() {
        let (temp, basedir) = create_test_basedir();
        std::fs::write(temp.path().join("a"), b"keep").unwrap();

        let result = validate(&basedir, &[file("a/b")]);
        assert!(matches!(result, Err(ArchiveError::InvalidLocation { .. })));
    }

    #[test]
    fn test_symlink_descends_through_symlink() {
        let (_temp, basedir) = create_test_basedir();
        let entries = [
            symlink("bin", "current/bin"),
            symlink("current", "v1"),
            dir("v1"),
            dir("v1/bin"),
            file("v1/bin/app"),
        ];
        assert_eq!(validate(&basedir, &entries).unwrap().len(), 5);
    }

    #[test]
    fn test_depth_limit() {
        let (_temp, basedir) = create_test_basedir();
        let config = ExtractionConfig {
            max_path_depth: 3,
            ..Default::default()
        };
        let preflight = Preflight::new(&basedir, &config);

        assert!(preflight.validate(&[file("a/b/c")]).is_ok());
        let result = preflight.validate(&[file("a/b/c/d")]);
        assert!(matches!(
            result,
            Err(ArchiveError::PathTooDeep { depth: 4, max: 3, .. })
        ));
    }

    #[test]
    fn test_missing_symlink_target_is_invalid() {
        let (_temp, basedir) = create_test_basedir();
        let mut link = symlink("link", "");
        link.link_target = None;
        let result = validate(&basedir, &[link]);
        assert!(matches!(
            result,
            Err(ArchiveError::InvalidSymlinkTarget { .. })
        ));
    }
}
