//! Source tree walking.
//!
//! Produces one [`SourceEntry`] per filesystem object, depth-first and
//! pre-order, with siblings sorted by file name so the same tree always
//! yields the same record sequence.

use std::fs::Metadata;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::ArchiveError;
use crate::Result;
use crate::error::IoResultExt;
use crate::security::chars::has_disallowed_chars;
use crate::types::RecordPath;
use crate::types::RecordType;

/// One filesystem object found under a root, ready to become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Path on the local filesystem.
    pub path: PathBuf,

    /// Normalized wire path. `None` when the path normalizes to nothing
    /// (a root of `.` or `/`); such an entry is walked but not recorded.
    pub record_path: Option<RecordPath>,

    /// Regular, directory, or symlink.
    pub record_type: RecordType,

    /// Permission bits (`0o777` mask).
    pub mode: u32,

    /// Raw symlink target as a wire string, `/`-separated.
    pub link_target: Option<String>,
}

/// Walks a single root without following symlinks.
///
/// # Examples
///
/// ```no_run
/// use sealpack_core::pack::walker::SourceWalker;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// for entry in SourceWalker::new(Path::new("./project")).walk() {
///     let entry = entry?;
///     println!("{} ({})", entry.path.display(), entry.record_type);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SourceWalker<'a> {
    root: &'a Path,
}

impl<'a> SourceWalker<'a> {
    /// Creates a walker for `root`.
    #[must_use]
    pub const fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Returns an iterator over the entries under the root, the root first.
    ///
    /// A root that is itself a symlink yields a single symlink entry.
    ///
    /// # Errors
    ///
    /// Each item fails with:
    /// - `Io` if the entry cannot be stat'ed or its link read
    /// - `UnsupportedEntryType` for sockets, fifos, and device nodes
    /// - `InvalidLocation` / `InvalidCharacters` if the path cannot be
    ///   represented as a record path
    /// - `InvalidSymlinkCharacters` if a link target is not UTF-8 or
    ///   contains disallowed characters
    pub fn walk(&self) -> impl Iterator<Item = Result<SourceEntry>> + '_ {
        WalkDir::new(self.root)
            .follow_links(false)
            .follow_root_links(false)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| build_source_entry(&entry?))
    }
}

fn build_source_entry(entry: &walkdir::DirEntry) -> Result<SourceEntry> {
    let path = entry.path().to_path_buf();
    let metadata = entry.metadata()?;
    let file_type = metadata.file_type();

    let record_type = if file_type.is_symlink() {
        RecordType::Symlink
    } else if file_type.is_dir() {
        RecordType::Directory
    } else if file_type.is_file() {
        RecordType::Regular
    } else {
        return Err(ArchiveError::UnsupportedEntryType { path });
    };

    let link_target = if record_type == RecordType::Symlink {
        Some(read_link_target(&path)?)
    } else {
        None
    };

    Ok(SourceEntry {
        record_path: RecordPath::from_host_path(&path)?,
        mode: permission_bits(&metadata),
        path,
        record_type,
        link_target,
    })
}

fn read_link_target(path: &Path) -> Result<String> {
    let target = std::fs::read_link(path).with_path(path)?;
    let Some(raw) = target.to_str() else {
        return Err(ArchiveError::InvalidSymlinkCharacters {
            path: path.to_path_buf(),
            target,
        });
    };

    if has_disallowed_chars(raw) {
        return Err(ArchiveError::InvalidSymlinkCharacters {
            path: path.to_path_buf(),
            target,
        });
    }

    #[cfg(windows)]
    {
        Ok(raw.replace('\\', "/"))
    }
    #[cfg(not(windows))]
    {
        Ok(raw.to_string())
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    if metadata.is_dir() {
        0o755
    } else if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
