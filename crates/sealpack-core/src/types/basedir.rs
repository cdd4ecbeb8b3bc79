//! Validated extraction root.

use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;
use crate::error::IoResultExt;
use crate::security::path::lexical_clean;

/// The destination directory every extracted path must stay inside.
///
/// The stored path is cleaned lexically but deliberately not canonicalized:
/// containment is decided by comparing path components, the same way for
/// `"."`, relative, and absolute roots, without touching the filesystem.
///
/// # Examples
///
/// ```no_run
/// use sealpack_core::Basedir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let basedir = Basedir::new("/tmp/restore/./")?;
/// assert_eq!(basedir.as_path(), std::path::Path::new("/tmp/restore"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basedir(PathBuf);

impl Basedir {
    /// Validates that `path` is an existing directory and cleans it.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Io` tagged with `path` if it does not exist or
    /// is not a directory.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path).with_path(&path)?;
        if !metadata.is_dir() {
            return Err(ArchiveError::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    "extraction root is not a directory",
                ),
                path,
            });
        }
        Ok(Self(lexical_clean(&path)))
    }

    /// Returns the cleaned root path.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}
