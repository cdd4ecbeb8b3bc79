//! Wire-format record paths.

use std::fmt;
use std::path::Component;
use std::path::Path;

use crate::ArchiveError;
use crate::Result;
use crate::security::chars::has_disallowed_chars;

/// A normalized, slash-separated, relative path as written to the stream.
///
/// Built from a host path by dropping any root, `.` segments, and repeated
/// separators, resolving inner `..` segments lexically, and joining the
/// remaining components with `/`. A path that would still begin with `..`
/// cannot be represented and is rejected.
///
/// # Examples
///
/// ```
/// use sealpack_core::RecordPath;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let record = RecordPath::from_host_path(Path::new("/srv//data/./a.txt"))?;
/// assert_eq!(record.map(|p| p.to_string()), Some("srv/data/a.txt".to_string()));
///
/// // A bare root or `.` has nothing left to record.
/// assert!(RecordPath::from_host_path(Path::new("."))?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordPath(String);

impl RecordPath {
    /// Normalizes a host path into a record path.
    ///
    /// Returns `Ok(None)` when nothing remains after normalization (for
    /// example `.` or `/`).
    ///
    /// # Errors
    ///
    /// - `InvalidLocation` if the path keeps a leading `..` or carries a
    ///   drive or UNC prefix
    /// - `InvalidCharacters` if a component is not UTF-8 or contains
    ///   control or invisible formatting characters
    pub fn from_host_path(path: &Path) -> Result<Option<Self>> {
        let mut parts: Vec<&str> = Vec::new();
        let mut rooted = false;

        for component in path.components() {
            match component {
                Component::Prefix(_) => {
                    return Err(ArchiveError::InvalidLocation {
                        path: path.to_path_buf(),
                    });
                }
                Component::RootDir => rooted = true,
                Component::CurDir => {}
                Component::ParentDir => {
                    if parts.pop().is_none() && !rooted {
                        return Err(ArchiveError::InvalidLocation {
                            path: path.to_path_buf(),
                        });
                    }
                }
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| ArchiveError::InvalidCharacters {
                        path: path.to_path_buf(),
                    })?;
                    parts.push(part);
                }
            }
        }

        if parts.is_empty() {
            return Ok(None);
        }

        let joined = parts.join("/");
        if has_disallowed_chars(&joined) {
            return Err(ArchiveError::InvalidCharacters {
                path: path.to_path_buf(),
            });
        }

        Ok(Some(Self(joined)))
    }

    /// Returns the path as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path as a `&Path` for the tar header writer.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
