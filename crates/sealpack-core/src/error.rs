//! Error types for packing and extraction.

use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur while packing or extracting a record stream.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Filesystem operation failed on a specific path.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// The path the operation was performed on.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the record stream itself failed.
    #[error("stream I/O error: {0}")]
    Stream(#[from] std::io::Error),

    /// A record header is malformed or the stream changed between passes.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Entry is not a regular file, directory, or symlink.
    #[error("{}: unsupported file type", .path.display())]
    UnsupportedEntryType {
        /// Path of the offending entry.
        path: PathBuf,
    },

    /// Entry path would land outside the destination directory.
    #[error("{}: invalid location", .path.display())]
    InvalidLocation {
        /// The offending path.
        path: PathBuf,
    },

    /// Entry path contains control or invisible formatting characters.
    #[error("{}: invalid characters", .path.display())]
    InvalidCharacters {
        /// The offending path, lossily rendered.
        path: PathBuf,
    },

    /// Destination path collides with an existing filesystem entry or with
    /// another record in the same archive.
    #[error("{} already exists", .path.display())]
    AlreadyExists {
        /// The colliding path.
        path: PathBuf,
    },

    /// Symlink target is an absolute path.
    #[error("{}: absolute symlink target {}", .path.display(), .target.display())]
    AbsoluteSymlinkTarget {
        /// The symlink path.
        path: PathBuf,
        /// The raw target stored in the record.
        target: PathBuf,
    },

    /// Symlink target resolves outside the destination directory.
    #[error("{}: invalid symlink target {}", .path.display(), .target.display())]
    InvalidSymlinkTarget {
        /// The symlink path.
        path: PathBuf,
        /// The raw target stored in the record.
        target: PathBuf,
    },

    /// Symlink target contains control or invisible formatting characters.
    #[error("{}: invalid symlink characters", .path.display())]
    InvalidSymlinkCharacters {
        /// The symlink path.
        path: PathBuf,
        /// The raw target, lossily rendered.
        target: PathBuf,
    },

    /// The archive holds more entries than the extractor will index.
    #[error("archive exceeds {max} entries")]
    TooManyEntries {
        /// Configured maximum.
        max: usize,
    },

    /// An entry path has more components than allowed.
    #[error("{}: path depth {depth} exceeds maximum {max}", .path.display())]
    PathTooDeep {
        /// The offending path.
        path: PathBuf,
        /// Number of components.
        depth: usize,
        /// Configured maximum.
        max: usize,
    },
}

impl ArchiveError {
    /// Returns `true` if this error was raised by preflight validation of a
    /// hostile or malformed record rather than by the filesystem.
    ///
    /// # Examples
    ///
    /// ```
    /// use sealpack_core::ArchiveError;
    /// use std::path::PathBuf;
    ///
    /// let err = ArchiveError::InvalidLocation {
    ///     path: PathBuf::from("../etc/passwd"),
    /// };
    /// assert!(err.is_security_violation());
    ///
    /// let err = ArchiveError::InvalidArchive("truncated header".into());
    /// assert!(!err.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidLocation { .. }
                | Self::InvalidCharacters { .. }
                | Self::AlreadyExists { .. }
                | Self::AbsoluteSymlinkTarget { .. }
                | Self::InvalidSymlinkTarget { .. }
                | Self::InvalidSymlinkCharacters { .. }
                | Self::TooManyEntries { .. }
                | Self::PathTooDeep { .. }
        )
    }

    /// Returns the path this error is about, if it carries one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. }
            | Self::UnsupportedEntryType { path }
            | Self::InvalidLocation { path }
            | Self::InvalidCharacters { path }
            | Self::AlreadyExists { path }
            | Self::AbsoluteSymlinkTarget { path, .. }
            | Self::InvalidSymlinkTarget { path, .. }
            | Self::InvalidSymlinkCharacters { path, .. }
            | Self::PathTooDeep { path, .. } => Some(path),
            Self::Stream(_) | Self::InvalidArchive(_) | Self::TooManyEntries { .. } => None,
        }
    }
}

impl From<walkdir::Error> for ArchiveError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        Self::Io {
            path,
            source: err.into(),
        }
    }
}

/// Tags `std::io::Result` values with the path that produced them.
pub(crate) trait IoResultExt<T> {
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
