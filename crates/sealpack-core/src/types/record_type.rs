//! Record type tag.

use std::fmt;

/// Type tag carried by every record header.
///
/// Only `Regular`, `Directory`, and `Symlink` can be packed or extracted.
/// Any other tag read from a stream is kept as `Other` so that listings can
/// show it; preflight validation rejects it.
///
/// # Examples
///
/// ```
/// use sealpack_core::RecordType;
///
/// assert!(RecordType::Regular.is_supported());
/// assert!(!RecordType::Other(b'6').is_supported());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// Regular file; the header is followed by `size` payload bytes.
    Regular,

    /// Directory; no payload.
    Directory,

    /// Symbolic link; the header carries the raw target, no payload.
    Symlink,

    /// Any other type flag (device, fifo, hardlink, ...).
    Other(u8),
}

impl RecordType {
    /// Maps a tar type flag to a record type.
    #[must_use]
    pub fn from_tar(entry_type: tar::EntryType) -> Self {
        match entry_type {
            tar::EntryType::Regular => Self::Regular,
            tar::EntryType::Directory => Self::Directory,
            tar::EntryType::Symlink => Self::Symlink,
            other => Self::Other(other.as_byte()),
        }
    }

    /// Returns the tar type flag written for this record type.
    #[must_use]
    pub fn to_tar(self) -> tar::EntryType {
        match self {
            Self::Regular => tar::EntryType::Regular,
            Self::Directory => tar::EntryType::Directory,
            Self::Symlink => tar::EntryType::Symlink,
            Self::Other(byte) => tar::EntryType::new(byte),
        }
    }

    /// Returns `true` for the three types the extractor materializes.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Returns the leading character of an `ls`-style mode string.
    #[must_use]
    pub const fn type_char(self) -> char {
        match self {
            Self::Regular => '-',
            Self::Directory => 'd',
            Self::Symlink => 'l',
            Self::Other(b'3') => 'c',
            Self::Other(b'4') => 'b',
            Self::Other(b'6') => 'p',
            Self::Other(_) => '?',
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => f.write_str("regular"),
            Self::Directory => f.write_str("directory"),
            Self::Symlink => f.write_str("symlink"),
            Self::Other(byte) => write!(f, "type flag {:?}", char::from(*byte)),
        }
    }
}
