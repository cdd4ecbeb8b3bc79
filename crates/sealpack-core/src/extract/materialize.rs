//! Filesystem writes for validated entries.
//!
//! These functions assume preflight has already approved the destination;
//! they only apply the extraction permission policy.

use std::fs::DirBuilder;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use tracing::trace;

use crate::Result;
use crate::error::IoResultExt;

/// Mode for every directory the extractor creates.
pub const DIR_MODE: u32 = 0o700;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Returns the mode for an extracted regular file: owner read/write, plus
/// owner execute when the stored mode had it. Group, other, and special bits
/// are never carried over.
///
/// # Examples
///
/// ```
/// use sealpack_core::extract::materialize::file_mode;
///
/// assert_eq!(file_mode(0o644), 0o600);
/// assert_eq!(file_mode(0o755), 0o700);
/// assert_eq!(file_mode(0o4777), 0o700);
/// assert_eq!(file_mode(0o011), 0o600);
/// ```
#[must_use]
pub const fn file_mode(stored: u32) -> u32 {
    if stored & 0o100 == 0 { 0o600 } else { 0o700 }
}

/// Creates `path` and any missing parents with mode `0700`.
///
/// # Errors
///
/// Returns `Io` tagged with `path` if creation fails.
pub fn create_directory(path: &Path) -> Result<()> {
    dir_builder().create(path).with_path(path)
}

/// Creates a regular file and copies `reader` into it.
///
/// Missing parent directories are created with mode `0700`. The file is
/// opened with create-new semantics, so an existing file or symlink at
/// `path` is never followed or truncated.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns `Io` tagged with `path` (or the parent directory) if any
/// filesystem operation fails.
pub fn create_regular<R: Read>(reader: &mut R, path: &Path, stored_mode: u32) -> Result<u64> {
    create_parent(path)?;

    let mode = file_mode(stored_mode);
    trace!(
        path = %path.display(),
        stored = format_args!("{stored_mode:o}"),
        mode = format_args!("{mode:o}"),
        "regular file mode"
    );

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }

    let file = options.open(path).with_path(path)?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let written = std::io::copy(reader, &mut writer).with_path(path)?;
    writer.flush().with_path(path)?;

    Ok(written)
}

/// Creates a symlink at `path` pointing to the raw `target`.
///
/// Missing parent directories are created with mode `0700`.
///
/// # Errors
///
/// Returns `Io` tagged with `path` if the link cannot be created, including
/// on platforms without symlink support.
pub fn create_symlink(target: &str, path: &Path) -> Result<()> {
    create_parent(path)?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, path).with_path(path)
    }
    #[cfg(not(unix))]
    {
        let _ = target;
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "symlinks are not supported on this platform",
        ))
        .with_path(path)
    }
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => dir_builder().create(parent).with_path(parent),
        None => Ok(()),
    }
}

fn dir_builder() -> DirBuilder {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder
}
