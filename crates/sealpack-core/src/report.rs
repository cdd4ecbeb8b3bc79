//! Operation reports and progress callbacks.

use std::path::Path;
use std::time::Duration;

/// Report of a packing operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackReport {
    /// Number of regular-file records written.
    pub files_added: usize,

    /// Number of directory records written.
    pub directories_added: usize,

    /// Number of symlink records written.
    pub symlinks_added: usize,

    /// Total payload bytes written (headers excluded).
    pub bytes_written: u64,
}

impl PackReport {
    /// Returns the total number of records written.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.files_added + self.directories_added + self.symlinks_added
    }
}

/// Report of an extraction operation.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Number of regular files created.
    pub files_extracted: usize,

    /// Number of directory records materialized.
    pub directories_created: usize,

    /// Number of symlinks created.
    pub symlinks_created: usize,

    /// Total payload bytes written to disk.
    pub bytes_written: u64,

    /// Wall-clock duration of both passes.
    pub duration: Duration,
}

impl ExtractionReport {
    /// Creates a new empty extraction report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns total number of items materialized.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted + self.directories_created + self.symlinks_created
    }
}

/// Callback trait for progress reporting while packing or extracting.
///
/// # Examples
///
/// ```
/// use sealpack_core::ProgressCallback;
/// use std::path::Path;
///
/// struct Printer;
///
/// impl ProgressCallback for Printer {
///     fn on_entry_start(&mut self, path: &Path, current: usize, total: Option<usize>) {
///         match total {
///             Some(total) => println!("[{current}/{total}] {}", path.display()),
///             None => println!("[{current}] {}", path.display()),
///         }
///     }
///
///     fn on_bytes_written(&mut self, _bytes: u64) {}
///
///     fn on_entry_complete(&mut self, _path: &Path) {}
///
///     fn on_complete(&mut self) {}
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called before an entry is processed.
    ///
    /// `current` is 1-indexed. `total` is known during extraction (after
    /// preflight) and unknown while packing, since the walk streams.
    fn on_entry_start(&mut self, path: &Path, current: usize, total: Option<usize>);

    /// Called after payload bytes have been copied.
    fn on_bytes_written(&mut self, bytes: u64);

    /// Called when an entry has been completely processed.
    fn on_entry_complete(&mut self, path: &Path);

    /// Called once when the whole operation succeeds.
    fn on_complete(&mut self);
}

/// No-op implementation of `ProgressCallback`.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry_start(&mut self, _path: &Path, _current: usize, _total: Option<usize>) {}

    fn on_bytes_written(&mut self, _bytes: u64) {}

    fn on_entry_complete(&mut self, _path: &Path) {}

    fn on_complete(&mut self) {}
}
