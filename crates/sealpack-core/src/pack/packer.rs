//! Record stream writer.

use std::fs::File;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use tar::Builder;
use tar::Header;
use tracing::debug;
use tracing::info;

use crate::ArchiveError;
use crate::NoopProgress;
use crate::PackReport;
use crate::ProgressCallback;
use crate::Result;
use crate::error::IoResultExt;
use crate::pack::walker::SourceEntry;
use crate::pack::walker::SourceWalker;
use crate::types::RecordPath;
use crate::types::RecordType;

/// Progress is reported after this many payload bytes.
const PROGRESS_BATCH_BYTES: u64 = 1024 * 1024;

/// Writes file trees to a record stream.
///
/// Each root passed to [`add_all`](Self::add_all) is walked depth-first,
/// pre-order, and every regular file, directory, and symlink becomes one
/// record. The first error aborts the call; whatever was already written
/// stays in the stream and is the caller's to discard.
///
/// # Examples
///
/// ```no_run
/// use sealpack_core::Packer;
/// use std::fs::File;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut packer = Packer::new(File::create("tree.tar")?);
/// let report = packer.add_all(&["project", "/etc/hosts"])?;
/// packer.finish()?;
/// println!("{} records", report.total_records());
/// # Ok(())
/// # }
/// ```
pub struct Packer<W: Write> {
    builder: Builder<W>,
}

impl<W: Write> Packer<W> {
    /// Creates a packer writing to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            builder: Builder::new(writer),
        }
    }

    /// Packs every root, in order.
    ///
    /// # Errors
    ///
    /// - `Io` if a root or anything under it cannot be read
    /// - `UnsupportedEntryType` for a socket, fifo, or device node; no
    ///   record is written for it
    /// - `InvalidLocation` / `InvalidCharacters` /
    ///   `InvalidSymlinkCharacters` for names that cannot be recorded
    /// - `Stream` if writing to the output fails
    pub fn add_all<P: AsRef<Path>>(&mut self, roots: &[P]) -> Result<PackReport> {
        self.add_all_with_progress(roots, &mut NoopProgress)
    }

    /// Packs every root, reporting progress per record.
    ///
    /// `on_entry_start` receives a running count and no total: the tree is
    /// streamed rather than walked twice.
    ///
    /// # Errors
    ///
    /// Same as [`add_all`](Self::add_all).
    pub fn add_all_with_progress<P: AsRef<Path>>(
        &mut self,
        roots: &[P],
        progress: &mut dyn ProgressCallback,
    ) -> Result<PackReport> {
        let mut report = PackReport::default();

        for root in roots {
            let root = root.as_ref();
            debug!(root = %root.display(), "packing root");

            for entry in SourceWalker::new(root).walk() {
                let entry = entry?;
                let Some(record_path) = entry.record_path.clone() else {
                    continue;
                };

                progress.on_entry_start(
                    record_path.as_path(),
                    report.total_records() + 1,
                    None,
                );
                self.append_entry(&entry, &record_path, &mut report, progress)?;
                progress.on_entry_complete(record_path.as_path());
            }
        }

        progress.on_complete();
        Ok(report)
    }

    /// Writes the end-of-archive marker and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns `Stream` if the trailer cannot be written.
    pub fn finish(self) -> Result<W> {
        let mut writer = self.builder.into_inner()?;
        writer.flush()?;
        Ok(writer)
    }

    fn append_entry(
        &mut self,
        entry: &SourceEntry,
        record_path: &RecordPath,
        report: &mut PackReport,
        progress: &mut dyn ProgressCallback,
    ) -> Result<()> {
        let mut header = new_header(entry.record_type, entry.mode);

        match entry.record_type {
            RecordType::Regular => {
                let file = File::open(&entry.path).with_path(&entry.path)?;
                let size = file.metadata().with_path(&entry.path)?.len();
                header.set_size(size);

                let mut payload = ExactReader::new(file, size, progress);
                self.builder
                    .append_data(&mut header, record_path.as_path(), &mut payload)
                    .with_path(&entry.path)?;

                report.files_added += 1;
                report.bytes_written += size;
            }
            RecordType::Directory => {
                self.builder
                    .append_data(&mut header, record_path.as_path(), std::io::empty())?;
                report.directories_added += 1;
            }
            RecordType::Symlink => {
                let target = entry.link_target.as_deref().unwrap_or_default();
                self.append_symlink(&mut header, record_path, target)?;
                report.symlinks_added += 1;
            }
            RecordType::Other(_) => {
                return Err(ArchiveError::UnsupportedEntryType {
                    path: entry.path.clone(),
                });
            }
        }

        info!("adding '{}' ({})", record_path, entry.record_type);
        Ok(())
    }

    /// Writes a symlink record whose link name is the target's exact bytes.
    ///
    /// `append_link` cleans short targets component by component, dropping
    /// `.` segments, repeated separators, and a trailing separator. Targets
    /// that fit the header field are copied in directly; longer ones go
    /// through the GNU long-link record, which is written verbatim.
    fn append_symlink(
        &mut self,
        header: &mut Header,
        record_path: &RecordPath,
        target: &str,
    ) -> Result<()> {
        let linkname = &mut header.as_old_mut().linkname;
        if target.len() <= linkname.len() {
            linkname[..target.len()].copy_from_slice(target.as_bytes());
            self.builder
                .append_data(header, record_path.as_path(), std::io::empty())?;
        } else {
            self.builder
                .append_link(header, record_path.as_path(), target)?;
        }
        Ok(())
    }
}

/// Builds a GNU header with ownership and timestamps zeroed.
fn new_header(record_type: RecordType, mode: u32) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(record_type.to_tar());
    header.set_mode(mode & 0o777);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_size(0);
    header
}

/// Yields exactly `expected` bytes of a file, or fails.
///
/// A file that shrinks after its size was recorded would otherwise leave the
/// header claiming more payload than follows it. Growth is cut off at the
/// recorded size.
struct ExactReader<'a, R> {
    inner: std::io::Take<R>,
    progress: &'a mut dyn ProgressCallback,
    bytes_since_last_update: u64,
}

impl<'a, R: Read> ExactReader<'a, R> {
    fn new(inner: R, expected: u64, progress: &'a mut dyn ProgressCallback) -> Self {
        Self {
            inner: inner.take(expected),
            progress,
            bytes_since_last_update: 0,
        }
    }

    fn flush_progress(&mut self) {
        if self.bytes_since_last_update > 0 {
            self.progress.on_bytes_written(self.bytes_since_last_update);
            self.bytes_since_last_update = 0;
        }
    }
}

impl<R: Read> Read for ExactReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let bytes_read = self.inner.read(buf)?;
        if bytes_read == 0 && !buf.is_empty() && self.inner.limit() > 0 {
            return Err(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "file shrank while being packed",
            ));
        }

        self.bytes_since_last_update += bytes_read as u64;
        if self.bytes_since_last_update >= PROGRESS_BATCH_BYTES {
            self.flush_progress();
        }
        Ok(bytes_read)
    }
}

impl<R> Drop for ExactReader<'_, R> {
    fn drop(&mut self) {
        if self.bytes_since_last_update > 0 {
            self.progress.on_bytes_written(self.bytes_since_last_update);
        }
    }
}
