//! Two-pass extraction over a rewindable record stream.

use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::time::Instant;

use tracing::debug;
use tracing::info;

use crate::ArchiveError;
use crate::ExtractionConfig;
use crate::ExtractionReport;
use crate::NoopProgress;
use crate::ProgressCallback;
use crate::Result;
use crate::extract::materialize::create_directory;
use crate::extract::materialize::create_regular;
use crate::extract::materialize::create_symlink;
use crate::security::Preflight;
use crate::types::Basedir;
use crate::types::Entry;
use crate::types::RecordType;

/// Reads, validates, and materializes a record stream.
///
/// Extraction makes two passes over the stream. The first parses every
/// header and validates the whole archive against the destination; the
/// second rewinds and writes. A hostile record anywhere in the archive is
/// therefore reported before the filesystem is touched.
///
/// The stream is rewound to the position it had when the extractor was
/// created after every [`list`](Self::list) and
/// [`extract_all`](Self::extract_all), so calls can be repeated.
///
/// # Examples
///
/// ```no_run
/// use sealpack_core::Extractor;
/// use std::fs::File;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut extractor = Extractor::new(File::open("tree.tar")?)?;
///
/// for entry in extractor.list()? {
///     println!("{} {}", entry.mode_string(), entry.path);
/// }
///
/// let report = extractor.extract_all("/tmp/restore")?;
/// println!("{} items in {:?}", report.total_items(), report.duration);
/// # Ok(())
/// # }
/// ```
pub struct Extractor<R> {
    reader: R,
    start: u64,
    config: ExtractionConfig,
}

impl<R: Read + Seek> Extractor<R> {
    /// Creates an extractor with default limits.
    ///
    /// # Errors
    ///
    /// Returns `Stream` if the current stream position cannot be read.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_config(reader, ExtractionConfig::default())
    }

    /// Creates an extractor with custom limits.
    ///
    /// # Errors
    ///
    /// Returns `Stream` if the current stream position cannot be read.
    pub fn with_config(mut reader: R, config: ExtractionConfig) -> Result<Self> {
        let start = reader.stream_position()?;
        Ok(Self {
            reader,
            start,
            config,
        })
    }

    /// Parses every header without extracting anything.
    ///
    /// Unsupported record types are listed rather than rejected. Repeated
    /// calls return the same entries, and a later
    /// [`extract_all`](Self::extract_all) behaves as if this had not been
    /// called.
    ///
    /// # Errors
    ///
    /// - `InvalidArchive` for a malformed header
    /// - `InvalidCharacters` / `InvalidSymlinkCharacters` for names that are
    ///   not UTF-8
    /// - `TooManyEntries` if the archive exceeds the configured count
    /// - `Stream` if the stream cannot be rewound
    pub fn list(&mut self) -> Result<Vec<Entry>> {
        self.scan()
    }

    /// Validates the whole archive against `basedir`, then extracts it.
    ///
    /// `basedir` must be an existing directory. Nothing is created unless
    /// every record passes validation. Errors raised after validation (disk
    /// full, permission denied) can leave a partial tree.
    ///
    /// # Errors
    ///
    /// - any error from [`list`](Self::list)
    /// - any error from [`Preflight::validate`]
    /// - `InvalidArchive` if the stream differs from what was validated
    /// - `Io` if a filesystem write fails
    pub fn extract_all(&mut self, basedir: impl AsRef<Path>) -> Result<ExtractionReport> {
        self.extract_all_with_progress(basedir, &mut NoopProgress)
    }

    /// Like [`extract_all`](Self::extract_all), reporting progress per
    /// record.
    ///
    /// # Errors
    ///
    /// Same as [`extract_all`](Self::extract_all).
    pub fn extract_all_with_progress(
        &mut self,
        basedir: impl AsRef<Path>,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ExtractionReport> {
        let started = Instant::now();
        let basedir = Basedir::new(basedir.as_ref())?;

        let entries = self.scan()?;
        let validated = Preflight::new(&basedir, &self.config).validate(&entries)?;

        debug!(entries = entries.len(), "materializing");
        let mut report = ExtractionReport::new();
        let total = entries.len();
        {
            let mut archive = tar::Archive::new(&mut self.reader);
            let mut records = archive.entries().map_err(invalid_header)?;

            for (index, (expected, target)) in entries.iter().zip(&validated).enumerate() {
                let mut record = records
                    .next()
                    .ok_or_else(|| {
                        ArchiveError::InvalidArchive(format!(
                            "stream ended at record {index} of {total}"
                        ))
                    })?
                    .map_err(invalid_header)?;

                let actual = Entry::from_tar(&record)?;
                if actual != *expected {
                    return Err(ArchiveError::InvalidArchive(format!(
                        "record {index} ('{}') changed since validation",
                        expected.path
                    )));
                }

                let dst = target.dst.as_path();
                progress.on_entry_start(dst, index + 1, Some(total));

                match actual.record_type {
                    RecordType::Directory => {
                        create_directory(dst)?;
                        report.directories_created += 1;
                    }
                    RecordType::Regular => {
                        let written = create_regular(&mut record, dst, actual.mode)?;
                        progress.on_bytes_written(written);
                        report.files_extracted += 1;
                        report.bytes_written += written;
                    }
                    RecordType::Symlink => {
                        create_symlink(actual.link_target.as_deref().unwrap_or_default(), dst)?;
                        report.symlinks_created += 1;
                    }
                    RecordType::Other(_) => {
                        return Err(ArchiveError::UnsupportedEntryType {
                            path: target.dst.clone(),
                        });
                    }
                }

                info!("extracting '{}' ({})", actual.path, actual.record_type);
                progress.on_entry_complete(dst);
            }

            if records.next().is_some() {
                return Err(ArchiveError::InvalidArchive(format!(
                    "stream has more than the {total} records validated"
                )));
            }
        }

        self.rewind()?;
        report.duration = started.elapsed();
        progress.on_complete();
        Ok(report)
    }

    /// Consumes the extractor and returns the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn rewind(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(self.start))?;
        debug!(position = self.start, "stream rewound");
        Ok(())
    }

    /// Reads every header from the start of the stream and rewinds.
    fn scan(&mut self) -> Result<Vec<Entry>> {
        self.rewind()?;
        debug!("scanning record headers");

        let max = self.config.max_entry_count;
        let mut entries = Vec::new();
        {
            let mut archive = tar::Archive::new(&mut self.reader);
            for record in archive.entries().map_err(invalid_header)? {
                let record = record.map_err(invalid_header)?;
                if entries.len() >= max {
                    return Err(ArchiveError::TooManyEntries { max });
                }
                entries.push(Entry::from_tar(&record)?);
            }
        }

        self.rewind()?;
        debug!(entries = entries.len(), "scan complete");
        Ok(entries)
    }
}

fn invalid_header(err: std::io::Error) -> ArchiveError {
    ArchiveError::InvalidArchive(format!("failed to read record header: {err}"))
}
