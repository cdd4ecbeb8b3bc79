//! File-path convenience functions over [`Packer`] and [`Extractor`].

use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use crate::Entry;
use crate::ExtractionConfig;
use crate::ExtractionReport;
use crate::PackReport;
use crate::Result;
use crate::error::IoResultExt;
use crate::extract::Extractor;
use crate::pack::Packer;

/// Packs `roots` into `writer` and returns the writer with the report.
///
/// The end-of-archive marker is written before returning.
///
/// # Errors
///
/// Any error from [`Packer::add_all`] or [`Packer::finish`].
///
/// # Examples
///
/// ```no_run
/// use sealpack_core::pack_paths;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (bytes, report) = pack_paths(Vec::new(), &["src", "Cargo.toml"])?;
/// println!("{} records, {} bytes", report.total_records(), bytes.len());
/// # Ok(())
/// # }
/// ```
pub fn pack_paths<W: Write, P: AsRef<Path>>(writer: W, roots: &[P]) -> Result<(W, PackReport)> {
    let mut packer = Packer::new(writer);
    let report = packer.add_all(roots)?;
    let writer = packer.finish()?;
    Ok((writer, report))
}

/// Packs `roots` into a new file at `output`.
///
/// # Errors
///
/// Returns `Io` if `output` cannot be created, or any error from
/// [`pack_paths`].
///
/// # Examples
///
/// ```no_run
/// use sealpack_core::pack_to_file;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = pack_to_file("backup.tar", &["/srv/data"])?;
/// println!("Added {} files", report.files_added);
/// # Ok(())
/// # }
/// ```
pub fn pack_to_file<P: AsRef<Path>, Q: AsRef<Path>>(output: P, roots: &[Q]) -> Result<PackReport> {
    let output = output.as_ref();
    let file = File::create(output).with_path(output)?;
    let (writer, report) = pack_paths(BufWriter::new(file), roots)?;
    writer
        .into_inner()
        .map_err(std::io::IntoInnerError::into_error)
        .and_then(|file| file.sync_all())
        .with_path(output)?;
    Ok(report)
}

/// Lists the records of the archive at `archive_path`.
///
/// # Errors
///
/// Returns `Io` if the file cannot be opened, or any error from
/// [`Extractor::list`].
///
/// # Examples
///
/// ```no_run
/// use sealpack_core::list_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// for entry in list_archive("backup.tar")? {
///     println!("{} {}", entry.mode_string(), entry.path);
/// }
/// # Ok(())
/// # }
/// ```
pub fn list_archive<P: AsRef<Path>>(archive_path: P) -> Result<Vec<Entry>> {
    let archive_path = archive_path.as_ref();
    let file = File::open(archive_path).with_path(archive_path)?;
    Extractor::new(BufReader::new(file))?.list()
}

/// Extracts the archive at `archive_path` into the existing directory
/// `basedir`.
///
/// # Errors
///
/// Returns `Io` if the file cannot be opened, or any error from
/// [`Extractor::extract_all`].
///
/// # Examples
///
/// ```no_run
/// use sealpack_core::ExtractionConfig;
/// use sealpack_core::extract_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::default();
/// let report = extract_archive("backup.tar", "/tmp/restore", &config)?;
/// println!("Extracted {} files", report.files_extracted);
/// # Ok(())
/// # }
/// ```
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    archive_path: P,
    basedir: Q,
    config: &ExtractionConfig,
) -> Result<ExtractionReport> {
    let archive_path = archive_path.as_ref();
    let file = File::open(archive_path).with_path(archive_path)?;
    Extractor::with_config(BufReader::new(file), *config)?.extract_all(basedir)
}
