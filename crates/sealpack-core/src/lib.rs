//! Packer and preflight-validating extractor for file-tree transfer archives.
//!
//! `sealpack-core` serializes local file trees (regular files, directories,
//! and symlinks) into a single ordered record stream, and reconstructs
//! trees from untrusted streams. Extraction validates every record against
//! the destination directory before creating anything, rejecting path
//! traversal, absolute paths, escaping symlinks, and collisions with
//! existing files.
//!
//! The stream is plain (GNU) tar. It is not compressed, authenticated, or
//! encrypted here; wrap it before it leaves the machine.
//!
//! # Examples
//!
//! ```no_run
//! use sealpack_core::Extractor;
//! use sealpack_core::Packer;
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut packer = Packer::new(Vec::new());
//! packer.add_all(&["/srv/site"])?;
//! let bytes = packer.finish()?;
//!
//! let mut extractor = Extractor::new(Cursor::new(bytes))?;
//! let report = extractor.extract_all("/tmp/restore")?;
//! println!("Extracted {} files", report.files_extracted);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod pack;
pub mod report;
pub mod security;
pub mod test_utils;
pub mod types;

pub use api::extract_archive;
pub use api::list_archive;
pub use api::pack_paths;
pub use api::pack_to_file;
pub use config::ExtractionConfig;
pub use error::ArchiveError;
pub use error::Result;
pub use extract::Extractor;
pub use pack::Packer;
pub use report::ExtractionReport;
pub use report::NoopProgress;
pub use report::PackReport;
pub use report::ProgressCallback;
pub use types::Basedir;
pub use types::Entry;
pub use types::RecordPath;
pub use types::RecordType;
