//! Record and destination types.
//!
//! `RecordPath` is the only way the packer produces a path for the wire;
//! `Entry` is the unvalidated header view the extractor reads back;
//! `Basedir` is the validated extraction root.

pub mod basedir;
pub mod entry;
pub mod record_path;
pub mod record_type;

pub use basedir::Basedir;
pub use entry::Entry;
pub use record_path::RecordPath;
pub use record_type::RecordType;
