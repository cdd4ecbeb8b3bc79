//! Path, character, and symlink rules applied to untrusted records.
//!
//! Everything here is lexical: checks never follow symlinks or canonicalize
//! paths, except for `symlink_metadata` probes of what is already on disk.

pub mod chars;
pub mod path;
pub mod preflight;
pub mod symlink;

pub use chars::has_disallowed_chars;
pub use path::is_within;
pub use path::lexical_clean;
pub use path::resolve_entry_path;
pub use preflight::Preflight;
pub use preflight::ValidatedEntry;
pub use symlink::resolve_link_target;
