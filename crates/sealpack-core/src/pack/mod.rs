//! Packing file trees into a record stream.

pub mod packer;
pub mod walker;

pub use packer::Packer;
pub use walker::SourceEntry;
pub use walker::SourceWalker;
