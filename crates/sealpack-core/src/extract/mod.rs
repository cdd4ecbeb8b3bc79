//! Validating extraction of record streams.

pub mod extractor;
pub mod materialize;

pub use extractor::Extractor;
