//! Extraction limits.

/// Limits applied while indexing an archive before extraction.
///
/// The extractor keeps every parsed header in memory during preflight
/// validation, so the entry count is the only archive-wide resource it
/// holds. Payload sizes are not bounded here; they stream straight to disk.
///
/// # Examples
///
/// ```
/// use sealpack_core::ExtractionConfig;
///
/// let config = ExtractionConfig::default();
/// assert_eq!(config.max_path_depth, 64);
///
/// let custom = ExtractionConfig {
///     max_entry_count: 1_000,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Maximum number of records an archive may contain.
    pub max_entry_count: usize,

    /// Maximum number of components in a single entry path.
    pub max_path_depth: usize,
}

impl Default for ExtractionConfig {
    /// Default values:
    /// - `max_entry_count`: 250,000
    /// - `max_path_depth`: 64
    fn default() -> Self {
        Self {
            max_entry_count: 250_000,
            max_path_depth: 64,
        }
    }
}

impl ExtractionConfig {
    /// Creates a configuration without entry-count or depth limits.
    ///
    /// Path, symlink, and collision checks still apply; only the resource
    /// bounds are lifted.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_entry_count: usize::MAX,
            max_path_depth: usize::MAX,
        }
    }
}
