//! Relocation error types.

use imgreloc_html::FragmentError;
use imgreloc_storage::StorageError;

/// Error raised while building a transformer or transforming a fragment.
#[derive(Debug, thiserror::Error)]
pub enum RelocateError {
    /// A required option is missing or empty.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reading the source or writing the copy failed.
    #[error("Failed to save file {source_path}: {source}")]
    Storage {
        /// Source path the image was to be copied from.
        source_path: String,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// The fragment could not be parsed or serialized.
    #[error("{0}")]
    Fragment(#[from] FragmentError),
}

impl RelocateError {
    pub(crate) fn storage(source_path: impl Into<String>, source: StorageError) -> Self {
        Self::Storage {
            source_path: source_path.into(),
            source,
        }
    }

    /// Whether this error comes from configuration rather than I/O.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
