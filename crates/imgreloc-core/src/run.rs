//! Run-scoped destination paths.

use std::path::PathBuf;

use imgreloc_storage::{FileStore, StorageError};

use crate::error::RelocateError;

/// Prefix of the per-run destination directory name.
pub const RUN_DIR_PREFIX: &str = "bat-";

/// Paths shared by every image processed in one run.
///
/// All copies land in `dest_prefix/bat-<run_id>`, so separate runs against
/// the same destination never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    run_id: String,
    source_prefix: String,
    dest_prefix: PathBuf,
}

impl RunContext {
    /// Create a run context.
    ///
    /// # Errors
    ///
    /// Returns [`RelocateError::Configuration`] if either prefix is empty.
    pub fn new(
        run_id: impl Into<String>,
        source_prefix: impl Into<String>,
        dest_prefix: impl Into<PathBuf>,
    ) -> Result<Self, RelocateError> {
        let source_prefix = source_prefix.into();
        let dest_prefix = dest_prefix.into();
        if source_prefix.is_empty() {
            return Err(RelocateError::Configuration(
                "image source path prefix cannot be empty".to_owned(),
            ));
        }
        if dest_prefix.as_os_str().is_empty() {
            return Err(RelocateError::Configuration(
                "image save destination cannot be empty".to_owned(),
            ));
        }
        Ok(Self {
            run_id: run_id.into(),
            source_prefix,
            dest_prefix,
        })
    }

    /// Token identifying the run.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Prefix prepended to image URIs to form source paths.
    #[must_use]
    pub fn source_prefix(&self) -> &str {
        &self.source_prefix
    }

    /// Directory every file of this run is written to.
    #[must_use]
    pub fn destination_dir(&self) -> PathBuf {
        self.dest_prefix
            .join(format!("{RUN_DIR_PREFIX}{}", self.run_id))
    }

    /// Create the run directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] for any failure other than the directory
    /// already existing.
    pub fn ensure_destination_dir(&self, store: &dyn FileStore) -> Result<PathBuf, StorageError> {
        let dir = self.destination_dir();
        store.prepare_directory(&dir)?;
        Ok(dir)
    }
}
