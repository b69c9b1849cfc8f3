//! Copying one image into the run directory.

use std::path::Path;

use imgreloc_storage::{FileStore, StorageError, StoredFile};

use crate::error::RelocateError;
use crate::run::RunContext;

/// One image reference found in a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// URI as resolved from the `<img>` tag (e.g. `/images/a.png`).
    pub raw_uri: String,
    /// Source prefix and URI concatenated as-is.
    pub resolved_source_path: String,
}

impl ImageReference {
    /// Build the reference for `uri` within `run`.
    ///
    /// The source path is plain string concatenation; separators are not
    /// normalized.
    #[must_use]
    pub fn new(uri: &str, run: &RunContext) -> Self {
        Self {
            raw_uri: uri.to_owned(),
            resolved_source_path: format!("{}{uri}", run.source_prefix()),
        }
    }

    /// Final path segment of the source path.
    ///
    /// `None` when the URI names a directory rather than a file.
    #[must_use]
    pub fn basename(&self) -> Option<&str> {
        if self.raw_uri.is_empty() || self.raw_uri.ends_with('/') {
            return None;
        }
        Path::new(&self.resolved_source_path)
            .file_name()
            .and_then(|name| name.to_str())
    }
}

/// Copies images from the source prefix into a run directory.
pub struct ImageRelocator<'a> {
    store: &'a dyn FileStore,
}

impl<'a> ImageRelocator<'a> {
    /// Create a relocator backed by `store`.
    #[must_use]
    pub fn new(store: &'a dyn FileStore) -> Self {
        Self { store }
    }

    /// Copy the image at `resolved_uri` into the run directory.
    ///
    /// The copy is written as `<run dir>/<basename>`, replacing any earlier
    /// copy with the same basename.
    ///
    /// # Errors
    ///
    /// Returns [`RelocateError::Storage`] naming the source path if the URI has
    /// no file name, the run directory can't be created, the source can't be
    /// read, or the copy can't be written.
    pub fn relocate(
        &self,
        resolved_uri: &str,
        run: &RunContext,
    ) -> Result<StoredFile, RelocateError> {
        let reference = ImageReference::new(resolved_uri, run);
        let source_path = reference.resolved_source_path.as_str();

        let Some(basename) = reference.basename() else {
            return Err(RelocateError::storage(
                source_path,
                StorageError::invalid_path(source_path, "image reference has no file name"),
            ));
        };

        let dir = run
            .ensure_destination_dir(self.store)
            .map_err(|e| RelocateError::storage(source_path, e))?;

        let data = self
            .store
            .read(Path::new(source_path))
            .map_err(|e| RelocateError::storage(source_path, e))?;

        let destination = dir.join(basename);
        let file = self
            .store
            .write_data(&data, &destination)
            .map_err(|e| RelocateError::storage(source_path, e))?;

        tracing::debug!(
            source = source_path,
            destination = %destination.display(),
            identifier = %file.identifier,
            "relocated image"
        );
        Ok(file)
    }
}
