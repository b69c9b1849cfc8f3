//! Filesystem file store.
//!
//! Provides [`FsFileStore`] for reading source images from and writing
//! relocated copies to the local filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::public_url::PublicUrls;
use crate::storage::{FileStore, StorageError, StorageErrorKind, StoredFile};
use crate::token::TokenGenerator;

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Default permission bits for created directories.
const DEFAULT_DIR_MODE: u32 = 0o777;

/// Filesystem file store.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use std::sync::Arc;
/// use imgreloc_storage::{FileStore, FsFileStore, UuidGenerator};
///
/// let store = FsFileStore::new(Arc::new(UuidGenerator))
///     .with_public_base_url("https://cdn.example.com");
/// let bytes = store.read(Path::new("/srv/media/a.png"))?;
/// let file = store.write_data(&bytes, Path::new("/srv/public/a.png"))?;
/// ```
pub struct FsFileStore {
    tokens: Arc<dyn TokenGenerator>,
    urls: PublicUrls,
    dir_mode: u32,
}

impl FsFileStore {
    /// Create a store that assigns identifiers from `tokens`.
    ///
    /// Public URLs are bare stored paths until a base URL is set.
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenGenerator>) -> Self {
        Self {
            tokens,
            urls: PublicUrls::default(),
            dir_mode: DEFAULT_DIR_MODE,
        }
    }

    /// Set the URL prefix for stored files, keeping the public root.
    #[must_use]
    pub fn with_public_base_url(self, base_url: impl Into<String>) -> Self {
        self.with_public_urls(|root| PublicUrls::new(base_url, root))
    }

    /// Set the directory stripped from stored paths in public URLs.
    #[must_use]
    pub fn with_public_root(self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let base_url = self.base_url().to_owned();
        self.with_public_urls(|_| PublicUrls::new(base_url, Some(root)))
    }

    /// Set permission bits for created directories (ignored off unix).
    #[must_use]
    pub fn with_dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    fn base_url(&self) -> &str {
        self.urls.base_url()
    }

    fn with_public_urls(mut self, build: impl FnOnce(Option<PathBuf>) -> PublicUrls) -> Self {
        self.urls = build(self.urls.root().map(Path::to_path_buf));
        self
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.dir_mode);
        }

        // Recursive creation already treats an existing directory as success,
        // including one created by a concurrent caller.
        builder.create(path).map_err(|e| {
            let file_in_the_way = e.kind() == io::ErrorKind::NotADirectory;
            let mut error = StorageError::io(e, Some(path)).with_backend(BACKEND);
            if file_in_the_way {
                error.kind = StorageErrorKind::AlreadyExists;
            }
            error
        })
    }
}

impl FileStore for FsFileStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).map_err(|e| StorageError::io(e, Some(path)).with_backend(BACKEND))
    }

    fn prepare_directory(&self, path: &Path) -> Result<(), StorageError> {
        self.create_dir_all(path)
    }

    fn write_data(&self, data: &[u8], destination: &Path) -> Result<StoredFile, StorageError> {
        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            self.create_dir_all(parent)?;
        }

        fs::write(destination, data)
            .map_err(|e| StorageError::io(e, Some(destination)).with_backend(BACKEND))?;

        let file = StoredFile {
            identifier: self.tokens.generate(),
            public_url: self.urls.url_for(destination),
            storage_path: destination.to_path_buf(),
        };
        tracing::debug!(
            path = %destination.display(),
            bytes = data.len(),
            identifier = %file.identifier,
            "stored file"
        );
        Ok(file)
    }
}
