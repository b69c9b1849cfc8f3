//! Mock file store for testing.
//!
//! Provides [`MockFileStore`] and [`SequentialTokens`] for unit testing
//! without filesystem access.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::public_url::PublicUrls;
use crate::storage::{FileStore, StorageError, StorageErrorKind, StoredFile};
use crate::token::TokenGenerator;

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Deterministic [`TokenGenerator`] yielding `"{prefix}-1"`, `"{prefix}-2"`, ...
#[derive(Debug)]
pub struct SequentialTokens {
    prefix: String,
    counter: AtomicUsize,
}

impl SequentialTokens {
    /// Create a generator with the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicUsize::new(0),
        }
    }
}

impl TokenGenerator for SequentialTokens {
    fn generate(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{n}", self.prefix)
    }
}

/// Mock file store for testing.
///
/// Keeps files and directories in memory. Use the builder methods to seed
/// source files and to make paths unwritable. Written files get identifiers
/// `file-1`, `file-2`, ... and bare-path public URLs.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use imgreloc_storage::{FileStore, MockFileStore};
///
/// let store = MockFileStore::new().with_file("/srv/media/a.png", b"png");
/// let bytes = store.read(Path::new("/srv/media/a.png")).unwrap();
/// ```
#[derive(Debug)]
pub struct MockFileStore {
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
    unwritable: RwLock<HashSet<PathBuf>>,
    tokens: SequentialTokens,
    urls: PublicUrls,
    operations: AtomicUsize,
}

impl Default for MockFileStore {
    fn default() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            dirs: RwLock::new(BTreeSet::new()),
            unwritable: RwLock::new(HashSet::new()),
            tokens: SequentialTokens::new("file"),
            urls: PublicUrls::default(),
            operations: AtomicUsize::new(0),
        }
    }
}

impl MockFileStore {
    /// Create a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file with content.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), content.into());
        self
    }

    /// Make writes and directory creation at or below `path` fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_unwritable(self, path: impl Into<PathBuf>) -> Self {
        self.unwritable.write().unwrap().insert(path.into());
        self
    }

    /// Use `base_url` as the public URL prefix.
    #[must_use]
    pub fn with_public_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.urls = PublicUrls::new(base_url, None);
        self
    }

    /// Content of a file, if present.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.read().unwrap().get(path.as_ref()).cloned()
    }

    /// Whether a directory has been prepared.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        self.dirs.read().unwrap().contains(path.as_ref())
    }

    /// Number of directories prepared so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn dir_count(&self) -> usize {
        self.dirs.read().unwrap().len()
    }

    /// Number of trait calls made against this store.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    fn record_operation(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }

    fn check_writable(&self, path: &Path) -> Result<(), StorageError> {
        let denied = self
            .unwritable
            .read()
            .unwrap()
            .iter()
            .any(|blocked| path.starts_with(blocked));
        if denied {
            return Err(StorageError::new(StorageErrorKind::PermissionDenied)
                .with_path(path)
                .with_backend(BACKEND));
        }
        Ok(())
    }

    fn insert_dir(&self, path: &Path) {
        let mut dirs = self.dirs.write().unwrap();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl FileStore for MockFileStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.record_operation();
        self.file(path)
            .ok_or_else(|| StorageError::not_found(path).with_backend(BACKEND))
    }

    fn prepare_directory(&self, path: &Path) -> Result<(), StorageError> {
        self.record_operation();
        self.check_writable(path)?;
        if self.files.read().unwrap().contains_key(path) {
            return Err(StorageError::new(StorageErrorKind::AlreadyExists)
                .with_path(path)
                .with_backend(BACKEND));
        }
        self.insert_dir(path);
        Ok(())
    }

    fn write_data(&self, data: &[u8], destination: &Path) -> Result<StoredFile, StorageError> {
        self.record_operation();
        self.check_writable(destination)?;
        if let Some(parent) = destination.parent() {
            self.insert_dir(parent);
        }
        self.files
            .write()
            .unwrap()
            .insert(destination.to_path_buf(), data.to_vec());

        Ok(StoredFile {
            identifier: self.tokens.generate(),
            public_url: self.urls.url_for(destination),
            storage_path: destination.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_mock_store_is_send_sync() {
        assert_send_sync::<MockFileStore>();
    }

    #[test]
    fn test_sequential_tokens() {
        let tokens = SequentialTokens::new("run");
        assert_eq!(tokens.generate(), "run-1");
        assert_eq!(tokens.generate(), "run-2");
    }

    #[test]
    fn test_read_seeded_file() {
        let store = MockFileStore::new().with_file("/srv/media/a.png", b"png".to_vec());

        assert_eq!(store.read(Path::new("/srv/media/a.png")).unwrap(), b"png");
        assert_eq!(store.operation_count(), 1);
    }

    #[test]
    fn test_read_missing() {
        let store = MockFileStore::new();

        let err = store.read(Path::new("/missing.png")).unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(err.backend, Some("Mock"));
        assert_eq!(err.path.as_deref(), Some(Path::new("/missing.png")));
    }

    #[test]
    fn test_prepare_directory_records_ancestors() {
        let store = MockFileStore::new();

        store.prepare_directory(Path::new("/srv/public/bat-1")).unwrap();
        store.prepare_directory(Path::new("/srv/public/bat-1")).unwrap();

        assert!(store.has_dir("/srv/public/bat-1"));
        assert!(store.has_dir("/srv/public"));
    }

    #[test]
    fn test_prepare_directory_unwritable() {
        let store = MockFileStore::new().with_unwritable("/readonly");

        let err = store
            .prepare_directory(Path::new("/readonly/bat-1"))
            .unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::PermissionDenied);
    }

    #[test]
    fn test_write_data_assigns_sequential_ids() {
        let store = MockFileStore::new().with_public_base_url("https://cdn.test");

        let first = store.write_data(b"a", Path::new("/out/a.png")).unwrap();
        let second = store.write_data(b"b", Path::new("/out/b.png")).unwrap();

        assert_eq!(first.identifier, "file-1");
        assert_eq!(second.identifier, "file-2");
        assert_eq!(first.public_url, "https://cdn.test/out/a.png");
        assert_eq!(store.file("/out/b.png"), Some(b"b".to_vec()));
        assert!(store.has_dir("/out"));
    }

    #[test]
    fn test_write_data_overwrites() {
        let store = MockFileStore::new();

        store.write_data(b"first", Path::new("/out/a.png")).unwrap();
        store.write_data(b"second", Path::new("/out/a.png")).unwrap();

        assert_eq!(store.file("/out/a.png"), Some(b"second".to_vec()));
    }
}
