//! File store trait and error types.
//!
//! Provides the core [`FileStore`] trait for reading source files and writing
//! relocated copies, along with [`StorageError`] for unified error handling
//! across backends.

use std::path::{Path, PathBuf};

/// Descriptor for a file written by a [`FileStore`].
///
/// The store owns the bytes; this is metadata only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Unique identifier assigned when the file was written.
    pub identifier: String,
    /// URL the stored file is served from.
    pub public_url: String,
    /// Path the bytes were written to.
    pub storage_path: PathBuf,
}

/// What went wrong, independent of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Source file or directory does not exist.
    NotFound,
    /// The process may not read or write the path.
    PermissionDenied,
    /// A non-directory occupies a path that must be a directory.
    AlreadyExists,
    /// The path can't name a relocatable file.
    InvalidPath,
    /// Anything else.
    Other,
}

impl StorageErrorKind {
    fn label(self) -> &'static str {
        match self {
            Self::NotFound => "Not found",
            Self::PermissionDenied => "Permission denied",
            Self::AlreadyExists => "Already exists",
            Self::InvalidPath => "Invalid path",
            Self::Other => "Error",
        }
    }
}

impl From<std::io::ErrorKind> for StorageErrorKind {
    fn from(kind: std::io::ErrorKind) -> Self {
        match kind {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            _ => Self::Other,
        }
    }
}

/// Failure of a [`FileStore`] operation.
///
/// Built with [`StorageError::new`] and the `with_*` methods, or with one of
/// the shorthand constructors.
#[derive(Debug)]
pub struct StorageError {
    /// Error category.
    pub kind: StorageErrorKind,
    /// Path the operation was working on.
    pub path: Option<PathBuf>,
    /// Backend name, e.g. `"Fs"`.
    pub backend: Option<&'static str>,
    message: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            message: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Explanation shown when there is no underlying source error.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Missing file at `path`.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// `path` can't be relocated, with the reason.
    #[must_use]
    pub fn invalid_path(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::InvalidPath)
            .with_path(path)
            .with_message(message)
    }

    /// Wrap an I/O error, classifying it by [`std::io::ErrorKind`].
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<&Path>) -> Self {
        let error = Self::new(err.kind().into()).with_source(err);
        match path {
            Some(path) => error.with_path(path),
            None => error,
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // "[Fs] Not found: <detail> (path: /srv/media/a.png)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }
        f.write_str(self.kind.label())?;

        let detail = self
            .source
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| self.message.clone());
        if let Some(detail) = detail {
            write!(f, ": {detail}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn std::error::Error + 'static))
    }
}

/// Storage backend used to relocate files.
///
/// Paths are plain filesystem-style paths. Backends decide how a written path
/// maps to a public URL and assign each written file a fresh identifier.
pub trait FileStore: Send + Sync {
    /// Read all bytes of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file doesn't exist or can't be read.
    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Ensure a directory exists, creating missing ancestors.
    ///
    /// Succeeds if the directory already exists, including when another
    /// caller created it concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] for any failure other than "already exists".
    fn prepare_directory(&self, path: &Path) -> Result<(), StorageError>;

    /// Write `data` to `destination`, replacing any existing file.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the destination can't be written.
    fn write_data(&self, data: &[u8], destination: &Path) -> Result<StoredFile, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_file_fields() {
        let file = StoredFile {
            identifier: "abc".to_owned(),
            public_url: "/srv/public/a.png".to_owned(),
            storage_path: PathBuf::from("/srv/public/a.png"),
        };

        assert_eq!(file.identifier, "abc");
        assert_eq!(file.public_url, "/srv/public/a.png");
        assert_eq!(file.storage_path, Path::new("/srv/public/a.png"));
    }

    #[test]
    fn test_storage_error_new() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert!(err.path.as_deref().is_none());
        assert!(err.backend.is_none());
    }

    #[test]
    fn test_storage_error_exposes_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::new(StorageErrorKind::NotFound).with_source(io_err);

        assert_eq!(err.source().unwrap().to_string(), "file not found");
    }

    #[test]
    fn test_storage_error_io_kinds() {
        let cases = [
            (std::io::ErrorKind::NotFound, StorageErrorKind::NotFound),
            (
                std::io::ErrorKind::PermissionDenied,
                StorageErrorKind::PermissionDenied,
            ),
            (
                std::io::ErrorKind::AlreadyExists,
                StorageErrorKind::AlreadyExists,
            ),
            (std::io::ErrorKind::NotADirectory, StorageErrorKind::Other),
            (std::io::ErrorKind::Interrupted, StorageErrorKind::Other),
        ];
        for (io_kind, expected) in cases {
            let err = StorageError::io(std::io::Error::new(io_kind, "boom"), None);
            assert_eq!(err.kind, expected);
        }
    }

    #[test]
    fn test_storage_error_io_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::io(io_err, Some(Path::new("/srv/media/a.png")));

        assert_eq!(err.path.as_deref(), Some(Path::new("/srv/media/a.png")));
    }

    #[test]
    fn test_storage_error_display_simple() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.to_string(), "Not found");
    }

    #[test]
    fn test_storage_error_display_with_message() {
        let err = StorageError::invalid_path("/srv/media/", "no file name");

        assert_eq!(
            err.to_string(),
            "Invalid path: no file name (path: /srv/media/)"
        );
    }

    #[test]
    fn test_storage_error_display_full() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::new(StorageErrorKind::NotFound)
            .with_backend("Fs")
            .with_path("/foo/bar")
            .with_source(io_err);

        assert_eq!(
            err.to_string(),
            "[Fs] Not found: file not found (path: /foo/bar)"
        );
    }

    #[test]
    fn test_storage_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }
}
