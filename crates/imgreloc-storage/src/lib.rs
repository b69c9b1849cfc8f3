//! File storage abstraction for imgreloc.
//!
//! This crate provides a [`FileStore`] trait for the two file operations image
//! relocation needs: reading source bytes and writing copies that come back as
//! [`StoredFile`] descriptors. This enables:
//!
//! - **Unit testing** without touching the real filesystem
//! - **Injected identity**: identifiers come from a [`TokenGenerator`]
//!
//! # Architecture
//!
//! The crate provides:
//! - [`FileStore`] trait with `read()`, `prepare_directory()`, and `write_data()`
//! - [`FsFileStore`] implementation for the local filesystem
//! - [`PublicUrls`] for mapping stored paths to URLs
//! - [`UuidGenerator`] as the production [`TokenGenerator`]
//! - [`MockFileStore`] and [`SequentialTokens`] for testing (behind `mock` feature flag)

mod fs;
#[cfg(feature = "mock")]
mod mock;
mod public_url;
mod storage;
mod token;

pub use fs::FsFileStore;
#[cfg(feature = "mock")]
pub use mock::{MockFileStore, SequentialTokens};
pub use public_url::PublicUrls;
pub use storage::{FileStore, StorageError, StorageErrorKind, StoredFile};
pub use token::{TokenGenerator, UuidGenerator};
