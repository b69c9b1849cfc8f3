//! Inline image relocation for HTML fragments.
//!
//! Given an HTML fragment, [`Transformer::transform`] finds every `<img>`,
//! copies the referenced file from the configured source prefix into a
//! run-scoped directory below the destination prefix, and rewrites the tag:
//!
//! ```text
//! <img src="/a.png">
//!   becomes
//! <img src="/srv/public/bat-<run>/a.png" data-entity-type="file" data-entity-uuid="<id>">
//! ```
//!
//! # Architecture
//!
//! - [`RunContext`]: source prefix, destination prefix and run token for one record
//! - [`ImageRelocator`]: copies a single image into the run directory
//! - [`Transformer`]: validates configuration, owns the run token, rewrites fragments
//! - [`RecordFields`]: access to the current record for record-backed prefixes
//!
//! Failures are never rolled back: copies made before an error stay on disk.

mod error;
mod record;
mod relocator;
mod run;
mod transformer;

pub use error::RelocateError;
pub use record::{EmptyRecord, RecordFields};
pub use relocator::{ImageReference, ImageRelocator};
pub use run::{RUN_DIR_PREFIX, RunContext};
pub use transformer::{RelocateSettings, Transformer};
