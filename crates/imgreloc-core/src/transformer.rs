//! Fragment-level transform tying parsing, relocation and rewriting together.

use std::sync::Arc;

use imgreloc_config::{PathSetting, RelocateConfig};
use imgreloc_html::{Fragment, ResolvedUri, SYNTHETIC_BASE_URI};
use imgreloc_storage::{FileStore, StorageError, TokenGenerator};

use crate::error::RelocateError;
use crate::record::RecordFields;
use crate::relocator::ImageRelocator;
use crate::run::RunContext;

/// Option name of the source prefix.
const SOURCE_OPTION: &str = "image_file_source_path";

/// Option name of the destination prefix.
const DESTINATION_OPTION: &str = "image_file_save_destination";

/// Validated prefix settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocateSettings {
    source: PathSetting,
    destination: PathSetting,
}

impl RelocateSettings {
    /// Validate that both prefixes are configured.
    ///
    /// # Errors
    ///
    /// Returns [`RelocateError::Configuration`] naming the first missing option.
    pub fn new(
        source: Option<PathSetting>,
        destination: Option<PathSetting>,
    ) -> Result<Self, RelocateError> {
        let source = require(source, SOURCE_OPTION)?;
        let destination = require(destination, DESTINATION_OPTION)?;
        Ok(Self {
            source,
            destination,
        })
    }

    /// Validate settings from the `[relocate]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`RelocateError::Configuration`] naming the first missing option.
    pub fn from_config(config: &RelocateConfig) -> Result<Self, RelocateError> {
        Self::new(
            config.image_file_source_path.clone(),
            config.image_file_save_destination.clone(),
        )
    }

    /// Source prefix setting.
    #[must_use]
    pub fn source(&self) -> &PathSetting {
        &self.source
    }

    /// Destination prefix setting.
    #[must_use]
    pub fn destination(&self) -> &PathSetting {
        &self.destination
    }
}

/// Reject absent and empty settings.
fn require(setting: Option<PathSetting>, option: &str) -> Result<PathSetting, RelocateError> {
    match setting {
        Some(PathSetting::Static(prefix)) if prefix.is_empty() => Err(
            RelocateError::Configuration(format!("\"{option}\" cannot be empty.")),
        ),
        Some(PathSetting::Field { field }) if field.is_empty() => Err(
            RelocateError::Configuration(format!("\"{option}\" field name cannot be empty.")),
        ),
        Some(setting) => Ok(setting),
        None => Err(RelocateError::Configuration(format!(
            "\"{option}\" must be configured."
        ))),
    }
}

/// Resolve one prefix for the current record.
fn resolve_prefix(
    setting: &PathSetting,
    record: &dyn RecordFields,
    option: &str,
) -> Result<String, RelocateError> {
    match setting {
        PathSetting::Static(prefix) => Ok(prefix.clone()),
        PathSetting::Field { field } => record.field(field).map(str::to_owned).ok_or_else(|| {
            RelocateError::Configuration(format!(
                "\"{option}\" reads record field '{field}', which is missing or not a string"
            ))
        }),
    }
}

/// Rewrites `<img>` tags in HTML fragments to point at relocated copies.
///
/// One transformer corresponds to one run: its run token is generated at
/// construction and every fragment it processes writes into the same
/// `bat-<token>` directory. The transformer is `Send + Sync` and may be shared
/// between threads.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use imgreloc_config::RelocateConfig;
/// use imgreloc_core::{EmptyRecord, Transformer};
/// use imgreloc_storage::{FsFileStore, UuidGenerator};
///
/// let tokens = Arc::new(UuidGenerator);
/// let store = Arc::new(FsFileStore::new(tokens.clone()));
/// let transformer = Transformer::new(&config.relocate, store, tokens.as_ref())?;
/// let html = transformer.transform(r#"<p><img src="/a.png"></p>"#, &EmptyRecord)?;
/// ```
pub struct Transformer {
    settings: RelocateSettings,
    store: Arc<dyn FileStore>,
    run_id: String,
}

impl Transformer {
    /// Build a transformer from the `[relocate]` config section.
    ///
    /// Validates both options before any file I/O and draws the run token
    /// from `tokens`.
    ///
    /// # Errors
    ///
    /// Returns [`RelocateError::Configuration`] if an option is missing or empty.
    pub fn new(
        config: &RelocateConfig,
        store: Arc<dyn FileStore>,
        tokens: &dyn TokenGenerator,
    ) -> Result<Self, RelocateError> {
        let settings = RelocateSettings::from_config(config)?;
        Ok(Self::with_settings(settings, store, tokens))
    }

    /// Build a transformer from already validated settings.
    #[must_use]
    pub fn with_settings(
        settings: RelocateSettings,
        store: Arc<dyn FileStore>,
        tokens: &dyn TokenGenerator,
    ) -> Self {
        let run_id = tokens.generate();
        tracing::info!(
            run_id = %run_id,
            source = %settings.source,
            destination = %settings.destination,
            "starting image relocation run"
        );
        Self {
            settings,
            store,
            run_id,
        }
    }

    /// Token shared by every fragment this transformer processes.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Resolve the run paths for one record.
    ///
    /// # Errors
    ///
    /// Returns [`RelocateError::Configuration`] if a record-backed prefix is
    /// missing from `record` or resolves to an empty string.
    pub fn run_context(&self, record: &dyn RecordFields) -> Result<RunContext, RelocateError> {
        let source = resolve_prefix(&self.settings.source, record, SOURCE_OPTION)?;
        let destination = resolve_prefix(&self.settings.destination, record, DESTINATION_OPTION)?;
        RunContext::new(self.run_id.clone(), source, destination)
    }

    /// Relocate every image of `html` and return the rewritten body markup.
    ///
    /// Images are processed in document order. Each `<img>` gets `src` set to
    /// the copy's public URL plus `data-entity-type="file"` and
    /// `data-entity-uuid` set to the copy's identifier. The run directory is
    /// created on the first image, so fragments without images touch no files
    /// and never consult the record.
    ///
    /// # Errors
    ///
    /// Returns the first failure. Copies made for earlier images of the same
    /// fragment are left in place.
    pub fn transform(&self, html: &str, record: &dyn RecordFields) -> Result<String, RelocateError> {
        let fragment = Fragment::parse(html, SYNTHETIC_BASE_URI)?;
        let mut images = fragment.images().peekable();
        if images.peek().is_none() {
            tracing::info!(run_id = %self.run_id, images = 0, "transformed fragment");
            return Ok(fragment.serialize("body")?);
        }

        // Record-backed prefixes are only needed once there is an image to copy
        let run = self.run_context(record)?;
        let relocator = ImageRelocator::new(self.store.as_ref());

        let mut relocated = 0usize;
        for image in images {
            let uri = match image.resolved_uri() {
                Some(ResolvedUri::Local(path)) => path,
                Some(other) => return Err(unsupported_reference(&run, other.as_str())),
                None => return Err(unsupported_reference(&run, "")),
            };

            let file = relocator.relocate(&uri, &run)?;
            image.set_attributes(&[
                ("src", file.public_url.as_str()),
                ("data-entity-type", "file"),
                ("data-entity-uuid", file.identifier.as_str()),
            ]);
            relocated += 1;
        }

        tracing::info!(run_id = %self.run_id, images = relocated, "transformed fragment");
        Ok(fragment.serialize("body")?)
    }
}

/// Error for an `<img>` whose `src` is missing or not a local path.
fn unsupported_reference(run: &RunContext, reference: &str) -> RelocateError {
    let source_path = format!("{}{reference}", run.source_prefix());
    let message = if reference.is_empty() {
        "image has no src attribute"
    } else {
        "image reference is not a local path"
    };
    RelocateError::storage(
        source_path.clone(),
        StorageError::invalid_path(source_path, message),
    )
}
