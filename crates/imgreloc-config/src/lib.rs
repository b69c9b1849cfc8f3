//! Configuration management for imgreloc.
//!
//! Parses `imgreloc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Path settings
//!
//! `relocate.image_file_source_path` and `relocate.image_file_save_destination`
//! are [`PathSetting`]s. A plain string is a static prefix; a table
//! `{ field = "name" }` reads the prefix from a field of each processed record:
//!
//! ```toml
//! [relocate]
//! image_file_source_path = { field = "source_root" }
//! image_file_save_destination = "/srv/public"
//! ```
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `relocate.image_file_source_path` (static form only)
//! - `relocate.image_file_save_destination` (static form only)
//! - `storage.public_base_url`
//! - `storage.public_root`

mod expand;

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the image source prefix with a static value.
    pub source_path: Option<String>,
    /// Override the save destination prefix with a static value.
    pub save_destination: Option<String>,
    /// Override the public base URL.
    pub public_base_url: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "imgreloc.toml";

/// Default permission bits for created run directories.
const DEFAULT_DIR_MODE: u32 = 0o777;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image relocation settings.
    pub relocate: RelocateConfig,
    /// Destination storage settings.
    pub storage: StorageConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Where a path prefix comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PathSetting {
    /// Fixed prefix shared by every record.
    Static(String),
    /// Prefix read from the named field of the current record.
    Field {
        /// Record field name.
        field: String,
    },
}

impl fmt::Display for PathSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(prefix) => write!(f, "{prefix}"),
            Self::Field { field } => write!(f, "<record field '{field}'>"),
        }
    }
}

/// Image relocation configuration.
///
/// Both options are required by the transformer, but are optional here so a
/// missing option is reported when the transformer is built rather than as a
/// TOML parse error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RelocateConfig {
    /// Prefix prepended to each image URI to form the source file path.
    pub image_file_source_path: Option<PathSetting>,
    /// Prefix under which the run-scoped destination directory is created.
    pub image_file_save_destination: Option<PathSetting>,
}

/// Destination storage configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// URL prefix for stored files. Empty means URLs are bare paths.
    pub public_base_url: String,
    /// Directory stripped from stored paths when building public URLs.
    pub public_root: Option<PathBuf>,
    /// Permission bits for created directories (unix only).
    pub dir_mode: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_base_url: String::new(),
            public_root: None,
            dir_mode: DEFAULT_DIR_MODE,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`storage.public_root`").
        field: String,
        /// Error message (e.g., "${`MEDIA_ROOT`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `imgreloc.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_path) = &settings.source_path {
            self.relocate.image_file_source_path = Some(PathSetting::Static(source_path.clone()));
        }
        if let Some(save_destination) = &settings.save_destination {
            self.relocate.image_file_save_destination =
                Some(PathSetting::Static(save_destination.clone()));
        }
        if let Some(public_base_url) = &settings.public_base_url {
            self.storage.public_base_url.clone_from(public_base_url);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Missing relocation options are not checked here; the transformer
    /// rejects them when it is constructed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_relocate()?;
        self.validate_storage()?;
        Ok(())
    }

    /// Validate relocation path settings that are present.
    fn validate_relocate(&self) -> Result<(), ConfigError> {
        let settings = [
            (
                &self.relocate.image_file_source_path,
                "relocate.image_file_source_path",
            ),
            (
                &self.relocate.image_file_save_destination,
                "relocate.image_file_save_destination",
            ),
        ];
        for (setting, name) in settings {
            match setting {
                Some(PathSetting::Static(prefix)) => require_non_empty(prefix, name)?,
                Some(PathSetting::Field { field }) => {
                    require_non_empty(field, &format!("{name}.field"))?;
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Validate storage configuration.
    fn validate_storage(&self) -> Result<(), ConfigError> {
        const MAX_DIR_MODE: u32 = 0o7777;

        let url = &self.storage.public_base_url;
        if !url.is_empty()
            && !url.starts_with("http://")
            && !url.starts_with("https://")
            && !url.starts_with('/')
        {
            return Err(ConfigError::Validation(
                "storage.public_base_url must start with http://, https:// or /".to_owned(),
            ));
        }

        if self.storage.dir_mode > MAX_DIR_MODE {
            return Err(ConfigError::Validation(format!(
                "storage.dir_mode cannot exceed {MAX_DIR_MODE:#o}"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(PathSetting::Static(prefix)) = &mut self.relocate.image_file_source_path {
            *prefix = expand::expand_env(prefix, "relocate.image_file_source_path")?;
        }
        if let Some(PathSetting::Static(prefix)) = &mut self.relocate.image_file_save_destination {
            *prefix = expand::expand_env(prefix, "relocate.image_file_save_destination")?;
        }

        self.storage.public_base_url =
            expand::expand_env(&self.storage.public_base_url, "storage.public_base_url")?;

        if let Some(root) = &self.storage.public_root {
            let expanded = expand::expand_env(&root.to_string_lossy(), "storage.public_root")?;
            self.storage.public_root = Some(PathBuf::from(expanded));
        }

        Ok(())
    }

    /// Resolve relative static paths against the config directory.
    ///
    /// Record-backed settings are left untouched.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |setting: &mut Option<PathSetting>| {
            if let Some(PathSetting::Static(prefix)) = setting
                && !prefix.is_empty()
                && Path::new(prefix.as_str()).is_relative()
            {
                *prefix = config_dir.join(prefix.as_str()).to_string_lossy().into_owned();
            }
        };
        resolve(&mut self.relocate.image_file_source_path);
        resolve(&mut self.relocate.image_file_save_destination);

        if let Some(root) = &self.storage.public_root
            && root.is_relative()
        {
            self.storage.public_root = Some(config_dir.join(root));
        }
    }
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}
