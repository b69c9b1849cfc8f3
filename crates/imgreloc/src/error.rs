//! CLI error types.

use imgreloc_config::ConfigError;
use imgreloc_core::RelocateError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Relocate(#[from] RelocateError),

    #[error("Record on line {line}: {message}")]
    Record { line: usize, message: String },
}
