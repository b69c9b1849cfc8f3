//! CLI command implementations.

pub(crate) mod batch;
pub(crate) mod transform;

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use imgreloc_config::{CliSettings, Config};
use imgreloc_core::Transformer;
use imgreloc_storage::{FsFileStore, UuidGenerator};

use crate::error::CliError;

pub(crate) use batch::BatchArgs;
pub(crate) use transform::TransformArgs;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover imgreloc.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Prefix prepended to image paths to find source files (overrides config).
    #[arg(long, global = true, env = "IMGRELOC_SOURCE_PATH")]
    source_path: Option<String>,

    /// Directory under which the run directory is created (overrides config).
    #[arg(long, global = true, env = "IMGRELOC_SAVE_DESTINATION")]
    save_destination: Option<String>,

    /// URL prefix for relocated files (overrides config).
    #[arg(long, global = true)]
    public_base_url: Option<String>,

    /// Enable verbose output (per-run and per-fragment logs).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Load configuration and build the transformer for this invocation.
    ///
    /// The transformer owns the run token, so one invocation is one run.
    pub(crate) fn build_transformer(&self) -> Result<Transformer, CliError> {
        let cli_settings = CliSettings {
            source_path: self.source_path.clone(),
            save_destination: self.save_destination.clone(),
            public_base_url: self.public_base_url.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let tokens = Arc::new(UuidGenerator);
        let mut store = FsFileStore::new(tokens.clone())
            .with_public_base_url(config.storage.public_base_url.clone())
            .with_dir_mode(config.storage.dir_mode);
        if let Some(root) = &config.storage.public_root {
            store = store.with_public_root(root.clone());
        }

        Ok(Transformer::new(
            &config.relocate,
            Arc::new(store),
            tokens.as_ref(),
        )?)
    }
}

/// Read all of `input`, or stdin when absent or `-`.
pub(crate) fn read_input(input: Option<&Path>) -> Result<String, CliError> {
    match input {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Open `output` for writing, or stdout when absent or `-`.
pub(crate) fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>, CliError> {
    match output {
        Some(path) if path != Path::new("-") => Ok(Box::new(BufWriter::new(File::create(path)?))),
        _ => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
