//! `transform` command implementation.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use imgreloc_core::Transformer;

use super::{GlobalArgs, open_output, read_input};
use crate::error::CliError;

/// Arguments for the transform command.
#[derive(Args)]
pub(crate) struct TransformArgs {
    /// HTML fragment to transform (default: stdin).
    input: Option<PathBuf>,

    /// Write the transformed fragment here (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Record field available to record-backed prefixes, as KEY=VALUE.
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    fields: Vec<(String, String)>,
}

impl TransformArgs {
    /// Execute the transform command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, input cannot be read,
    /// or any image fails to relocate.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let transformer = global.build_transformer()?;
        let html = read_input(self.input.as_deref())?;

        let body = transform_fragment(&transformer, &html, self.fields)?;

        let mut writer = open_output(self.output.as_deref())?;
        writer.write_all(body.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Transform one fragment against a record built from `fields`.
fn transform_fragment(
    transformer: &Transformer,
    html: &str,
    fields: Vec<(String, String)>,
) -> Result<String, CliError> {
    let record: HashMap<String, String> = fields.into_iter().collect();
    Ok(transformer.transform(html, &record)?)
}

/// Parse a `KEY=VALUE` pair.
fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("field name cannot be empty in '{s}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
