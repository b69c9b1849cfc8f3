//! imgreloc CLI - inline image relocator.
//!
//! Provides commands for:
//! - `transform`: Relocate the images of one HTML fragment
//! - `batch`: Relocate the images of a JSON-lines stream of records in one run

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BatchArgs, GlobalArgs, TransformArgs};
use output::Output;

/// imgreloc - copy images referenced by HTML fragments and rewrite their tags.
#[derive(Parser)]
#[command(name = "imgreloc", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relocate the images of a single HTML fragment.
    Transform(TransformArgs),
    /// Relocate the images of every record in a JSON-lines file.
    Batch(BatchArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Transform(args) => args.execute(&cli.global),
        Commands::Batch(args) => args.execute(&cli.global),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
