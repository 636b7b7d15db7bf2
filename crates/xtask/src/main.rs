//! Development tasks for dndxml documents
//!
//! This binary provides document utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod utils;

use anyhow::Result;
use clap::Parser;
use commands::{Check, Export, Render};
use tracing_subscriber::EnvFilter;

/// Development tasks for dndxml documents
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Tools for dndxml documents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Print the rendered text of every entity in a document
    Render(Render),

    /// Read, rewrite and re-read a document, reporting any difference
    Check(Check),

    /// Print a document's entities as JSON
    Export(Export),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for DNDXML_* variables)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render(cmd) => cmd.execute(),
        Command::Check(cmd) => cmd.execute(),
        Command::Export(cmd) => cmd.execute(),
    }
}
