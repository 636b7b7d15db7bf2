//! Export document entities as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::utils::load_document;

/// Print a document's entities as JSON
#[derive(Parser)]
pub struct Export {
    /// Path to the document
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,
}

impl Export {
    pub fn execute(self) -> Result<()> {
        let (content, _) = load_document(&self.file)?;

        let json = if self.pretty {
            serde_json::to_string_pretty(&content)
        } else {
            serde_json::to_string(&content)
        }
        .context("Failed to serialize document to JSON")?;

        println!("{json}");
        Ok(())
    }
}
