//! Verify that a document survives a write/read cycle.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use dndxml_document::{Collection, DocumentConfig, read_document, write_document};

use crate::utils::load_document;

/// Read, rewrite and re-read a document
#[derive(Parser)]
pub struct Check {
    /// Path to the document
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

impl Check {
    pub fn execute(self) -> Result<()> {
        let (content, config) = load_document(&self.file)?;

        println!("{} {}", style("Document:").bold().cyan(), self.file.display());
        for collection in [
            Collection::Spells,
            Collection::Items,
            Collection::Creatures,
            Collection::Lookups,
        ] {
            println!("  {}: {}", collection, content.len(collection));
        }

        let config = DocumentConfig {
            test_mode: true,
            ..config
        };
        let Some(written) = write_document(&content, &config).context("Round trip failed")? else {
            println!("{}", style("Document contains no entities").yellow());
            return Ok(());
        };

        let reread = read_document(&written, &config).context("Failed to re-read written document")?;
        if reread != content {
            anyhow::bail!("Entities differ after a write/read cycle");
        }

        println!("{}", style("Round trip OK").bold().green());
        Ok(())
    }
}
