//! Render document entities as readable text.

use anyhow::Result;
use clap::Parser;
use console::style;
use std::path::PathBuf;

use dndxml_document::Collection;

use crate::utils::load_document;

/// Print the rendered text of every entity
#[derive(Parser)]
pub struct Render {
    /// Path to the document
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Only render one collection
    #[arg(short, long, value_enum)]
    kind: Option<Kind>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Kind {
    Spells,
    Items,
    Creatures,
    Lookups,
}

impl From<Kind> for Collection {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Spells => Collection::Spells,
            Kind::Items => Collection::Items,
            Kind::Creatures => Collection::Creatures,
            Kind::Lookups => Collection::Lookups,
        }
    }
}

impl Render {
    pub fn execute(self) -> Result<()> {
        let (content, _) = load_document(&self.file)?;

        let collections: Vec<Collection> = match self.kind {
            Some(kind) => vec![kind.into()],
            None => vec![
                Collection::Spells,
                Collection::Items,
                Collection::Creatures,
                Collection::Lookups,
            ],
        };

        for collection in collections {
            let rendered = content.render(collection);
            if rendered.is_empty() {
                continue;
            }
            println!(
                "{}",
                style(format!("=== {} ({}) ===", collection, rendered.len()))
                    .bold()
                    .green()
            );
            println!();
            for text in rendered {
                println!("{text}");
            }
        }

        if content.is_empty() {
            println!("{}", style("Document contains no entities").yellow());
        }
        Ok(())
    }
}
