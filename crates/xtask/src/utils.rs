//! Utility functions for xtask commands

use anyhow::{Context, Result};
use std::path::Path;

use dndxml_document::{DocumentConfig, DocumentContent, read_document_file};

/// Reads a document using configuration from the environment.
pub fn load_document(path: &Path) -> Result<(DocumentContent, DocumentConfig)> {
    if !path.exists() {
        anyhow::bail!("Document not found: {}", path.display());
    }
    let config = DocumentConfig::from_env();
    let content = read_document_file(path, &config)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    Ok((content, config))
}
