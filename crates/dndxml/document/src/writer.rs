//! Document writing.
use std::fs;
use std::path::Path;

use dndxml_core::XmlElement;

use crate::config::DocumentConfig;
use crate::content::DocumentContent;
use crate::error::{DocumentError, Result};
use crate::reader::read_root;

/// Serializes content as a namespaced, indented UTF-8 document.
///
/// Returns `None` when there is nothing to write. Only non-empty collections
/// appear in the output. In test mode the output is parsed and read back and
/// must reproduce the written tree.
pub fn write_document(content: &DocumentContent, config: &DocumentConfig) -> Result<Option<String>> {
    if content.is_empty() {
        tracing::debug!("nothing to write");
        return Ok(None);
    }

    let root = content.to_element();
    let text = root.to_xml_string(config.indent)?;

    if config.test_mode {
        verify_round_trip(&root, &text, config)?;
    }

    tracing::debug!(
        spells = content.spells.len(),
        items = content.items.len(),
        creatures = content.creatures.len(),
        lookups = content.lookups.len(),
        bytes = text.len(),
        "wrote document"
    );
    Ok(Some(text))
}

/// Writes a document to disk. Returns false, leaving any existing file
/// untouched, when the content is empty.
pub fn write_document_file(
    content: &DocumentContent,
    path: impl AsRef<Path>,
    config: &DocumentConfig,
) -> Result<bool> {
    let path = path.as_ref();
    let Some(text) = write_document(content, config)? else {
        return Ok(false);
    };
    tracing::debug!(path = %path.display(), "writing document");
    fs::write(path, text).map_err(|e| DocumentError::io(path, e))?;
    Ok(true)
}

fn verify_round_trip(root: &XmlElement, text: &str, config: &DocumentConfig) -> Result<()> {
    let parsed = XmlElement::parse(text)?;
    if !parsed.structurally_eq(root) {
        return Err(DocumentError::RoundTrip(
            "written XML does not parse back to the same tree".into(),
        ));
    }

    let strict = DocumentConfig {
        strict_namespace: true,
        ..config.clone()
    };
    let reread = read_root(&parsed, &strict)?;
    if !reread.to_element().structurally_eq(root) {
        return Err(DocumentError::RoundTrip(
            "entities read back from the written XML differ".into(),
        ));
    }
    Ok(())
}
