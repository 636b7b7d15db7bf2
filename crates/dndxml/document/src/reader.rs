//! Document reading.
use std::fs;
use std::path::Path;

use dndxml_core::{Creature, LookupTable, MagicItem, Spell, XmlElement, XmlMapping};

use crate::config::DocumentConfig;
use crate::content::{Collection, DocumentContent};
use crate::error::{DocumentError, Result};
use crate::{NAMESPACE, ROOT_ELEMENT};

/// Reads every entity from document text.
///
/// A root that is not a `<document>` in [`NAMESPACE`] yields empty content,
/// or [`DocumentError::NotADocument`] when `strict_namespace` is set. A
/// single malformed entity fails the whole read.
pub fn read_document(input: &str, config: &DocumentConfig) -> Result<DocumentContent> {
    let root = XmlElement::parse(input)?;
    read_root(&root, config)
}

/// Reads a document from disk.
pub fn read_document_file(path: impl AsRef<Path>, config: &DocumentConfig) -> Result<DocumentContent> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "reading document");
    let input = fs::read_to_string(path).map_err(|e| DocumentError::io(path, e))?;
    read_document(&input, config)
}

pub(crate) fn read_root(root: &XmlElement, config: &DocumentConfig) -> Result<DocumentContent> {
    if !root.is(ROOT_ELEMENT) || root.namespace() != Some(NAMESPACE) {
        let found = match root.namespace() {
            Some(ns) => format!("{{{ns}}}{}", root.name()),
            None => root.name().to_string(),
        };
        if config.strict_namespace {
            return Err(DocumentError::NotADocument { found });
        }
        tracing::warn!(root = %found, "ignoring element that is not a dndxml document");
        return Ok(DocumentContent::default());
    }

    let mut content = DocumentContent::new();
    for element in root.elements() {
        let Some(collection) = Collection::from_element(element.name()) else {
            tracing::trace!(element = element.name(), "skipping unknown document element");
            continue;
        };
        for entry in element.elements() {
            if !entry.is(collection.entry()) {
                tracing::trace!(
                    collection = %collection,
                    element = entry.name(),
                    "skipping unknown collection entry"
                );
                continue;
            }
            match collection {
                Collection::Spells => content.spells.push(Spell::from_xml(entry)?),
                Collection::Items => content.items.push(MagicItem::from_xml(entry)?),
                Collection::Creatures => content.creatures.push(Creature::from_xml(entry)?),
                Collection::Lookups => content.lookups.push(LookupTable::from_xml(entry)?),
            }
        }
    }

    tracing::debug!(
        spells = content.spells.len(),
        items = content.items.len(),
        creatures = content.creatures.len(),
        lookups = content.lookups.len(),
        "read document"
    );
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(body: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><document xmlns="{NAMESPACE}">{body}</document>"#)
    }

    #[test]
    fn empty_document_reads_empty() {
        let content = read_document(&document(""), &DocumentConfig::default()).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn foreign_root_is_lenient_by_default() {
        let input = r#"<document xmlns="http://example.com/other"><spells/></document>"#;
        let content = read_document(input, &DocumentConfig::default()).unwrap();
        assert!(content.is_empty());

        let content = read_document("<catalog/>", &DocumentConfig::default()).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn foreign_root_is_rejected_when_strict() {
        let config = DocumentConfig {
            strict_namespace: true,
            ..DocumentConfig::default()
        };
        let err = read_document("<document/>", &config).unwrap_err();
        assert!(matches!(err, DocumentError::NotADocument { ref found } if found == "document"));
    }

    #[test]
    fn prefixed_namespace_is_accepted() {
        let input = format!(
            r#"<dnd:document xmlns:dnd="{NAMESPACE}"><dnd:items><dnd:item rarity="common"><dnd:title>Torch</dnd:title><dnd:type>wondrous item</dnd:type></dnd:item></dnd:items></dnd:document>"#
        );
        let content = read_document(&input, &DocumentConfig::default()).unwrap();
        assert_eq!(content.items.len(), 1);
        assert_eq!(content.items[0].title, "Torch");
    }

    #[test]
    fn malformed_entity_fails_the_read() {
        let input = document(r#"<items><item><title>Nameless</title><type>ring</type></item></items>"#);
        let err = read_document(&input, &DocumentConfig::default()).unwrap_err();
        match err {
            DocumentError::Format(inner) => assert!(inner.is_invalid_format()),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn syntax_errors_surface() {
        let err = read_document("<document", &DocumentConfig::default()).unwrap_err();
        assert!(matches!(err, DocumentError::Format(_)));
    }
}
