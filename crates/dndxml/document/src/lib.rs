//! Whole-document reading and writing for the dndxml dialect.
//!
//! A document is a namespaced `<document>` root holding up to four
//! collections (`<spells>`, `<items>`, `<creatures>`, `<lookups>`). This crate
//! locates those collections, hands each entity element to its
//! [`dndxml_core`] constructor, and writes the same shape back out.
pub mod config;
pub mod content;
pub mod error;
pub mod reader;
pub mod writer;

pub use config::DocumentConfig;
pub use content::{Collection, DocumentContent};
pub use error::{DocumentError, Result};
pub use reader::{read_document, read_document_file};
pub use writer::{write_document, write_document_file};

/// Namespace URI every document root must declare.
pub const NAMESPACE: &str = "http://alanquatermain.me/dnd/schema";

/// Tag of the document root element.
pub const ROOT_ELEMENT: &str = "document";
