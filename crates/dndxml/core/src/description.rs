//! Structured prose shared by every entity.
//!
//! A [`Description`] is an ordered sequence of [`Block`]s. Callouts nest a
//! further description, so the model is a tree built once from XML.
//!
//! ```xml
//! <description>
//!   <p>You set an alarm against unwanted intrusion.</p>
//!   <list type="bullet"><listitem>Audible</listitem><listitem>Mental</listitem></list>
//!   <table>
//!     <title>Damage</title>
//!     <header><cell>d6</cell><cell>Type</cell></header>
//!     <row><cell>1</cell><cell>Fire</cell></row>
//!   </table>
//!   <callout><title>Variant</title><p>...</p></callout>
//! </description>
//! ```

use std::fmt;

use crate::error::{FormatError, Result};
use crate::mapping::XmlMapping;
use crate::text::{Footnote, ListItem, Paragraph, TableCell};
use crate::vocab::expect_element;
use crate::xml::XmlElement;

// ============================================================================
// Description
// ============================================================================

/// Block-level content.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Block {
    Paragraph(Paragraph),
    List(List),
    Table(Table),
    Callout(Callout),
}

impl Block {
    /// Dispatches an element to its block constructor.
    ///
    /// Returns `Ok(None)` for tags that are not block content.
    pub fn from_xml(element: &XmlElement) -> Result<Option<Block>> {
        let block = match element.name() {
            Paragraph::ELEMENT => Block::Paragraph(Paragraph::from_xml(element)?),
            List::ELEMENT => Block::List(List::from_xml(element)?),
            Table::ELEMENT => Block::Table(Table::from_xml(element)?),
            Callout::ELEMENT => Block::Callout(Callout::from_xml(element)?),
            _ => return Ok(None),
        };
        Ok(Some(block))
    }

    pub fn to_xml(&self) -> XmlElement {
        match self {
            Block::Paragraph(p) => p.to_xml(),
            Block::List(list) => list.to_xml(),
            Block::Table(table) => table.to_xml(),
            Block::Callout(callout) => callout.to_xml(),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Paragraph(p) => write!(f, "{p}"),
            Block::List(list) => write!(f, "{list}"),
            Block::Table(table) => write!(f, "{table}"),
            Block::Callout(callout) => write!(f, "{callout}"),
        }
    }
}

impl From<Paragraph> for Block {
    fn from(value: Paragraph) -> Self {
        Block::Paragraph(value)
    }
}

impl From<List> for Block {
    fn from(value: List) -> Self {
        Block::List(value)
    }
}

impl From<Table> for Block {
    fn from(value: Table) -> Self {
        Block::Table(value)
    }
}

impl From<Callout> for Block {
    fn from(value: Callout) -> Self {
        Block::Callout(value)
    }
}

/// Ordered block content, `<description>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Description {
    pub blocks: Vec<Block>,
}

impl Description {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn push(&mut self, block: impl Into<Block>) {
        self.blocks.push(block.into());
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, block: impl Into<Block>) -> Self {
        self.push(block);
        self
    }

    /// Reads the block children of any element, skipping other tags.
    fn read_blocks(element: &XmlElement, skip: &[&str]) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        for child in element.elements() {
            match Block::from_xml(child)? {
                Some(block) => blocks.push(block),
                None if skip.contains(&child.name()) => {}
                None => {
                    tracing::trace!(
                        parent = element.name(),
                        element = child.name(),
                        "skipping non-block element"
                    );
                }
            }
        }
        Ok(blocks)
    }

    fn write_blocks(&self, element: &mut XmlElement) {
        for block in &self.blocks {
            element.push_element(block.to_xml());
        }
    }
}

impl XmlMapping for Description {
    const ELEMENT: &'static str = "description";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;
        Ok(Self {
            blocks: Self::read_blocks(element, &[])?,
        })
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::ELEMENT);
        self.write_blocks(&mut element);
        element
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        Ok(())
    }
}

// ============================================================================
// List
// ============================================================================

/// Presentation style of a list.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ListType {
    #[default]
    Indent,
    Bullet,
    Number,
    Letter,
    Small,
    Roman,
    SmallRoman,
}

/// A list of items with an optional trailing footnote, `<list type="...">`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct List {
    pub list_type: ListType,
    pub items: Vec<ListItem>,
    pub footnote: Option<Footnote>,
}

impl List {
    pub fn new(list_type: ListType) -> Self {
        Self {
            list_type,
            ..Self::default()
        }
    }
}

impl XmlMapping for List {
    const ELEMENT: &'static str = "list";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;

        // Unknown or missing types fall back to the default rather than failing.
        let list_type = element
            .attribute("type")
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_default();

        let mut list = List::new(list_type);
        for child in element.elements() {
            match child.name() {
                ListItem::ELEMENT if list.footnote.is_none() => {
                    list.items.push(ListItem::from_xml(child)?);
                }
                Footnote::ELEMENT if list.footnote.is_none() => {
                    list.footnote = Some(Footnote::from_xml(child)?);
                }
                other => {
                    return Err(FormatError::UnexpectedElement {
                        parent: Self::ELEMENT,
                        child: other.to_string(),
                    });
                }
            }
        }
        Ok(list)
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::ELEMENT).with_attribute("type", self.list_type.to_string());
        for item in &self.items {
            element.push_element(item.to_xml());
        }
        if let Some(footnote) = &self.footnote {
            element.push_element(footnote.to_xml());
        }
        element
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, " - {item}")?;
        }
        if let Some(footnote) = &self.footnote {
            writeln!(f, "  {footnote}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Table
// ============================================================================

/// A row of cells, `<header>` or `<row>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableRow {
    pub header: bool,
    pub cells: Vec<TableCell>,
}

impl TableRow {
    pub const HEADER_ELEMENT: &'static str = "header";

    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            header: false,
            cells,
        }
    }

    pub fn header(cells: Vec<TableCell>) -> Self {
        Self {
            header: true,
            cells,
        }
    }

    fn tag(&self) -> &'static str {
        if self.header {
            Self::HEADER_ELEMENT
        } else {
            Self::ELEMENT
        }
    }
}

impl XmlMapping for TableRow {
    /// Body rows; header rows use [`TableRow::HEADER_ELEMENT`].
    const ELEMENT: &'static str = "row";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        let header = match element.name() {
            Self::HEADER_ELEMENT => true,
            Self::ELEMENT => false,
            other => {
                return Err(FormatError::WrongElement {
                    expected: "header> or <row",
                    found: other.to_string(),
                });
            }
        };

        let mut cells = Vec::new();
        for child in element.elements() {
            if !child.is(TableCell::ELEMENT) {
                return Err(FormatError::UnexpectedElement {
                    parent: if header { Self::HEADER_ELEMENT } else { Self::ELEMENT },
                    child: child.name().to_string(),
                });
            }
            cells.push(TableCell::from_xml(child)?);
        }
        Ok(Self { header, cells })
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(self.tag());
        for cell in &self.cells {
            element.push_element(cell.to_xml());
        }
        element
    }
}

impl fmt::Display for TableRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = self
            .cells
            .iter()
            .map(|cell| {
                if self.header {
                    format!(" *{cell}* ")
                } else {
                    format!(" {cell} ")
                }
            })
            .collect();
        f.write_str(&cells.join("|"))
    }
}

/// A table with optional title and header row, `<table>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    pub title: Option<String>,
    pub header_row: Option<TableRow>,
    pub rows: Vec<TableRow>,
    pub footnotes: Vec<Footnote>,
}

impl XmlMapping for Table {
    const ELEMENT: &'static str = "table";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;

        let mut table = Table::default();
        for child in element.elements() {
            match child.name() {
                "title" => {
                    if table.title.is_some() {
                        return Err(FormatError::DuplicateElement {
                            parent: Self::ELEMENT,
                            child: "title",
                        });
                    }
                    table.title = Some(child.text());
                }
                TableRow::HEADER_ELEMENT => {
                    if table.header_row.is_some() {
                        return Err(FormatError::DuplicateElement {
                            parent: Self::ELEMENT,
                            child: TableRow::HEADER_ELEMENT,
                        });
                    }
                    table.header_row = Some(TableRow::from_xml(child)?);
                }
                TableRow::ELEMENT => table.rows.push(TableRow::from_xml(child)?),
                Footnote::ELEMENT => table.footnotes.push(Footnote::from_xml(child)?),
                other => {
                    tracing::trace!(element = other, "skipping unknown table element");
                }
            }
        }
        Ok(table)
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::ELEMENT);
        if let Some(title) = &self.title {
            element.push_element(XmlElement::with_text_content("title", title.as_str()));
        }
        if let Some(header) = &self.header_row {
            element.push_element(header.to_xml());
        }
        for row in &self.rows {
            element.push_element(row.to_xml());
        }
        for footnote in &self.footnotes {
            element.push_element(footnote.to_xml());
        }
        element
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "{title}")?;
        }
        if let Some(header) = &self.header_row {
            writeln!(f, "{header}")?;
        }
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        for footnote in &self.footnotes {
            writeln!(f, "{footnote}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Callout
// ============================================================================

/// A boxed aside with an optional title, `<callout>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Callout {
    pub title: Option<String>,
    pub body: Description,
}

impl XmlMapping for Callout {
    const ELEMENT: &'static str = "callout";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;

        let mut title = None;
        for child in element.elements().filter(|child| child.is("title")) {
            if title.is_some() {
                return Err(FormatError::DuplicateElement {
                    parent: Self::ELEMENT,
                    child: "title",
                });
            }
            title = Some(child.text());
        }

        Ok(Self {
            title,
            body: Description {
                blocks: Description::read_blocks(element, &["title"])?,
            },
        })
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::ELEMENT);
        if let Some(title) = &self.title {
            element.push_element(XmlElement::with_text_content("title", title.as_str()));
        }
        self.body.write_blocks(&mut element);
        element
    }
}

impl fmt::Display for Callout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "{title}")?;
        }
        write!(f, "{}", self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<description>
  <p>First <em>paragraph</em>.</p>
  <list type="bullet">
    <listitem>One</listitem>
    <listitem>Two</listitem>
    <footnote mark="*">Optional</footnote>
  </list>
  <aside>ignored</aside>
  <table>
    <title>Effects</title>
    <header><cell>d4</cell><cell>Effect</cell></header>
    <row><cell>1</cell><cell>Nothing</cell></row>
    <row><cell>2-4</cell><cell>Sparks</cell></row>
    <footnote>Reroll duplicates.</footnote>
  </table>
  <callout>
    <title>Variant Rule</title>
    <p>Outer.</p>
    <callout><p>Inner.</p></callout>
  </callout>
</description>"#;

    #[test]
    fn dispatches_blocks_in_order() {
        let description = Description::from_xml_str(SAMPLE).unwrap();
        assert_eq!(description.blocks.len(), 4);
        assert!(matches!(description.blocks[0], Block::Paragraph(_)));
        assert!(matches!(description.blocks[1], Block::List(_)));
        assert!(matches!(description.blocks[2], Block::Table(_)));
        let Block::Callout(callout) = &description.blocks[3] else {
            panic!("expected callout");
        };
        assert_eq!(callout.title.as_deref(), Some("Variant Rule"));
        assert_eq!(callout.body.blocks.len(), 2);
        assert!(matches!(callout.body.blocks[1], Block::Callout(_)));
    }

    #[test]
    fn renders_blocks_without_separators() {
        let description = Description::from_xml_str(SAMPLE).unwrap();
        let expected = "First paragraph.\n\
                        \x20- One\n\
                        \x20- Two\n\
                        \x20 Optional\n\
                        Effects\n\
                        \x20*d4* | *Effect* \n\
                        \x201 | Nothing \n\
                        \x202-4 | Sparks \n\
                        Reroll duplicates.\n\
                        Variant Rule\n\
                        Outer.\n\
                        Inner.\n";
        assert_eq!(description.to_string(), expected);
    }

    #[test]
    fn round_trips_structure() {
        let source = XmlElement::parse(SAMPLE).unwrap();
        let description = Description::from_xml(&source).unwrap();
        let written = description.to_xml();

        // The unknown <aside> is dropped; everything else survives.
        let reparsed = Description::from_xml(&written).unwrap();
        assert_eq!(reparsed, description);
        let xml = written.to_xml_string(2).unwrap();
        assert!(XmlElement::parse(&xml).unwrap().structurally_eq(&written));
    }

    #[test]
    fn list_type_defaults_to_indent() {
        let bogus = List::from_xml_str(r#"<list type="bogus"><listitem>a</listitem></list>"#)
            .unwrap();
        assert_eq!(bogus.list_type, ListType::Indent);

        let missing = List::from_xml_str("<list><listitem>a</listitem></list>").unwrap();
        assert_eq!(missing.list_type, ListType::Indent);

        let roman = List::from_xml_str(r#"<list type="smallroman"/>"#).unwrap();
        assert_eq!(roman.list_type, ListType::SmallRoman);
        assert_eq!(roman.to_xml().attribute("type"), Some("smallroman"));
    }

    #[test]
    fn list_rejects_unexpected_children() {
        let err = List::from_xml_str("<list><p>nope</p></list>").unwrap_err();
        assert!(err.is_invalid_format());
        assert!(err.to_string().contains("unexpected element <p>"));

        let err = List::from_xml_str(
            "<list><listitem>a</listitem><footnote>x</footnote><listitem>b</listitem></list>",
        )
        .unwrap_err();
        assert!(err.is_invalid_format());
    }

    #[test]
    fn table_rows_only_hold_cells() {
        let err = Table::from_xml_str("<table><row><cell>1</cell><p>2</p></row></table>")
            .unwrap_err();
        assert!(err.is_invalid_format());

        let err = Table::from_xml_str("<table><header/><header/></table>").unwrap_err();
        assert!(err.is_invalid_format());
    }

    #[test]
    fn header_row_is_marked() {
        let table = Table::from_xml_str(
            "<table><header><cell>A</cell></header><row><cell>b</cell></row></table>",
        )
        .unwrap();
        assert!(table.header_row.as_ref().unwrap().header);
        assert!(!table.rows[0].header);
        assert_eq!(table.to_xml().elements().next().unwrap().name(), "header");
    }

    #[test]
    fn wrong_root_is_an_argument_error() {
        let err = Description::from_xml_str("<p>text</p>").unwrap_err();
        assert!(err.is_argument());
    }
}
