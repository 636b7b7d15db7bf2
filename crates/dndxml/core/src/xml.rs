//! Owned XML element tree.
//!
//! Entity constructors work against this small tree instead of a streaming
//! reader so that dispatch can look at a whole element (its attributes and all
//! of its children) at once. The tree keeps mixed content in document order,
//! which the rich-text model relies on to rebuild inline span offsets.
//!
//! Parsing and writing are delegated to `quick-xml`.

use std::borrow::Cow;
use std::io::Write;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{FormatError, Result};

/// A node inside an element: either a child element or a run of text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An XML element with its attributes and children.
///
/// Names are stored without their namespace prefix; the resolved namespace
/// URI (if any) is kept separately.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
    inline: bool,
}

impl XmlElement {
    /// Creates an empty structural element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates an empty element whose content is inline text.
    ///
    /// Inline elements are written without indentation so that whitespace
    /// never leaks into their text.
    pub fn inline(name: impl Into<String>) -> Self {
        Self {
            inline: true,
            ..Self::new(name)
        }
    }

    /// Creates an inline element holding a single text run.
    pub fn with_text_content(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::inline(name);
        element.push_text(text);
        element
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace URI this element resolved to when parsed.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Sets an attribute, replacing any previous value for the same key.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Builder-style [`set_attribute`](Self::set_attribute).
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Child elements in document order, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn push_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    /// Builder-style [`push_element`](Self::push_element).
    #[must_use]
    pub fn with_child(mut self, element: XmlElement) -> Self {
        self.push_element(element);
        self
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        // Adjacent runs merge so the tree matches what a parser would build.
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// Concatenated text of this element and all of its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Whether the element carries inline content and must be written compactly.
    fn is_mixed(&self) -> bool {
        self.inline
            || self
                .children
                .iter()
                .any(|node| matches!(node, XmlNode::Text(t) if !t.trim().is_empty()))
    }

    /// Compares two trees ignoring attribute order and insignificant whitespace.
    ///
    /// Whitespace-only text is insignificant inside structural elements (those
    /// without any other text); inside inline content every character counts.
    pub fn structurally_eq(&self, other: &XmlElement) -> bool {
        if self.name != other.name || self.attributes.len() != other.attributes.len() {
            return false;
        }
        let attributes_match = self
            .attributes
            .iter()
            .all(|(k, v)| other.attribute(k) == Some(v.as_str()));
        if !attributes_match {
            return false;
        }

        let mine = self.significant_children();
        let theirs = other.significant_children();
        mine.len() == theirs.len()
            && mine.iter().zip(theirs.iter()).all(|pair| match pair {
                (XmlNode::Text(a), XmlNode::Text(b)) => a == b,
                (XmlNode::Element(a), XmlNode::Element(b)) => a.structurally_eq(b),
                _ => false,
            })
    }

    fn significant_children(&self) -> Vec<&XmlNode> {
        let mixed = self.children.iter().any(|node| match node {
            XmlNode::Text(t) => !t.trim().is_empty(),
            XmlNode::Element(_) => false,
        });
        self.children
            .iter()
            .filter(|node| mixed || matches!(node, XmlNode::Element(_)))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------------

    /// Parses an XML document and returns its root element.
    pub fn parse(input: &str) -> Result<XmlElement> {
        let mut reader = Reader::from_str(input);
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader.read_event().map_err(|e| syntax(position, e))?;
            match event {
                Event::Start(start) => {
                    let open = OpenElement::from_start(&start, &stack, position)?;
                    stack.push(open);
                }
                Event::Empty(start) => {
                    let open = OpenElement::from_start(&start, &stack, position)?;
                    attach(&mut stack, &mut root, open.element, position)?;
                }
                Event::End(_) => {
                    let open = stack.pop().ok_or_else(|| FormatError::Syntax {
                        position,
                        message: "unbalanced closing tag".into(),
                    })?;
                    attach(&mut stack, &mut root, open.element, position)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| syntax(position, e))?;
                    push_text(&mut stack, text, position)?;
                }
                Event::CData(data) => {
                    let text = std::str::from_utf8(&data).map_err(|e| syntax(position, e))?;
                    push_text(&mut stack, Cow::Borrowed(text), position)?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctypes.
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(FormatError::Syntax {
                position: reader.buffer_position() as u64,
                message: "unexpected end of input".into(),
            });
        }
        root.ok_or_else(|| FormatError::Syntax {
            position: 0,
            message: "document has no root element".into(),
        })
    }

    // ------------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------------

    /// Writes this element as a UTF-8 document with an XML declaration.
    pub fn to_xml_string(&self, indent: usize) -> Result<String> {
        let mut writer = if indent == 0 {
            Writer::new(Vec::new())
        } else {
            Writer::new_with_indent(Vec::new(), b' ', indent)
        };
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        write_element(&mut writer, self)?;
        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(write_error)
    }

    /// Writes this element without a declaration or indentation.
    pub fn to_fragment_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner()).map_err(write_error)
    }
}

/// An element still being filled, plus the namespace bindings it declared.
struct OpenElement {
    element: XmlElement,
    bindings: Vec<(String, String)>,
}

impl OpenElement {
    fn from_start(start: &BytesStart<'_>, stack: &[OpenElement], position: u64) -> Result<Self> {
        let qname = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| syntax(position, e))?
            .to_string();

        let mut attributes = Vec::new();
        let mut bindings = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| syntax(position, e))?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|e| syntax(position, e))?
                .to_string();
            let value = attribute
                .unescape_value()
                .map_err(|e| syntax(position, e))?
                .into_owned();
            if key == "xmlns" {
                bindings.push((String::new(), value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                bindings.push((prefix.to_string(), value.clone()));
            }
            attributes.push((key, value));
        }

        let (prefix, local) = match qname.split_once(':') {
            Some((prefix, local)) => (prefix, local.to_string()),
            None => ("", qname.clone()),
        };
        let namespace = bindings
            .iter()
            .rev()
            .chain(stack.iter().rev().flat_map(|open| open.bindings.iter().rev()))
            .find(|(bound, _)| bound == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty());

        Ok(Self {
            element: XmlElement {
                name: local,
                namespace,
                attributes,
                children: Vec::new(),
                inline: false,
            },
            bindings,
        })
    }
}

fn attach(
    stack: &mut [OpenElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    position: u64,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.element.push_element(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(FormatError::Syntax {
            position,
            message: "multiple root elements".into(),
        }),
    }
}

fn push_text(stack: &mut [OpenElement], text: Cow<'_, str>, position: u64) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.element.push_text(text.into_owned());
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(FormatError::Syntax {
            position,
            message: "text outside the root element".into(),
        }),
    }
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    if element.is_mixed() {
        // Serialize inline content on its own so the indenting writer never
        // inserts line breaks between text runs and span elements.
        let mut inner = Writer::new(Vec::new());
        for node in &element.children {
            match node {
                XmlNode::Text(text) => inner
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(write_error)?,
                XmlNode::Element(child) => write_element(&mut inner, child)?,
            }
        }
        let raw = String::from_utf8(inner.into_inner()).map_err(write_error)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped(raw)))
            .map_err(write_error)?;
    } else {
        for child in element.elements() {
            write_element(writer, child)?;
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_error)
}

fn syntax(position: u64, error: impl std::fmt::Display) -> FormatError {
    FormatError::Syntax {
        position,
        message: error.to_string(),
    }
}

fn write_error(error: impl std::fmt::Display) -> FormatError {
    FormatError::Write(error.to_string())
}
