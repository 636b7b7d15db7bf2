//! Rich text: a plain-text run annotated with positional inline spans.
//!
//! # Span Invariant
//!
//! Spans are sorted by `start`, never overlap, and always lie within the
//! plain text. Offsets are byte offsets into [`Text::plain_text`]. The
//! invariant holds by construction: [`Text::append`] records the current length
//! before mutating the buffer, and [`Text::add_span`] refuses anything that
//! would break it.
//!
//! # XML Shape
//!
//! ```xml
//! <p>Make a <em>Dexterity</em> saving throw (see <ref>Conditions</ref>)<fn>*</fn>.</p>
//! ```
//!
//! Text children become plain runs; `em`, `ref` and `fn` children become spans
//! over their text. Other child elements are ignored.

use std::fmt;

use crate::error::{FormatError, Result};
use crate::mapping::XmlMapping;
use crate::vocab::expect_element;
use crate::xml::{XmlElement, XmlNode};

/// Kind of inline annotation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpanKind {
    /// Emphasised text, `<em>`.
    #[strum(serialize = "em")]
    Emphasis,
    /// Cross-reference to another entry, `<ref>`.
    #[strum(serialize = "ref")]
    Reference,
    /// Footnote marker, `<fn>`.
    #[strum(serialize = "fn")]
    FootnoteMark,
}

/// A span over `length` bytes starting at `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub kind: SpanKind,
    pub start: usize,
    pub length: usize,
}

impl Span {
    pub const fn end(&self) -> usize {
        self.start.saturating_add(self.length)
    }
}

/// Plain text plus inline spans.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TextParts"))]
pub struct Text {
    plain_text: String,
    spans: Vec<Span>,
}

/// Deserialized fields of a [`Text`], checked before use.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct TextParts {
    plain_text: String,
    spans: Vec<Span>,
}

#[cfg(feature = "serde")]
impl TryFrom<TextParts> for Text {
    type Error = FormatError;

    fn try_from(parts: TextParts) -> Result<Self> {
        let text = Text {
            plain_text: parts.plain_text,
            spans: parts.spans,
        };
        text.validate()?;
        Ok(text)
    }
}

impl Text {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.plain_text.is_empty()
    }

    /// Appends a run, optionally covered by a span of the given kind.
    pub fn append(&mut self, text: &str, kind: Option<SpanKind>) {
        let start = self.plain_text.len();
        self.plain_text.push_str(text);
        if let Some(kind) = kind {
            self.spans.push(Span {
                kind,
                start,
                length: text.len(),
            });
        }
    }

    /// Builder-style [`append`](Self::append).
    #[must_use]
    pub fn with(mut self, text: &str, kind: Option<SpanKind>) -> Self {
        self.append(text, kind);
        self
    }

    /// Annotates existing text.
    ///
    /// The span must start at or after the end of the last span, lie within
    /// the text, and fall on character boundaries.
    pub fn add_span(&mut self, kind: SpanKind, start: usize, length: usize) -> Result<()> {
        let span = Span {
            kind,
            start,
            length,
        };
        let previous_end = self.spans.last().map_or(0, Span::end);
        if span.start < previous_end {
            return Err(FormatError::InvalidSpans(format!(
                "span at {start} overlaps or precedes the span ending at {previous_end}"
            )));
        }
        self.check_bounds(&span)?;
        self.spans.push(span);
        Ok(())
    }

    /// Checks the span invariant.
    pub fn validate(&self) -> Result<()> {
        let mut previous_end = 0;
        for span in &self.spans {
            if span.start < previous_end {
                return Err(FormatError::InvalidSpans(format!(
                    "span at {} overlaps or precedes the span ending at {previous_end}",
                    span.start
                )));
            }
            self.check_bounds(span)?;
            previous_end = span.end();
        }
        Ok(())
    }

    fn check_bounds(&self, span: &Span) -> Result<()> {
        let len = self.plain_text.len();
        if span.end() > len
            || !self.plain_text.is_char_boundary(span.start)
            || !self.plain_text.is_char_boundary(span.end())
        {
            return Err(FormatError::InvalidSpans(format!(
                "span {}..{} is outside text of length {len}",
                span.start,
                span.end()
            )));
        }
        Ok(())
    }

    /// Text covered by a span; `None` when the span does not fit this text.
    pub fn span_text(&self, span: &Span) -> Option<&str> {
        self.plain_text.get(span.start..span.end())
    }

    /// Reads the mixed content of an element, whatever its tag.
    pub fn from_content(element: &XmlElement) -> Self {
        let mut text = Text::new();
        for node in element.children() {
            match node {
                XmlNode::Text(run) => text.append(run, None),
                XmlNode::Element(child) => match child.name().parse::<SpanKind>() {
                    Ok(kind) => text.append(&child.text(), Some(kind)),
                    Err(_) => {
                        tracing::trace!(element = child.name(), "ignoring unknown inline element");
                    }
                },
            }
        }
        text
    }

    /// Writes the runs and spans as mixed content of `element`.
    pub fn write_content(&self, element: &mut XmlElement) {
        let mut cursor = 0;
        for span in &self.spans {
            if span.start > cursor {
                element.push_text(&self.plain_text[cursor..span.start]);
            }
            element.push_element(XmlElement::with_text_content(
                span.kind.to_string(),
                self.span_text(span).unwrap_or_default(),
            ));
            cursor = span.end();
        }
        if cursor < self.plain_text.len() {
            element.push_text(&self.plain_text[cursor..]);
        }
    }

    /// Wraps the content in an inline element with the given tag.
    pub fn to_element(&self, name: &str) -> XmlElement {
        let mut element = XmlElement::inline(name);
        self.write_content(&mut element);
        element
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Text::new().with(value, None)
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Text {
            plain_text: value,
            spans: Vec::new(),
        }
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain_text)
    }
}

/// Defines a rich-text node that is a [`Text`] under a fixed tag.
macro_rules! text_node {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name {
            pub text: Text,
        }

        impl $name {
            pub fn new(text: impl Into<Text>) -> Self {
                Self { text: text.into() }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl XmlMapping for $name {
            const ELEMENT: &'static str = $tag;

            fn from_xml(element: &XmlElement) -> Result<Self> {
                expect_element(element, Self::ELEMENT)?;
                Ok(Self {
                    text: Text::from_content(element),
                })
            }

            fn to_xml(&self) -> XmlElement {
                self.text.to_element(Self::ELEMENT)
            }
        }
    };
}

text_node!(
    /// A paragraph of prose, `<p>`.
    Paragraph,
    "p"
);

text_node!(
    /// An entry in a [`List`](crate::description::List), `<listitem>`.
    ListItem,
    "listitem"
);

text_node!(
    /// A table cell, `<cell>`.
    TableCell,
    "cell"
);

impl fmt::Display for Paragraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.text)
    }
}

impl fmt::Display for ListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl fmt::Display for TableCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A footnote attached to a list or table, `<footnote mark="*">`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Footnote {
    pub mark: Option<String>,
    pub text: Text,
}

impl Footnote {
    pub const DEFAULT_MARK: &'static str = "*";

    pub fn new(text: impl Into<Text>) -> Self {
        Self {
            mark: Some(Self::DEFAULT_MARK.to_string()),
            text: text.into(),
        }
    }
}

impl XmlMapping for Footnote {
    const ELEMENT: &'static str = "footnote";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;
        Ok(Self {
            mark: element.attribute("mark").map(str::to_string),
            text: Text::from_content(element),
        })
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = self.text.to_element(Self::ELEMENT);
        if let Some(mark) = &self.mark {
            element.set_attribute("mark", mark.as_str());
        }
        element
    }
}

impl fmt::Display for Footnote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_records_offsets_before_mutation() {
        let mut text = Text::new();
        text.append("Make a ", None);
        text.append("Dexterity", Some(SpanKind::Emphasis));
        text.append(" save, see ", None);
        text.append("Conditions", Some(SpanKind::Reference));

        assert_eq!(text.plain_text(), "Make a Dexterity save, see Conditions");
        assert_eq!(
            text.spans(),
            &[
                Span {
                    kind: SpanKind::Emphasis,
                    start: 7,
                    length: 9
                },
                Span {
                    kind: SpanKind::Reference,
                    start: 27,
                    length: 10
                },
            ]
        );
        assert_eq!(text.span_text(&text.spans()[0]), Some("Dexterity"));
        text.validate().unwrap();
    }

    #[test]
    fn span_text_outside_the_text_is_none() {
        let text = Text::new().with("caf\u{e9} ", None).with("noir", Some(SpanKind::Emphasis));
        let past_end = Span {
            kind: SpanKind::Emphasis,
            start: 6,
            length: 40,
        };
        let mid_char = Span {
            kind: SpanKind::Emphasis,
            start: 4,
            length: 1,
        };
        let huge = Span {
            kind: SpanKind::Reference,
            start: usize::MAX,
            length: usize::MAX,
        };
        assert_eq!(text.span_text(&text.spans()[0]), Some("noir"));
        assert_eq!(text.span_text(&past_end), None);
        assert_eq!(text.span_text(&mid_char), None);
        assert_eq!(text.span_text(&huge), None);

        let mut annotated = text.clone();
        assert!(annotated.add_span(SpanKind::Reference, usize::MAX, usize::MAX).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialized_spans_are_checked() {
        let text = Text::new().with("noir", Some(SpanKind::Emphasis));
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(serde_json::from_str::<Text>(&json).unwrap(), text);

        let stretched = json.replace(r#""length":4"#, r#""length":9"#);
        assert_ne!(stretched, json);
        assert!(serde_json::from_str::<Text>(&stretched).is_err());
    }

    #[test]
    fn arbitrary_append_sequences_keep_the_invariant() {
        let runs = ["", "a", "bcd", "ü", "", "xyz", "—", "q"];
        let kinds = [
            None,
            Some(SpanKind::Emphasis),
            Some(SpanKind::Reference),
            Some(SpanKind::FootnoteMark),
        ];
        for seed in 0..64usize {
            let mut text = Text::new();
            for step in 0..12usize {
                let run = runs[(seed * 7 + step * 3) % runs.len()];
                let kind = kinds[(seed + step * 5) % kinds.len()];
                text.append(run, kind);
            }
            text.validate().unwrap();
            let mut previous_end = 0;
            for span in text.spans() {
                assert!(span.start >= previous_end);
                assert!(span.end() <= text.plain_text().len());
                previous_end = span.end();
            }
        }
    }

    #[test]
    fn add_span_rejects_overlap_and_out_of_bounds() {
        let mut text = Text::from("The quick brown fox");
        text.add_span(SpanKind::Emphasis, 4, 5).unwrap();

        let err = text.add_span(SpanKind::Reference, 6, 3).unwrap_err();
        assert!(err.is_invalid_format());

        let err = text.add_span(SpanKind::Reference, 16, 10).unwrap_err();
        assert!(err.is_invalid_format());

        text.add_span(SpanKind::Reference, 16, 3).unwrap();
        assert_eq!(text.spans().len(), 2);
    }

    #[test]
    fn parses_inline_spans_and_ignores_unknown_elements() {
        let element =
            XmlElement::parse("<p>Roll <em>initiative</em><b>!</b> then <fn>1</fn></p>").unwrap();
        let paragraph = Paragraph::from_xml(&element).unwrap();

        assert_eq!(paragraph.text.plain_text(), "Roll initiative then 1");
        let kinds: Vec<_> = paragraph.text.spans().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SpanKind::Emphasis, SpanKind::FootnoteMark]);
        assert_eq!(paragraph.to_string(), "Roll initiative then 1\n");
    }

    #[test]
    fn serialization_reproduces_offsets() {
        let source = "<p><em>Lead</em> middle <ref>Target</ref> tail</p>";
        let paragraph = Paragraph::from_xml_str(source).unwrap();
        let written = paragraph.to_xml();

        assert!(written.structurally_eq(&XmlElement::parse(source).unwrap()));

        let reparsed = Paragraph::from_xml(&written).unwrap();
        assert_eq!(reparsed, paragraph);
    }

    #[test]
    fn wrong_tag_is_an_argument_error() {
        let element = XmlElement::parse("<listitem>x</listitem>").unwrap();
        let err = Paragraph::from_xml(&element).unwrap_err();
        assert!(err.is_argument());
    }

    #[test]
    fn footnote_keeps_its_mark() {
        let footnote = Footnote::from_xml_str(r#"<footnote mark="†">See page 12.</footnote>"#)
            .unwrap();
        assert_eq!(footnote.mark.as_deref(), Some("†"));
        assert_eq!(footnote.to_string(), "See page 12.");
        assert_eq!(footnote.to_xml().attribute("mark"), Some("†"));

        assert_eq!(Footnote::new("x").mark.as_deref(), Some("*"));
    }
}
