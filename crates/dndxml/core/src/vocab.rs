//! Token vocabulary shared by every entity parser.
//!
//! - Boolean attributes accept `true/yes/t/y` and `false/no/f/n` in any case.
//! - Enumeration tokens are written with spaces in documents ("very rare",
//!   "lawful good") and matched against snake_case variant names, so spaces
//!   and hyphens normalise to underscores before lookup.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{FormatError, Result};
use crate::xml::XmlElement;

/// Interprets a boolean token, returning `None` for anything outside the
/// vocabulary.
pub fn parse_bool(token: &str) -> Option<bool> {
    match token.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "t" | "y" => Some(true),
        "false" | "no" | "f" | "n" => Some(false),
        _ => None,
    }
}

/// Boolean attributes as they were spelled in the source document.
///
/// Entities keep one of these so that writing them back reproduces `yes`,
/// `Y` or an explicit `false` instead of a normalised `true`. Keys name the
/// attribute, qualified by element when the same flag may sit on more than
/// one element. Spellings never take part in equality.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlagTokens(BTreeMap<String, String>);

impl PartialEq for FlagTokens {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for FlagTokens {}

impl FlagTokens {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the source carried the flag stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The source spelling stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Reads an optional boolean attribute and remembers its spelling.
    ///
    /// Tokens outside the vocabulary are rejected rather than guessed.
    pub fn read(
        &mut self,
        key: &str,
        element: &XmlElement,
        attribute: &'static str,
    ) -> Result<Option<bool>> {
        let Some(raw) = element.attribute(attribute) else {
            return Ok(None);
        };
        let value = parse_bool(raw).ok_or_else(|| FormatError::invalid_value(attribute, raw))?;
        self.0.insert(key.to_string(), raw.to_string());
        Ok(Some(value))
    }

    /// Token to write for the flag under `key`, or `None` to leave it out.
    ///
    /// The source spelling is reused while it still means `value`. Otherwise a
    /// set flag is written as `true`, and a cleared one as `false` only when
    /// the source spelled it out.
    pub fn token(&self, key: &str, value: bool) -> Option<String> {
        match self.0.get(key) {
            Some(raw) if parse_bool(raw) == Some(value) => Some(raw.clone()),
            Some(_) => Some(value.to_string()),
            None if value => Some("true".to_string()),
            None => None,
        }
    }

    /// Sets `attribute` on `element` to the token for `key`, if any.
    pub fn write(&self, element: &mut XmlElement, key: &str, attribute: &str, value: bool) {
        if let Some(token) = self.token(key, value) {
            element.set_attribute(attribute, token);
        }
    }
}

/// Parses an enumeration token.
pub fn parse_token<T: FromStr>(field: &'static str, raw: &str) -> Result<T> {
    let normalized: String = raw
        .trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    normalized
        .parse()
        .map_err(|_| FormatError::invalid_value(field, raw.trim()))
}

/// Renders an enumeration value the way documents spell it.
pub fn token_text(value: impl AsRef<str>) -> String {
    value.as_ref().replace('_', " ")
}

/// Capitalizes the first character of a string.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parses a numeric value, accepting a leading `+`.
pub fn parse_number<T: FromStr>(field: &'static str, raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .parse()
        .map_err(|_| FormatError::invalid_value(field, trimmed))
}

/// Reads a mandatory numeric attribute.
pub fn required_number<T: FromStr>(
    element: &XmlElement,
    element_name: &'static str,
    attribute: &'static str,
) -> Result<T> {
    let raw = element
        .attribute(attribute)
        .ok_or(FormatError::MissingAttribute {
            element: element_name,
            attribute,
        })?;
    parse_number(attribute, raw)
}

/// Reads an optional numeric attribute.
pub fn optional_number<T: FromStr>(element: &XmlElement, attribute: &'static str) -> Result<Option<T>> {
    element
        .attribute(attribute)
        .map(|raw| parse_number(attribute, raw))
        .transpose()
}

/// Reads a mandatory string attribute.
pub fn required_attribute(
    element: &XmlElement,
    element_name: &'static str,
    attribute: &'static str,
) -> Result<String> {
    element
        .attribute(attribute)
        .map(str::to_string)
        .ok_or(FormatError::MissingAttribute {
            element: element_name,
            attribute,
        })
}

/// Formats a modifier with an explicit sign (`+3`, `-1`, `+0`).
pub fn signed(value: i32) -> String {
    if value < 0 {
        value.to_string()
    } else {
        format!("+{value}")
    }
}

/// Formats an integer with comma thousands separators.
pub fn thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Rejects an element whose tag does not match the expected one.
pub fn expect_element(element: &XmlElement, expected: &'static str) -> Result<()> {
    if element.is(expected) {
        Ok(())
    } else {
        Err(FormatError::WrongElement {
            expected,
            found: element.name().to_string(),
        })
    }
}

/// Treats empty optional strings as absent for display purposes.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
