//! Error infrastructure for dndxml-core.
//!
//! Every fallible operation in the crate returns [`FormatError`]. Variants are
//! grouped into three kinds so callers can tell a programming mistake apart
//! from bad input data:
//!
//! - **Argument**: the caller handed a constructor the wrong element, or an
//!   invalid combination of values when building an entity programmatically.
//! - **InvalidFormat**: the document is well-formed XML but breaks the
//!   dialect (missing attribute, unknown enumeration token, level out of
//!   range, stray element inside a list, ...).
//! - **Syntax**: the input is not well-formed XML at all.
//!
//! Validation is eager: a malformed nested element aborts construction of the
//! whole entity, so there is never a partially built value.

/// Classification of a [`FormatError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller error - wrong element kind or invalid constructor arguments.
    Argument,

    /// Data error - the XML violates the dialect.
    InvalidFormat,

    /// The text could not be tokenized as XML.
    Syntax,
}

impl ErrorKind {
    /// Returns a human-readable name for this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Argument => "argument",
            Self::InvalidFormat => "invalid format",
            Self::Syntax => "syntax",
        }
    }
}

/// Errors raised while mapping between XML and entities.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// A constructor received an element with the wrong tag.
    #[error("input is not a <{expected}> element (found <{found}>)")]
    WrongElement {
        expected: &'static str,
        found: String,
    },

    /// Invalid values supplied while building an entity in code.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A mandatory attribute is absent.
    #[error("<{element}> element must have a '{attribute}' attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// A mandatory child element is absent.
    #[error("<{parent}> element must contain a <{child}> element")]
    MissingElement {
        parent: &'static str,
        child: &'static str,
    },

    /// A value failed enumeration, numeric or range validation.
    #[error("invalid {field} value '{value}'")]
    InvalidValue { field: &'static str, value: String },

    /// A child element that the parent does not allow.
    #[error("unexpected element <{child}> encountered within <{parent}>")]
    UnexpectedElement { parent: &'static str, child: String },

    /// A child element that may appear at most once appeared again.
    #[error("<{parent}> element may contain only one <{child}> element")]
    DuplicateElement {
        parent: &'static str,
        child: &'static str,
    },

    /// The entity failed its post-construction validity pass.
    #[error("{0}")]
    Invalid(String),

    /// Inline spans are out of order, overlapping or out of bounds.
    #[error("invalid text spans: {0}")]
    InvalidSpans(String),

    /// The input is not well-formed XML.
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// Writing the element tree failed.
    #[error("XML write error: {0}")]
    Write(String),
}

impl FormatError {
    /// Returns the kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::WrongElement { .. } | Self::InvalidArgument(_) => ErrorKind::Argument,
            Self::MissingAttribute { .. }
            | Self::MissingElement { .. }
            | Self::InvalidValue { .. }
            | Self::UnexpectedElement { .. }
            | Self::DuplicateElement { .. }
            | Self::Invalid(_)
            | Self::InvalidSpans(_) => ErrorKind::InvalidFormat,
            Self::Syntax { .. } | Self::Write(_) => ErrorKind::Syntax,
        }
    }

    /// Returns true if this error is a caller mistake rather than bad data.
    pub const fn is_argument(&self) -> bool {
        matches!(self.kind(), ErrorKind::Argument)
    }

    /// Returns true if this error reports data that breaks the dialect.
    pub const fn is_invalid_format(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidFormat)
    }

    pub(crate) fn invalid_value(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_classified() {
        let wrong = FormatError::WrongElement {
            expected: "spell",
            found: "bob".into(),
        };
        assert!(wrong.is_argument());
        assert_eq!(wrong.to_string(), "input is not a <spell> element (found <bob>)");

        let missing = FormatError::MissingAttribute {
            element: "item",
            attribute: "rarity",
        };
        assert!(missing.is_invalid_format());
        assert_eq!(
            missing.to_string(),
            "<item> element must have a 'rarity' attribute"
        );

        let syntax = FormatError::Syntax {
            position: 3,
            message: "unexpected end".into(),
        };
        assert_eq!(syntax.kind(), ErrorKind::Syntax);
        assert_eq!(syntax.kind().as_str(), "syntax");
    }
}
