//! The contract between element trees and typed values.

use crate::error::Result;
use crate::xml::XmlElement;

/// A value with a fixed XML shape.
///
/// Every entity and every description node implements this trait. `from_xml`
/// validates the element eagerly and fails on the first problem; `to_xml` is
/// its structural inverse.
pub trait XmlMapping: Sized {
    /// Tag of the element this type is read from and written to.
    const ELEMENT: &'static str;

    /// Builds a value from an element, validating its shape.
    fn from_xml(element: &XmlElement) -> Result<Self>;

    /// Writes the value back to an element.
    fn to_xml(&self) -> XmlElement;

    /// Parses XML text whose root is this type's element.
    fn from_xml_str(input: &str) -> Result<Self> {
        Self::from_xml(&XmlElement::parse(input)?)
    }
}
