use dndxml_core::{Creature, LookupTable, MagicItem, Spell, XmlElement, XmlMapping};

use crate::NAMESPACE;
use crate::ROOT_ELEMENT;

/// One of the four entity collections a document may hold.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Collection {
    Spells,
    Items,
    Creatures,
    Lookups,
}

impl Collection {
    /// Tag of the collection element, e.g. `spells`.
    pub const fn element(&self) -> &'static str {
        match self {
            Self::Spells => "spells",
            Self::Items => "items",
            Self::Creatures => "creatures",
            Self::Lookups => "lookups",
        }
    }

    /// Tag of the entity elements it contains, e.g. `spell`.
    pub const fn entry(&self) -> &'static str {
        match self {
            Self::Spells => Spell::ELEMENT,
            Self::Items => MagicItem::ELEMENT,
            Self::Creatures => Creature::ELEMENT,
            Self::Lookups => LookupTable::ELEMENT,
        }
    }

    pub fn from_element(name: &str) -> Option<Self> {
        <Self as strum::IntoEnumIterator>::iter().find(|c| c.element() == name)
    }
}

/// Everything read from, or to be written to, one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentContent {
    pub spells: Vec<Spell>,
    pub items: Vec<MagicItem>,
    pub creatures: Vec<Creature>,
    pub lookups: Vec<LookupTable>,
}

impl DocumentContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when all four collections are empty.
    pub fn is_empty(&self) -> bool {
        <Collection as strum::IntoEnumIterator>::iter().all(|c| self.len(c) == 0)
    }

    /// Number of entities in one collection.
    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Spells => self.spells.len(),
            Collection::Items => self.items.len(),
            Collection::Creatures => self.creatures.len(),
            Collection::Lookups => self.lookups.len(),
        }
    }

    /// Rendered text of every entity in one collection, in document order.
    pub fn render(&self, collection: Collection) -> Vec<String> {
        match collection {
            Collection::Spells => self.spells.iter().map(ToString::to_string).collect(),
            Collection::Items => self.items.iter().map(ToString::to_string).collect(),
            Collection::Creatures => self.creatures.iter().map(ToString::to_string).collect(),
            Collection::Lookups => self.lookups.iter().map(ToString::to_string).collect(),
        }
    }

    /// Builds the namespaced root holding every non-empty collection.
    pub fn to_element(&self) -> XmlElement {
        let mut root = XmlElement::new(ROOT_ELEMENT).with_attribute("xmlns", NAMESPACE);
        for collection in <Collection as strum::IntoEnumIterator>::iter() {
            let entries = self.entries(collection);
            if entries.is_empty() {
                continue;
            }
            let mut element = XmlElement::new(collection.element());
            for entry in entries {
                element.push_element(entry);
            }
            root.push_element(element);
        }
        root
    }

    fn entries(&self, collection: Collection) -> Vec<XmlElement> {
        match collection {
            Collection::Spells => self.spells.iter().map(XmlMapping::to_xml).collect(),
            Collection::Items => self.items.iter().map(XmlMapping::to_xml).collect(),
            Collection::Creatures => self.creatures.iter().map(XmlMapping::to_xml).collect(),
            Collection::Lookups => self.lookups.iter().map(XmlMapping::to_xml).collect(),
        }
    }
}
