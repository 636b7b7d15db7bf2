//! Typed entities for tabletop reference content and their XML mapping.
//!
//! `dndxml-core` models spells, magic items, creatures and random lookup
//! tables, each carrying a rich-text [`Description`]. Every entity is built
//! from an [`XmlElement`] through [`XmlMapping::from_xml`], written back with
//! [`XmlMapping::to_xml`], and rendered to readable text through `Display`.
//! Document-level reading and writing live in the `dndxml-document` crate.
pub mod creature;
pub mod description;
pub mod error;
pub mod item;
pub mod lookup;
pub mod mapping;
pub mod spell;
pub mod text;
pub mod vocab;
pub mod xml;

pub use creature::{
    Ability, AbilityScores, Alignment, Creature, CreatureSize, CreatureType, Flight,
    LegendaryAction, Sense, Skill, Speeds,
};
pub use description::{Block, Callout, Description, List, ListType, Table, TableRow};
pub use error::{ErrorKind, FormatError, Result};
pub use item::{ItemType, MagicItem, Rarity};
pub use lookup::{
    Coinage, CoinageResult, ItemResult, LookupColumn, LookupResult, LookupTable, RandomRoll,
    TableRoll,
};
pub use mapping::XmlMapping;
pub use spell::{Spell, SpellClass, SpellSchool, UnitType, UnitValue};
pub use text::{Footnote, ListItem, Paragraph, Span, SpanKind, TableCell, Text};
pub use vocab::FlagTokens;
pub use xml::{XmlElement, XmlNode};
