//! Magic items.

use std::fmt;

use crate::description::Description;
use crate::error::{FormatError, Result};
use crate::mapping::XmlMapping;
use crate::vocab::{FlagTokens, capitalize, expect_element, non_empty, parse_token, token_text};
use crate::xml::XmlElement;

/// Broad category of a magic item.
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ItemType {
    Armor,
    Potion,
    Ring,
    Rod,
    Scroll,
    Staff,
    Wand,
    Weapon,
    #[default]
    WondrousItem,
}

/// How hard an item is to come by.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Rarity {
    Common,
    Uncommon,
    #[default]
    Rare,
    VeryRare,
    Legendary,
    Artifact,
    Varies,
}

/// A magic item entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MagicItem {
    pub title: String,
    pub item_type: ItemType,
    /// Free-form qualifier from the `otherInfo` attribute, e.g. "any sword".
    pub subtype: Option<String>,
    pub rarity: Rarity,
    pub requires_attunement: bool,
    /// Who may attune, e.g. "spellcaster".
    pub restrictions: Option<String>,
    pub description: Description,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "FlagTokens::is_empty"))]
    pub flags: FlagTokens,
}

impl MagicItem {
    /// Creates a rare wondrous item that needs no attunement.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            item_type: ItemType::default(),
            subtype: None,
            rarity: Rarity::default(),
            requires_attunement: false,
            restrictions: None,
            description: Description::new(),
            flags: FlagTokens::default(),
        }
    }

    /// Type, rarity and attunement line, e.g.
    /// "Weapon (any sword), Very rare (requires attunement by a paladin)".
    pub fn subtitle(&self) -> String {
        let mut line = capitalize(&token_text(self.item_type));
        if let Some(subtype) = non_empty(&self.subtype) {
            line.push_str(&format!(" ({subtype})"));
        }
        line.push_str(", ");
        line.push_str(&capitalize(&token_text(self.rarity)));
        if self.requires_attunement {
            line.push_str(" (requires attunement");
            if let Some(restrictions) = non_empty(&self.restrictions) {
                line.push_str(&format!(" by a {restrictions}"));
            }
            line.push(')');
        }
        line
    }
}

impl XmlMapping for MagicItem {
    const ELEMENT: &'static str = "item";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;

        let rarity = element
            .attribute("rarity")
            .ok_or(FormatError::MissingAttribute {
                element: Self::ELEMENT,
                attribute: "rarity",
            })?;
        let rarity = parse_token::<Rarity>("rarity", rarity)?;
        let mut flags = FlagTokens::default();
        let requires_attunement = flags
            .read("requiresAttunement", element, "requiresAttunement")?
            .unwrap_or(false);
        let restrictions = element.attribute("restrictions").map(str::to_string);

        let mut title = None;
        let mut item_type = None;
        let mut subtype = None;
        let mut description = Description::new();

        for child in element.elements() {
            match child.name() {
                "title" => title = Some(child.text()),
                "type" => {
                    item_type = Some(parse_token::<ItemType>("item type", &child.text())?);
                    subtype = child.attribute("otherInfo").map(str::to_string);
                }
                Description::ELEMENT => description = Description::from_xml(child)?,
                other => tracing::trace!(element = other, "skipping unknown item element"),
            }
        }

        Ok(MagicItem {
            title: title.ok_or(FormatError::MissingElement {
                parent: Self::ELEMENT,
                child: "title",
            })?,
            item_type: item_type.ok_or(FormatError::MissingElement {
                parent: Self::ELEMENT,
                child: "type",
            })?,
            subtype,
            rarity,
            requires_attunement,
            restrictions,
            description,
            flags,
        })
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::ELEMENT).with_attribute("rarity", token_text(self.rarity));
        self.flags.write(
            &mut element,
            "requiresAttunement",
            "requiresAttunement",
            self.requires_attunement,
        );
        if let Some(restrictions) = &self.restrictions {
            element.set_attribute("restrictions", restrictions.as_str());
        }

        element.push_element(XmlElement::with_text_content("title", self.title.as_str()));
        let mut item_type = XmlElement::with_text_content("type", token_text(self.item_type));
        if let Some(subtype) = &self.subtype {
            item_type.set_attribute("otherInfo", subtype.as_str());
        }
        element.push_element(item_type);
        if !self.description.is_empty() {
            element.push_element(self.description.to_xml());
        }
        element
    }
}

impl fmt::Display for MagicItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.subtitle())?;
        writeln!(f, "{}", self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Paragraph;

    const HOLY_AVENGER: &str = r#"<item rarity="legendary" requiresAttunement="yes" restrictions="paladin">
  <title>Holy Avenger</title>
  <type otherInfo="any sword">weapon</type>
  <description>
    <p>You gain a +3 bonus to attack and damage rolls made with this magic weapon.</p>
  </description>
</item>"#;

    #[test]
    fn parses_item() {
        let item = MagicItem::from_xml_str(HOLY_AVENGER).unwrap();
        assert_eq!(item.title, "Holy Avenger");
        assert_eq!(item.item_type, ItemType::Weapon);
        assert_eq!(item.subtype.as_deref(), Some("any sword"));
        assert_eq!(item.rarity, Rarity::Legendary);
        assert!(item.requires_attunement);
        assert_eq!(
            item.subtitle(),
            "Weapon (any sword), Legendary (requires attunement by a paladin)"
        );
    }

    #[test]
    fn attunement_defaults_to_false() {
        let xml = r#"<item rarity="very rare"><title>Bag</title><type>wondrous item</type></item>"#;
        let item = MagicItem::from_xml_str(xml).unwrap();
        assert!(!item.requires_attunement);
        assert_eq!(item.rarity, Rarity::VeryRare);
        assert_eq!(item.item_type, ItemType::WondrousItem);
        assert_eq!(item.subtitle(), "Wondrous item, Very rare");
    }

    #[test]
    fn round_trips_structure() {
        let source = XmlElement::parse(HOLY_AVENGER).unwrap();
        let item = MagicItem::from_xml(&source).unwrap();
        let written = item.to_xml();
        assert!(written.structurally_eq(&source));
        assert_eq!(written.attribute("requiresAttunement"), Some("yes"));
        assert_eq!(written.attribute("rarity"), Some("legendary"));
        assert_eq!(MagicItem::from_xml(&written).unwrap(), item);
    }

    #[test]
    fn keeps_explicit_false_attunement() {
        let source = XmlElement::parse(
            r#"<item rarity="common" requiresAttunement="false"><title>Candle</title><type>wondrous item</type></item>"#,
        )
        .unwrap();
        let mut item = MagicItem::from_xml(&source).unwrap();
        assert!(!item.requires_attunement);
        assert!(item.to_xml().structurally_eq(&source));

        item.requires_attunement = true;
        assert_eq!(item.to_xml().attribute("requiresAttunement"), Some("true"));
        assert!(MagicItem::new("Candle").to_xml().attribute("requiresAttunement").is_none());
    }

    #[test]
    fn renders_text() {
        let mut item = MagicItem::new("Potion of Climbing");
        item.item_type = ItemType::Potion;
        item.rarity = Rarity::Common;
        item.description.push(Paragraph::from("You gain a climbing speed."));
        assert_eq!(
            item.to_string(),
            "Potion of Climbing\nPotion, Common\nYou gain a climbing speed.\n\n"
        );
    }

    #[test]
    fn attunement_without_restrictions() {
        let mut item = MagicItem::new("Cloak");
        item.requires_attunement = true;
        item.restrictions = Some(String::new());
        assert_eq!(item.subtitle(), "Wondrous item, Rare (requires attunement)");
    }

    #[test]
    fn enumeration_fences() {
        let cases = [
            HOLY_AVENGER.replace(r#"rarity="legendary" "#, ""),
            HOLY_AVENGER.replace("legendary", "mythic"),
            HOLY_AVENGER.replace(">weapon<", ">trinket<"),
            HOLY_AVENGER.replace("<title>Holy Avenger</title>", ""),
            HOLY_AVENGER.replace(r#"<type otherInfo="any sword">weapon</type>"#, ""),
        ];
        for xml in cases {
            let err = MagicItem::from_xml_str(&xml).unwrap_err();
            assert!(err.is_invalid_format(), "{err}");
        }

        let err = MagicItem::from_xml(&XmlElement::new("spell")).unwrap_err();
        assert!(err.is_argument());
    }
}
