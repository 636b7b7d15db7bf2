//! Spells.
//!
//! # XML Shape
//!
//! ```xml
//! <spell ritual="true" verbal="true" somatic="true">
//!   <title>Alarm</title>
//!   <level>1</level>
//!   <school>abjuration</school>
//!   <class>ranger</class>
//!   <class>wizard</class>
//!   <castingtime unit="minute">1</castingtime>
//!   <range unit="foot">30</range>
//!   <duration unit="hour">8</duration>
//!   <materials>A tiny bell and a piece of fine silver wire</materials>
//!   <description><p>You set an alarm against unwanted intrusion.</p></description>
//! </spell>
//! ```
//!
//! The four boolean flags are attributes of `<spell>`; `concentration` is also
//! accepted on `<duration>`. Flags are written back on the element that
//! carried them, and new concentration spells get it on `<duration>`.

use std::fmt;

use crate::description::Description;
use crate::error::{FormatError, Result};
use crate::mapping::XmlMapping;
use crate::vocab::{
    FlagTokens, capitalize, expect_element, non_empty, parse_number, parse_token, token_text,
};
use crate::xml::XmlElement;

/// Highest spell level.
pub const MAX_LEVEL: u8 = 9;

const CONCENTRATION: &str = "concentration";
const DURATION_CONCENTRATION: &str = "duration.concentration";

/// School of magic.
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
pub enum SpellSchool {
    #[default]
    Abjuration,
    Conjuration,
    Divination,
    Enchantment,
    Evocation,
    Illusion,
    Necromancy,
    Transmutation,
}

/// Spellcasting class.
#[derive(
    Clone,
    Copy,
    Debug,
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
pub enum SpellClass {
    Bard,
    Cleric,
    Druid,
    Paladin,
    Ranger,
    Sorcerer,
    Warlock,
    Wizard,
}

// ============================================================================
// UnitType
// ============================================================================

/// Value part of a [`UnitType`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnitValue {
    /// A count of units, e.g. `30` in "30 feet".
    Number(i64),
    /// A descriptive value with no unit, e.g. "touch".
    Text(String),
}

impl fmt::Display for UnitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitValue::Number(n) => write!(f, "{n}"),
            UnitValue::Text(text) => f.write_str(text),
        }
    }
}

/// A measured quantity such as a casting time, range or duration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitType {
    pub value: UnitValue,
    pub unit: Option<String>,
}

impl UnitType {
    /// A numeric quantity with a unit, e.g. `UnitType::new(60, "foot")`.
    pub fn new(value: i64, unit: impl Into<String>) -> Self {
        Self {
            value: UnitValue::Number(value),
            unit: Some(unit.into()),
        }
    }

    /// A descriptive quantity with no unit, e.g. "touch".
    pub fn descriptive(text: impl Into<String>) -> Self {
        Self {
            value: UnitValue::Text(text.into()),
            unit: None,
        }
    }

    /// Reads the element text as the value and the `unit` attribute.
    pub fn from_element(element: &XmlElement) -> Self {
        let text = element.text();
        let value = match text.trim().parse::<i64>() {
            Ok(n) => UnitValue::Number(n),
            Err(_) => UnitValue::Text(text.trim().to_string()),
        };
        Self {
            value,
            unit: element.attribute("unit").map(str::to_string),
        }
    }

    /// Writes the value and unit onto an element with the given tag.
    pub fn to_element(&self, name: &str) -> XmlElement {
        let mut element = XmlElement::with_text_content(name, self.value.to_string());
        if let Some(unit) = &self.unit {
            element.set_attribute("unit", unit.as_str());
        }
        element
    }

    fn pluralized_unit(unit: &str) -> String {
        match unit {
            "foot" => "feet".to_string(),
            other => format!("{other}s"),
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let UnitValue::Number(n) = self.value else {
            return fmt::Display::fmt(&self.value, f);
        };
        match non_empty(&self.unit) {
            None => write!(f, "{n}"),
            Some(unit) if n == 1 => write!(f, "{n} {unit}"),
            Some(unit) => write!(f, "{n} {}", Self::pluralized_unit(unit)),
        }
    }
}

// ============================================================================
// Spell
// ============================================================================

/// A spell entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spell {
    pub title: String,
    pub level: u8,
    pub school: SpellSchool,
    pub verbal: bool,
    pub somatic: bool,
    pub concentration: bool,
    pub ritual: bool,
    pub materials: Option<String>,
    pub casting_time: UnitType,
    pub range: UnitType,
    pub duration: UnitType,
    /// Classes in order of first appearance, without duplicates.
    pub classes: Vec<SpellClass>,
    pub description: Description,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "FlagTokens::is_empty"))]
    pub flags: FlagTokens,
}

const LEVEL_NAMES: [&str; 10] = [
    "cantrip",
    "1st level",
    "2nd level",
    "3rd level",
    "4th level",
    "5th level",
    "6th level",
    "7th level",
    "8th level",
    "9th level",
];

impl Spell {
    /// Creates an abjuration cantrip with a one-action casting time, touch
    /// range and instantaneous duration.
    ///
    /// The spell is not valid until at least one class is added.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            level: 0,
            school: SpellSchool::Abjuration,
            verbal: false,
            somatic: false,
            concentration: false,
            ritual: false,
            materials: None,
            casting_time: UnitType::new(1, "action"),
            range: UnitType::descriptive("touch"),
            duration: UnitType::descriptive("instantaneous"),
            classes: Vec::new(),
            description: Description::new(),
            flags: FlagTokens::default(),
        }
    }

    /// Adds a class unless it is already listed.
    pub fn add_class(&mut self, class: SpellClass) {
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
    }

    /// Checks the invariants every spell must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(FormatError::Invalid("no title specified".into()));
        }
        if self.level > MAX_LEVEL {
            return Err(FormatError::invalid_value("level", self.level.to_string()));
        }
        if self.classes.is_empty() {
            return Err(FormatError::Invalid("no classes specified".into()));
        }
        Ok(())
    }

    /// Level and school line, e.g. "1st level abjuration, ritual".
    pub fn subtitle(&self) -> String {
        let base = if self.level == 0 {
            format!("{} cantrip", capitalize(self.school.as_ref()))
        } else {
            let name = LEVEL_NAMES
                .get(usize::from(self.level))
                .copied()
                .unwrap_or("unknown level");
            format!("{name} {}", self.school)
        };
        if self.ritual {
            format!("{base}, ritual")
        } else {
            base
        }
    }

    /// Components line, e.g. "V, S, M (a pinch of salt)".
    pub fn components(&self) -> String {
        let mut parts = Vec::new();
        if self.verbal {
            parts.push("V".to_string());
        }
        if self.somatic {
            parts.push("S".to_string());
        }
        if let Some(materials) = non_empty(&self.materials) {
            parts.push(format!("M ({materials})"));
        }
        parts.join(", ")
    }
}

impl XmlMapping for Spell {
    const ELEMENT: &'static str = "spell";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;

        let mut flags = FlagTokens::default();
        let ritual = flags.read("ritual", element, "ritual")?.unwrap_or(false);
        let verbal = flags.read("verbal", element, "verbal")?.unwrap_or(false);
        let somatic = flags.read("somatic", element, "somatic")?.unwrap_or(false);
        let mut concentration = flags
            .read(CONCENTRATION, element, "concentration")?
            .unwrap_or(false);

        let mut title = None;
        let mut level = None;
        let mut school = None;
        let mut classes: Vec<SpellClass> = Vec::new();
        let mut casting_time = None;
        let mut range = None;
        let mut duration = None;
        let mut materials = None;
        let mut description = Description::new();

        for child in element.elements() {
            match child.name() {
                "title" => title = Some(child.text()),
                "level" => level = Some(parse_number::<i64>("level", &child.text())?),
                "school" => school = Some(parse_token::<SpellSchool>("school", &child.text())?),
                "class" => {
                    let class = parse_token::<SpellClass>("class", &child.text())?;
                    if !classes.contains(&class) {
                        classes.push(class);
                    }
                }
                "castingtime" => casting_time = Some(UnitType::from_element(child)),
                "range" => range = Some(UnitType::from_element(child)),
                "duration" => {
                    duration = Some(UnitType::from_element(child));
                    if let Some(value) =
                        flags.read(DURATION_CONCENTRATION, child, "concentration")?
                    {
                        concentration = value;
                    }
                }
                "materials" => materials = Some(child.text()),
                Description::ELEMENT => description = Description::from_xml(child)?,
                other => tracing::trace!(element = other, "skipping unknown spell element"),
            }
        }

        let title = title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| FormatError::Invalid("no title specified".into()))?;
        let level = match level {
            Some(level) if (0..=i64::from(MAX_LEVEL)).contains(&level) => level as u8,
            Some(level) => return Err(FormatError::invalid_value("level", level.to_string())),
            None => return Err(FormatError::Invalid("no level specified".into())),
        };
        let school = school.ok_or_else(|| FormatError::Invalid("no school specified".into()))?;
        let casting_time =
            casting_time.ok_or_else(|| FormatError::Invalid("no casting time specified".into()))?;
        let range = range.ok_or_else(|| FormatError::Invalid("no range specified".into()))?;
        let duration =
            duration.ok_or_else(|| FormatError::Invalid("no duration specified".into()))?;

        let spell = Spell {
            title,
            level,
            school,
            verbal,
            somatic,
            concentration,
            ritual,
            materials,
            casting_time,
            range,
            duration,
            classes,
            description,
            flags,
        };
        spell.validate()?;
        Ok(spell)
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::ELEMENT);
        self.flags.write(&mut element, "ritual", "ritual", self.ritual);
        self.flags.write(&mut element, "verbal", "verbal", self.verbal);
        self.flags.write(&mut element, "somatic", "somatic", self.somatic);
        let on_spell = self.flags.contains(CONCENTRATION);
        let on_duration = self.flags.contains(DURATION_CONCENTRATION) || !on_spell;
        if on_spell {
            self.flags
                .write(&mut element, CONCENTRATION, "concentration", self.concentration);
        }

        element.push_element(XmlElement::with_text_content("title", self.title.as_str()));
        element.push_element(XmlElement::with_text_content("level", self.level.to_string()));
        element.push_element(XmlElement::with_text_content(
            "school",
            token_text(self.school),
        ));
        for class in &self.classes {
            element.push_element(XmlElement::with_text_content("class", token_text(class)));
        }
        element.push_element(self.casting_time.to_element("castingtime"));
        element.push_element(self.range.to_element("range"));
        let mut duration = self.duration.to_element("duration");
        if on_duration {
            self.flags.write(
                &mut duration,
                DURATION_CONCENTRATION,
                "concentration",
                self.concentration,
            );
        }
        element.push_element(duration);
        if let Some(materials) = &self.materials {
            element.push_element(XmlElement::with_text_content("materials", materials.as_str()));
        }
        if !self.description.is_empty() {
            element.push_element(self.description.to_xml());
        }
        element
    }
}

impl fmt::Display for Spell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classes: Vec<String> = self
            .classes
            .iter()
            .map(|class| capitalize(class.as_ref()))
            .collect();

        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.subtitle())?;
        writeln!(f, "{}", classes.join(" / "))?;
        writeln!(f, "Casting time: {}", self.casting_time)?;
        writeln!(f, "Range: {}", self.range)?;
        writeln!(f, "Components: {}", self.components())?;
        write!(f, "Duration: {}", self.duration)?;
        if self.concentration {
            f.write_str(" (requires concentration)")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Paragraph;

    const ALARM: &str = r#"<spell ritual="true" verbal="true" somatic="true">
  <title>Alarm</title>
  <level>1</level>
  <school>abjuration</school>
  <class>ranger</class>
  <class>wizard</class>
  <castingtime unit="minute">1</castingtime>
  <range unit="foot">30</range>
  <duration unit="hour">8</duration>
  <materials>A tiny bell and a piece of fine silver wire</materials>
  <description><p>You set an alarm against unwanted intrusion.</p></description>
</spell>"#;

    fn make_test_spell() -> Spell {
        let mut spell = Spell::new("Test Spell");
        spell.somatic = true;
        spell.school = SpellSchool::Evocation;
        spell.add_class(SpellClass::Sorcerer);
        spell.add_class(SpellClass::Warlock);
        spell.add_class(SpellClass::Wizard);
        spell.level = 2;
        spell.range = UnitType::new(60, "foot");
        spell.description.push(Paragraph::from("This is a test spell."));
        spell.description.push(Paragraph::from("It is rather lovely."));
        spell
    }

    #[test]
    fn new_spell_default_values() {
        let spell = Spell::new("Blank");
        assert!(!spell.verbal && !spell.somatic && !spell.concentration && !spell.ritual);
        assert_eq!(spell.school, SpellSchool::Abjuration);
        assert_eq!(spell.level, 0);
        assert_eq!(spell.casting_time, UnitType::new(1, "action"));
        assert_eq!(spell.range.value, UnitValue::Text("touch".into()));
        assert_eq!(spell.duration.value, UnitValue::Text("instantaneous".into()));
        assert!(spell.validate().is_err());
    }

    #[test]
    fn renders_full_text() {
        let expected = "Test Spell
2nd level evocation
Sorcerer / Warlock / Wizard
Casting time: 1 action
Range: 60 feet
Components: S
Duration: instantaneous
This is a test spell.
It is rather lovely.

";
        assert_eq!(make_test_spell().to_string(), expected);
    }

    #[test]
    fn parses_ritual_spell() {
        let spell = Spell::from_xml_str(ALARM).unwrap();
        assert_eq!(spell.title, "Alarm");
        assert_eq!(spell.level, 1);
        assert_eq!(spell.school, SpellSchool::Abjuration);
        assert!(spell.verbal && spell.somatic && spell.ritual);
        assert!(!spell.concentration);
        assert_eq!(spell.classes, vec![SpellClass::Ranger, SpellClass::Wizard]);
        assert_eq!(spell.casting_time.to_string(), "1 minute");
        assert_eq!(spell.range.to_string(), "30 feet");
        assert_eq!(spell.duration.to_string(), "8 hours");
        assert_eq!(
            spell.materials.as_deref(),
            Some("A tiny bell and a piece of fine silver wire")
        );

        let text = spell.to_string();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Alarm"));
        assert_eq!(lines.next(), Some("1st level abjuration, ritual"));
        assert!(text.contains("Components: V, S, M (A tiny bell and a piece of fine silver wire)"));
        assert!(
            spell
                .description
                .to_string()
                .starts_with("You set an alarm against unwanted intrusion.")
        );
    }

    #[test]
    fn round_trips_structure() {
        let source = XmlElement::parse(ALARM).unwrap();
        let spell = Spell::from_xml(&source).unwrap();
        assert!(spell.to_xml().structurally_eq(&source));
    }

    #[test]
    fn cantrip_subtitle_and_concentration() {
        let mut spell = make_test_spell();
        spell.level = 0;
        spell.concentration = true;
        spell.duration = UnitType::new(1, "minute");
        assert_eq!(spell.subtitle(), "Evocation cantrip");
        assert!(spell.to_string().contains("Duration: 1 minute (requires concentration)\n"));

        let reparsed = Spell::from_xml(&spell.to_xml()).unwrap();
        assert!(reparsed.concentration);
    }

    #[test]
    fn keeps_flag_spelling_and_placement() {
        let xml = ALARM
            .replace(r#"ritual="true""#, r#"ritual="false" concentration="Y""#)
            .replace(r#"verbal="true""#, r#"verbal="yes""#);
        let source = XmlElement::parse(&xml).unwrap();
        let spell = Spell::from_xml(&source).unwrap();
        assert!(!spell.ritual && spell.verbal && spell.concentration);

        let written = spell.to_xml();
        assert!(written.structurally_eq(&source));
        assert_eq!(written.attribute("concentration"), Some("Y"));
        let duration = written.elements().find(|e| e.is("duration")).unwrap();
        assert_eq!(duration.attribute("concentration"), None);
    }

    #[test]
    fn concentration_on_duration_stays_there() {
        let xml = ALARM.replace(
            r#"<duration unit="hour">8</duration>"#,
            r#"<duration unit="hour" concentration="true">8</duration>"#,
        );
        let source = XmlElement::parse(&xml).unwrap();
        let spell = Spell::from_xml(&source).unwrap();
        assert!(spell.concentration);
        assert!(spell.to_xml().structurally_eq(&source));
    }

    #[test]
    fn duplicate_classes_collapse() {
        let xml = ALARM.replace("<class>wizard</class>", "<class>wizard</class><class>Ranger</class>");
        let spell = Spell::from_xml_str(&xml).unwrap();
        assert_eq!(spell.classes.len(), 2);
    }

    #[test]
    fn rejects_wrong_element() {
        let err = Spell::from_xml(&XmlElement::new("bob")).unwrap_err();
        assert!(err.is_argument());
    }

    #[test]
    fn validity_failures_are_invalid_format() {
        let cases = [
            ALARM.replace("<title>Alarm</title>", ""),
            ALARM.replace("<title>Alarm</title>", "<title></title>"),
            ALARM.replace("<level>1</level>", "<level>10</level>"),
            ALARM.replace("<level>1</level>", "<level>-1</level>"),
            ALARM.replace("<level>1</level>", "<level>first</level>"),
            ALARM.replace("abjuration", "pyromancy"),
            ALARM
                .replace("<class>ranger</class>", "")
                .replace("<class>wizard</class>", ""),
            ALARM.replace("<class>ranger</class>", "<class>barbarian</class>"),
            ALARM.replace(r#"<castingtime unit="minute">1</castingtime>"#, ""),
            ALARM.replace(r#"<range unit="foot">30</range>"#, ""),
            ALARM.replace(r#"<duration unit="hour">8</duration>"#, ""),
            ALARM.replace(r#"ritual="true""#, r#"ritual="perhaps""#),
        ];
        for xml in cases {
            let err = Spell::from_xml_str(&xml).unwrap_err();
            assert!(err.is_invalid_format(), "{err} for {xml}");
        }
    }

    #[test]
    fn unit_rendering() {
        assert_eq!(UnitType::new(1, "action").to_string(), "1 action");
        assert_eq!(UnitType::new(1, "foot").to_string(), "1 foot");
        assert_eq!(UnitType::new(150, "foot").to_string(), "150 feet");
        assert_eq!(UnitType::new(10, "round").to_string(), "10 rounds");
        assert_eq!(UnitType::descriptive("touch").to_string(), "touch");

        let element = XmlElement::parse("<range>self</range>").unwrap();
        assert_eq!(UnitType::from_element(&element).to_string(), "self");
    }
}
