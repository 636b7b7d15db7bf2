//! Creatures and their stat blocks.
//!
//! # XML Shape
//!
//! ```xml
//! <creature size="large" type="monstrosity">
//!   <title>Owlbear</title>
//!   <alignment>unaligned</alignment>
//!   <ac type="natural armor">13</ac>
//!   <hp roll="7d10+21">59</hp>
//!   <speed>40</speed>
//!   <statblock str="20" dex="12" con="17" int="3" wis="12" cha="7"/>
//!   <skill name="perception">+3</skill>
//!   <senses perception="13"><sense name="darkvision">60</sense></senses>
//!   <challenge xp="700">3</challenge>
//!   <traits><trait><p>Keen Sight and Smell.</p></trait></traits>
//!   <actions><action><p>Multiattack.</p></action></actions>
//! </creature>
//! ```

use std::collections::BTreeMap;
use std::fmt;

use strum::IntoEnumIterator;

use crate::description::Description;
use crate::error::{FormatError, Result};
use crate::mapping::XmlMapping;
use crate::text::Paragraph;
use crate::vocab::{
    FlagTokens, capitalize, expect_element, non_empty, optional_number, parse_number, parse_token,
    required_attribute, required_number, signed, thousands, token_text,
};
use crate::xml::XmlElement;

const DIVIDER: &str = "------------------";

// ============================================================================
// Enumerations
// ============================================================================

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
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CreatureType {
    Aberration,
    Beast,
    Celestial,
    Construct,
    Dragon,
    Elemental,
    Fey,
    Fiend,
    Giant,
    Humanoid,
    Monstrosity,
    Ooze,
    Plant,
    Undead,
}

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
pub enum CreatureSize {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
    Gargantuan,
}

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
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Alignment {
    LawfulGood,
    NeutralGood,
    ChaoticGood,
    LawfulNeutral,
    Neutral,
    ChaoticNeutral,
    LawfulEvil,
    NeutralEvil,
    ChaoticEvil,
    Unaligned,
}

/// One of the six ability scores, keyed by its three-letter abbreviation.
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
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

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
pub enum Skill {
    Acrobatics,
    AnimalHandling,
    Arcana,
    Athletics,
    Deception,
    History,
    Insight,
    Intimidation,
    Investigation,
    Medicine,
    Nature,
    Perception,
    Performance,
    Persuasion,
    Religion,
    SleightOfHand,
    Stealth,
    Survival,
}

impl Skill {
    /// Display name, e.g. "Sleight of Hand".
    pub fn title(&self) -> String {
        let name: &str = self.as_ref();
        name.split('_')
            .map(|word| if word == "of" { word.to_string() } else { capitalize(word) })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ============================================================================
// AbilityScores
// ============================================================================

/// Score used for abilities a stat block leaves out.
pub const DEFAULT_SCORE: i32 = 10;

/// The six ability scores.
///
/// Only the scores a stat block lists are stored; the rest read as
/// [`DEFAULT_SCORE`] and are not written back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityScores {
    pub strength: Option<i32>,
    pub dexterity: Option<i32>,
    pub constitution: Option<i32>,
    pub intelligence: Option<i32>,
    pub wisdom: Option<i32>,
    pub charisma: Option<i32>,
}

impl AbilityScores {
    /// The listed score, if any.
    pub const fn score(&self, ability: Ability) -> Option<i32> {
        match ability {
            Ability::Str => self.strength,
            Ability::Dex => self.dexterity,
            Ability::Con => self.constitution,
            Ability::Int => self.intelligence,
            Ability::Wis => self.wisdom,
            Ability::Cha => self.charisma,
        }
    }

    pub fn get(&self, ability: Ability) -> i32 {
        self.score(ability).unwrap_or(DEFAULT_SCORE)
    }

    pub fn set(&mut self, ability: Ability, score: i32) {
        let slot = match ability {
            Ability::Str => &mut self.strength,
            Ability::Dex => &mut self.dexterity,
            Ability::Con => &mut self.constitution,
            Ability::Int => &mut self.intelligence,
            Ability::Wis => &mut self.wisdom,
            Ability::Cha => &mut self.charisma,
        };
        *slot = Some(score);
    }

    pub fn is_empty(&self) -> bool {
        Ability::iter().all(|ability| self.score(ability).is_none())
    }

    /// `floor((score - 10) / 2)`, computed wide so that no score overflows.
    pub fn modifier(&self, ability: Ability) -> i32 {
        let modifier = (i64::from(self.get(ability)) - i64::from(DEFAULT_SCORE)).div_euclid(2);
        i32::try_from(modifier).unwrap_or(i32::MIN)
    }

    fn from_element(element: &XmlElement) -> Result<Self> {
        let mut scores = Self::default();
        for (name, value) in element.attributes() {
            let ability = parse_token::<Ability>("ability", name)?;
            scores.set(ability, parse_number("ability score", value)?);
        }
        Ok(scores)
    }

    fn to_element(&self) -> XmlElement {
        let mut element = XmlElement::new("statblock");
        for ability in Ability::iter() {
            if let Some(score) = self.score(ability) {
                element.set_attribute(ability.to_string(), score.to_string());
            }
        }
        element
    }
}

// ============================================================================
// Speeds, senses, legendary actions
// ============================================================================

/// Flying speed; `hover` creatures cannot be knocked prone mid-air.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Flight {
    pub speed: u32,
    pub hover: bool,
}

/// Movement speeds in feet.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Speeds {
    pub walk: u32,
    pub flight: Option<Flight>,
    pub swim: Option<u32>,
    pub spider_climb: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "FlagTokens::is_empty"))]
    pub flags: FlagTokens,
}

impl Default for Speeds {
    fn default() -> Self {
        Self {
            walk: 30,
            flight: None,
            swim: None,
            spider_climb: None,
            flags: FlagTokens::default(),
        }
    }
}

impl Speeds {
    fn from_element(element: &XmlElement) -> Result<Self> {
        let walk = parse_number("speed", &element.text())?;
        let mut flags = FlagTokens::default();
        let hover = flags.read("hover", element, "hover")?.unwrap_or(false);
        let flight = optional_number(element, "fly")?.map(|speed| Flight { speed, hover });
        Ok(Self {
            walk,
            flight,
            swim: optional_number(element, "swim")?,
            spider_climb: optional_number(element, "spiderclimb")?,
            flags,
        })
    }

    fn to_element(&self) -> XmlElement {
        let mut element = XmlElement::with_text_content("speed", self.walk.to_string());
        match self.flight {
            Some(flight) => {
                element.set_attribute("fly", flight.speed.to_string());
                self.flags.write(&mut element, "hover", "hover", flight.hover);
            }
            // `hover` without a flying speed carries no meaning; keep it as written.
            None => {
                if let Some(raw) = self.flags.get("hover") {
                    element.set_attribute("hover", raw);
                }
            }
        }
        if let Some(swim) = self.swim {
            element.set_attribute("swim", swim.to_string());
        }
        if let Some(climb) = self.spider_climb {
            element.set_attribute("spiderclimb", climb.to_string());
        }
        element
    }
}

impl fmt::Display for Speeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ft.", self.walk)?;
        match self.flight {
            Some(Flight { speed, hover: true }) => write!(f, ", fly {speed} ft. (hover)")?,
            Some(Flight { speed, .. }) => write!(f, ", fly {speed} ft.")?,
            None => {}
        }
        if let Some(swim) = self.swim {
            write!(f, ", swim {swim} ft.")?;
        }
        if let Some(climb) = self.spider_climb {
            write!(f, ", spider climb {climb} ft.")?;
        }
        Ok(())
    }
}

/// A special sense such as darkvision, with its range in feet.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sense {
    pub name: String,
    pub range: u32,
}

/// An option usable with legendary actions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegendaryAction {
    /// Number of legendary actions spent to take this option, when stated.
    pub cost: Option<u32>,
    pub description: Vec<Paragraph>,
}

impl LegendaryAction {
    pub fn new(cost: u32, description: Vec<Paragraph>) -> Result<Self> {
        if cost == 0 {
            return Err(FormatError::InvalidArgument(
                "legendary action cost must be at least 1".into(),
            ));
        }
        Ok(Self {
            cost: Some(cost),
            description,
        })
    }

    /// Actions spent to take this option; one unless stated otherwise.
    pub fn cost(&self) -> u32 {
        self.cost.unwrap_or(1)
    }
}

impl XmlMapping for LegendaryAction {
    const ELEMENT: &'static str = "action";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;
        let cost = optional_number::<u32>(element, "cost")?;
        if cost == Some(0) {
            return Err(FormatError::invalid_value("cost", "0"));
        }
        Ok(Self {
            cost,
            description: read_paragraphs(element, Self::ELEMENT)?,
        })
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::ELEMENT);
        if let Some(cost) = self.cost {
            element.set_attribute("cost", cost.to_string());
        }
        for paragraph in &self.description {
            element.push_element(paragraph.to_xml());
        }
        element
    }
}

impl fmt::Display for LegendaryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cost() > 1 {
            write!(f, "(Costs {} Actions) ", self.cost())?;
        }
        for paragraph in &self.description {
            write!(f, "{paragraph}")?;
        }
        Ok(())
    }
}

fn read_paragraphs(element: &XmlElement, parent: &'static str) -> Result<Vec<Paragraph>> {
    element
        .elements()
        .map(|child| {
            if child.is(Paragraph::ELEMENT) {
                Paragraph::from_xml(child)
            } else {
                Err(FormatError::UnexpectedElement {
                    parent,
                    child: child.name().to_string(),
                })
            }
        })
        .collect()
}

/// Reads `<traits><trait>..</trait></traits>` style groups.
fn read_entries(
    element: &XmlElement,
    parent: &'static str,
    entry: &'static str,
) -> Result<Vec<Vec<Paragraph>>> {
    element
        .elements()
        .map(|child| {
            if child.is(entry) {
                read_paragraphs(child, entry)
            } else {
                Err(FormatError::UnexpectedElement {
                    parent,
                    child: child.name().to_string(),
                })
            }
        })
        .collect()
}

fn write_entries(name: &str, entry: &str, entries: &[Vec<Paragraph>]) -> XmlElement {
    let mut element = XmlElement::new(name);
    for paragraphs in entries {
        let mut child = XmlElement::new(entry);
        for paragraph in paragraphs {
            child.push_element(paragraph.to_xml());
        }
        element.push_element(child);
    }
    element
}

// ============================================================================
// Creature
// ============================================================================

/// A creature entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Creature {
    pub title: String,
    pub size: CreatureSize,
    pub creature_type: CreatureType,
    pub subtype: Option<String>,
    /// `None` when no alignment is given; rendered as unaligned.
    pub alignment: Option<Alignment>,
    pub armor_class: i32,
    pub armor_type: Option<String>,
    /// Average hit points, kept verbatim.
    pub hit_points: String,
    pub hit_point_roll: Option<String>,
    pub speeds: Speeds,
    pub stats: AbilityScores,
    pub saving_throws: BTreeMap<Ability, i32>,
    /// Skill bonuses in document order.
    pub skills: Vec<(Skill, i32)>,
    pub vulnerabilities: Vec<String>,
    pub resistances: Vec<String>,
    pub immunities: Vec<String>,
    pub condition_immunities: Vec<String>,
    pub senses: Vec<Sense>,
    /// Stated passive Perception; derived from Wisdom when absent.
    pub passive_perception: Option<u32>,
    pub languages: Vec<String>,
    /// Challenge rating as written, e.g. "1/4".
    pub challenge_rating: String,
    pub xp: u32,
    pub traits: Vec<Vec<Paragraph>>,
    pub actions: Vec<Vec<Paragraph>>,
    pub reactions: Vec<Vec<Paragraph>>,
    pub legendary_actions: Vec<LegendaryAction>,
    pub legendary_action_count: u32,
    pub description: Description,
}

impl Creature {
    /// Creates an unaligned creature with average stats and a 30 ft. walk.
    pub fn new(title: impl Into<String>, size: CreatureSize, creature_type: CreatureType) -> Self {
        Self {
            title: title.into(),
            size,
            creature_type,
            subtype: None,
            alignment: None,
            armor_class: 10,
            armor_type: None,
            hit_points: "1".to_string(),
            hit_point_roll: None,
            speeds: Speeds::default(),
            stats: AbilityScores::default(),
            saving_throws: BTreeMap::new(),
            skills: Vec::new(),
            vulnerabilities: Vec::new(),
            resistances: Vec::new(),
            immunities: Vec::new(),
            condition_immunities: Vec::new(),
            senses: Vec::new(),
            passive_perception: None,
            languages: Vec::new(),
            challenge_rating: "0".to_string(),
            xp: 0,
            traits: Vec::new(),
            actions: Vec::new(),
            reactions: Vec::new(),
            legendary_actions: Vec::new(),
            legendary_action_count: 0,
            description: Description::new(),
        }
    }

    /// Ability modifier for a key such as `"str"`; zero for unknown keys.
    pub fn modifier(&self, key: &str) -> i32 {
        match key.parse::<Ability>() {
            Ok(ability) => self.stats.modifier(ability),
            Err(_) => 0,
        }
    }

    /// Bonus for a skill, if the creature lists one.
    pub fn skill(&self, skill: Skill) -> Option<i32> {
        self.skills
            .iter()
            .find(|(listed, _)| *listed == skill)
            .map(|(_, bonus)| *bonus)
    }

    /// Passive Perception as stated, or 10 plus the Wisdom modifier.
    pub fn passive_perception_score(&self) -> i64 {
        match self.passive_perception {
            Some(score) => i64::from(score),
            None => 10 + i64::from(self.stats.modifier(Ability::Wis)),
        }
    }

    /// Size, type and alignment line, e.g. "Large monstrosity, unaligned".
    pub fn subtitle(&self) -> String {
        let mut line = format!(
            "{} {}",
            capitalize(self.size.as_ref()),
            token_text(self.creature_type)
        );
        if let Some(subtype) = non_empty(&self.subtype) {
            line.push_str(&format!(" ({subtype})"));
        }
        let alignment = self.alignment.unwrap_or(Alignment::Unaligned);
        line.push_str(&format!(", {}", token_text(alignment)));
        line
    }

    fn legendary_preamble(&self) -> String {
        format!(
            "The {} can take {} legendary actions, using the options below. \
             It can take only one legendary action at a time, and only at the end of \
             another creature's turn. Spent legendary actions are regained at the start \
             of its turn.",
            self.title.to_lowercase(),
            self.legendary_action_count
        )
    }
}

fn missing(child: &'static str) -> FormatError {
    FormatError::MissingElement {
        parent: Creature::ELEMENT,
        child,
    }
}

impl XmlMapping for Creature {
    const ELEMENT: &'static str = "creature";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;

        let creature_type = parse_token::<CreatureType>(
            "creature type",
            &required_attribute(element, Self::ELEMENT, "type")?,
        )?;
        let size = parse_token::<CreatureSize>(
            "size",
            &required_attribute(element, Self::ELEMENT, "size")?,
        )?;

        let mut creature = Creature::new(String::new(), size, creature_type);
        creature.subtype = element.attribute("subtype").map(str::to_string);

        let mut title = None;
        let mut armor_class = None;
        let mut hit_points = None;
        let mut speeds = None;
        let mut challenge = None;

        for child in element.elements() {
            match child.name() {
                "title" => title = Some(child.text()),
                "alignment" => {
                    creature.alignment = Some(parse_token("alignment", &child.text())?);
                }
                "ac" => {
                    armor_class = Some(parse_number::<i32>("armor class", &child.text())?);
                    creature.armor_type = child.attribute("type").map(str::to_string);
                }
                "hp" => {
                    hit_points = Some(child.text().trim().to_string());
                    creature.hit_point_roll = child.attribute("roll").map(str::to_string);
                }
                "speed" => speeds = Some(Speeds::from_element(child)?),
                "statblock" => creature.stats = AbilityScores::from_element(child)?,
                "saves" => {
                    for (name, value) in child.attributes() {
                        let ability = parse_token::<Ability>("ability", name)?;
                        creature
                            .saving_throws
                            .insert(ability, parse_number("saving throw", value)?);
                    }
                }
                "skill" => {
                    let name = required_attribute(child, "skill", "name")?;
                    let skill = parse_token::<Skill>("skill", &name)?;
                    creature
                        .skills
                        .push((skill, parse_number("skill", &child.text())?));
                }
                "vulnerable" => creature.vulnerabilities.push(child.text()),
                "dmgresist" => creature.resistances.push(child.text()),
                "dmgimmune" => creature.immunities.push(child.text()),
                "statimmune" => creature.condition_immunities.push(child.text()),
                "senses" => {
                    creature.passive_perception = optional_number(child, "perception")?;
                    for sense in child.elements() {
                        if !sense.is("sense") {
                            return Err(FormatError::UnexpectedElement {
                                parent: "senses",
                                child: sense.name().to_string(),
                            });
                        }
                        creature.senses.push(Sense {
                            name: required_attribute(sense, "sense", "name")?,
                            range: parse_number("sense range", &sense.text())?,
                        });
                    }
                }
                "language" => creature.languages.push(child.text()),
                "challenge" => {
                    creature.xp = required_number(child, "challenge", "xp")?;
                    challenge = Some(child.text().trim().to_string());
                }
                "traits" => creature
                    .traits
                    .extend(read_entries(child, "traits", "trait")?),
                "actions" => creature
                    .actions
                    .extend(read_entries(child, "actions", "action")?),
                "reactions" => creature
                    .reactions
                    .extend(read_entries(child, "reactions", "action")?),
                "legendaryactions" => {
                    creature.legendary_action_count =
                        required_number(child, "legendaryactions", "available")?;
                    for action in child.elements() {
                        creature
                            .legendary_actions
                            .push(LegendaryAction::from_xml(action).map_err(|err| {
                                if err.is_argument() {
                                    FormatError::UnexpectedElement {
                                        parent: "legendaryactions",
                                        child: action.name().to_string(),
                                    }
                                } else {
                                    err
                                }
                            })?);
                    }
                }
                Description::ELEMENT => creature.description = Description::from_xml(child)?,
                other => tracing::trace!(element = other, "skipping unknown creature element"),
            }
        }

        creature.title = title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| missing("title"))?;
        creature.armor_class = armor_class.ok_or_else(|| missing("ac"))?;
        creature.hit_points = hit_points.ok_or_else(|| missing("hp"))?;
        creature.speeds = speeds.ok_or_else(|| missing("speed"))?;
        creature.challenge_rating = challenge.ok_or_else(|| missing("challenge"))?;
        Ok(creature)
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::ELEMENT)
            .with_attribute("size", token_text(self.size))
            .with_attribute("type", token_text(self.creature_type));
        if let Some(subtype) = &self.subtype {
            element.set_attribute("subtype", subtype.as_str());
        }

        element.push_element(XmlElement::with_text_content("title", self.title.as_str()));
        if let Some(alignment) = self.alignment {
            element.push_element(XmlElement::with_text_content(
                "alignment",
                token_text(alignment),
            ));
        }

        let mut ac = XmlElement::with_text_content("ac", self.armor_class.to_string());
        if let Some(armor_type) = &self.armor_type {
            ac.set_attribute("type", armor_type.as_str());
        }
        element.push_element(ac);

        let mut hp = XmlElement::with_text_content("hp", self.hit_points.as_str());
        if let Some(roll) = &self.hit_point_roll {
            hp.set_attribute("roll", roll.as_str());
        }
        element.push_element(hp);
        element.push_element(self.speeds.to_element());

        if !self.stats.is_empty() {
            element.push_element(self.stats.to_element());
        }

        if !self.saving_throws.is_empty() {
            let mut saves = XmlElement::new("saves");
            for (ability, bonus) in &self.saving_throws {
                saves.set_attribute(ability.to_string(), signed(*bonus));
            }
            element.push_element(saves);
        }
        for (skill, bonus) in &self.skills {
            element.push_element(
                XmlElement::with_text_content("skill", signed(*bonus))
                    .with_attribute("name", token_text(skill)),
            );
        }

        for (tag, values) in [
            ("vulnerable", &self.vulnerabilities),
            ("dmgresist", &self.resistances),
            ("dmgimmune", &self.immunities),
            ("statimmune", &self.condition_immunities),
        ] {
            for value in values {
                element.push_element(XmlElement::with_text_content(tag, value.as_str()));
            }
        }

        if self.passive_perception.is_some() || !self.senses.is_empty() {
            let mut senses = XmlElement::new("senses");
            if let Some(perception) = self.passive_perception {
                senses.set_attribute("perception", perception.to_string());
            }
            for sense in &self.senses {
                senses.push_element(
                    XmlElement::with_text_content("sense", sense.range.to_string())
                        .with_attribute("name", sense.name.as_str()),
                );
            }
            element.push_element(senses);
        }

        for language in &self.languages {
            element.push_element(XmlElement::with_text_content("language", language.as_str()));
        }
        element.push_element(
            XmlElement::with_text_content("challenge", self.challenge_rating.as_str())
                .with_attribute("xp", self.xp.to_string()),
        );

        if !self.traits.is_empty() {
            element.push_element(write_entries("traits", "trait", &self.traits));
        }
        if !self.actions.is_empty() {
            element.push_element(write_entries("actions", "action", &self.actions));
        }
        if !self.reactions.is_empty() {
            element.push_element(write_entries("reactions", "action", &self.reactions));
        }
        if !self.legendary_actions.is_empty() || self.legendary_action_count > 0 {
            let mut legendary = XmlElement::new("legendaryactions")
                .with_attribute("available", self.legendary_action_count.to_string());
            for action in &self.legendary_actions {
                legendary.push_element(action.to_xml());
            }
            element.push_element(legendary);
        }
        if !self.description.is_empty() {
            element.push_element(self.description.to_xml());
        }
        element
    }
}

fn write_section(
    f: &mut fmt::Formatter<'_>,
    heading: &str,
    entries: &[Vec<Paragraph>],
) -> fmt::Result {
    if entries.is_empty() {
        return Ok(());
    }
    writeln!(f, "{heading}")?;
    writeln!(f, "{DIVIDER}")?;
    for entry in entries {
        for paragraph in entry {
            write!(f, "{paragraph}")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

impl fmt::Display for Creature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.subtitle())?;
        writeln!(f, "{DIVIDER}")?;

        write!(f, "Armor Class {}", self.armor_class)?;
        if let Some(armor_type) = non_empty(&self.armor_type) {
            write!(f, " ({armor_type})")?;
        }
        writeln!(f)?;
        write!(f, "Hit Points {}", self.hit_points)?;
        if let Some(roll) = non_empty(&self.hit_point_roll) {
            write!(f, " ({roll})")?;
        }
        writeln!(f)?;
        writeln!(f, "Speed {}", self.speeds)?;
        writeln!(f, "{DIVIDER}")?;

        for ability in Ability::iter() {
            writeln!(
                f,
                "{} {} ({})",
                ability.to_string().to_uppercase(),
                self.stats.get(ability),
                signed(self.stats.modifier(ability))
            )?;
        }
        writeln!(f, "{DIVIDER}")?;

        if !self.saving_throws.is_empty() {
            let saves: Vec<String> = self
                .saving_throws
                .iter()
                .map(|(ability, bonus)| format!("{} {}", capitalize(ability.as_ref()), signed(*bonus)))
                .collect();
            writeln!(f, "Saving Throws {}", saves.join(", "))?;
        }
        if !self.skills.is_empty() {
            let skills: Vec<String> = self
                .skills
                .iter()
                .map(|(skill, bonus)| format!("{} {}", skill.title(), signed(*bonus)))
                .collect();
            writeln!(f, "Skills {}", skills.join(", "))?;
        }
        for (label, values, separator) in [
            ("Damage Vulnerabilities", &self.vulnerabilities, ", "),
            ("Damage Resistances", &self.resistances, "; "),
            ("Damage Immunities", &self.immunities, ", "),
            ("Condition Immunities", &self.condition_immunities, ", "),
        ] {
            if !values.is_empty() {
                let lowered: Vec<String> = values.iter().map(|v| v.to_lowercase()).collect();
                writeln!(f, "{label} {}", lowered.join(separator))?;
            }
        }

        f.write_str("Senses ")?;
        for sense in &self.senses {
            write!(f, "{} {} ft., ", sense.name.to_lowercase(), sense.range)?;
        }
        writeln!(f, "passive Perception {}", self.passive_perception_score())?;

        if self.languages.is_empty() {
            writeln!(f, "Languages \u{2014}")?;
        } else {
            writeln!(f, "Languages {}", self.languages.join(", "))?;
        }
        writeln!(
            f,
            "Challenge {} ({} XP)",
            self.challenge_rating,
            thousands(self.xp)
        )?;
        writeln!(f, "{DIVIDER}")?;

        for entry in &self.traits {
            for paragraph in entry {
                write!(f, "{paragraph}")?;
            }
            writeln!(f)?;
        }
        write_section(f, "ACTIONS", &self.actions)?;
        write_section(f, "REACTIONS", &self.reactions)?;

        if !self.legendary_actions.is_empty() {
            writeln!(f, "LEGENDARY ACTIONS")?;
            writeln!(f, "{DIVIDER}")?;
            writeln!(f, "{}", self.legendary_preamble())?;
            writeln!(f)?;
            for action in &self.legendary_actions {
                writeln!(f, "{action}")?;
            }
        }

        if !self.description.is_empty() {
            write!(f, "{}", self.description)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWLBEAR: &str = r#"<creature size="large" type="monstrosity">
  <title>Owlbear</title>
  <alignment>unaligned</alignment>
  <ac type="natural armor">13</ac>
  <hp roll="7d10+21">59</hp>
  <speed>40</speed>
  <statblock str="20" dex="12" con="17" int="3" wis="12" cha="7"/>
  <skill name="perception">+3</skill>
  <senses perception="13"><sense name="darkvision">60</sense></senses>
  <challenge xp="700">3</challenge>
  <traits>
    <trait><p><em>Keen Sight and Smell.</em> The owlbear has advantage on Wisdom (Perception) checks.</p></trait>
  </traits>
  <actions>
    <action><p><em>Multiattack.</em> The owlbear makes two attacks.</p></action>
    <action><p><em>Beak.</em> Melee Weapon Attack: +7 to hit.</p></action>
  </actions>
</creature>"#;

    const DRAGON: &str = r#"<creature size="huge" type="dragon" subtype="chromatic">
  <title>Adult Red Dragon</title>
  <alignment>chaotic evil</alignment>
  <ac type="natural armor">19</ac>
  <hp roll="19d12+133">256</hp>
  <speed fly="80" hover="true" swim="30">40</speed>
  <statblock str="27" dex="10" con="25" int="16" wis="13" cha="21"/>
  <saves dex="+6" con="+13" wis="+7" cha="+11"/>
  <skill name="perception">+13</skill>
  <skill name="stealth">+6</skill>
  <dmgimmune>Fire</dmgimmune>
  <senses perception="23"><sense name="blindsight">60</sense><sense name="darkvision">120</sense></senses>
  <language>Common</language>
  <language>Draconic</language>
  <challenge xp="18000">17</challenge>
  <legendaryactions available="3">
    <action cost="1"><p>The dragon makes a Wisdom (Perception) check.</p></action>
    <action cost="2"><p>The dragon beats its wings.</p></action>
  </legendaryactions>
</creature>"#;

    #[test]
    fn parses_owlbear() {
        let owlbear = Creature::from_xml_str(OWLBEAR).unwrap();
        assert_eq!(owlbear.title, "Owlbear");
        assert_eq!(owlbear.size, CreatureSize::Large);
        assert_eq!(owlbear.creature_type, CreatureType::Monstrosity);
        assert_eq!(owlbear.alignment, Some(Alignment::Unaligned));
        assert_eq!(owlbear.armor_class, 13);
        assert_eq!(owlbear.armor_type.as_deref(), Some("natural armor"));
        assert_eq!(owlbear.hit_points, "59");
        assert_eq!(owlbear.speeds.walk, 40);
        assert_eq!(owlbear.stats.intelligence, Some(3));
        assert_eq!(owlbear.skill(Skill::Perception), Some(3));
        assert_eq!(owlbear.passive_perception, Some(13));
        assert_eq!(owlbear.senses, vec![Sense { name: "darkvision".into(), range: 60 }]);
        assert_eq!(owlbear.xp, 700);
        assert_eq!(owlbear.traits.len(), 1);
        assert_eq!(owlbear.actions.len(), 2);
        assert_eq!(owlbear.subtitle(), "Large monstrosity, unaligned");
    }

    #[test]
    fn modifiers_floor() {
        let mut creature = Creature::new("Test", CreatureSize::Medium, CreatureType::Humanoid);
        creature.stats.set(Ability::Str, 7);
        creature.stats.set(Ability::Dex, 15);
        creature.stats.set(Ability::Con, 1);
        assert_eq!(creature.modifier("str"), -2);
        assert_eq!(creature.modifier("dex"), 2);
        assert_eq!(creature.modifier("con"), -5);
        assert_eq!(creature.modifier("int"), 0);
        assert_eq!(creature.modifier("luck"), 0);
    }

    #[test]
    fn modifiers_hold_at_extreme_scores() {
        let xml = OWLBEAR.replace(r#"str="20""#, r#"str="-2147483648""#)
            .replace(r#"dex="12""#, r#"dex="2147483647""#);
        let creature = Creature::from_xml_str(&xml).unwrap();
        assert_eq!(creature.modifier("str"), -1_073_741_829);
        assert_eq!(creature.modifier("dex"), 1_073_741_818);
        assert!(creature.to_string().contains("STR -2147483648 (-1073741829)\n"));
    }

    #[test]
    fn hover_speed() {
        let dragon = Creature::from_xml_str(DRAGON).unwrap();
        assert_eq!(
            dragon.speeds.flight,
            Some(Flight {
                speed: 80,
                hover: true
            })
        );
        assert_eq!(dragon.speeds.swim, Some(30));
        assert_eq!(dragon.speeds.to_string(), "40 ft., fly 80 ft. (hover), swim 30 ft.");
        assert_eq!(dragon.saving_throws.get(&Ability::Con), Some(&13));
        assert_eq!(dragon.alignment, Some(Alignment::ChaoticEvil));
        assert_eq!(dragon.subtitle(), "Huge dragon (chromatic), chaotic evil");
    }

    #[test]
    fn renders_stat_block() {
        let text = Creature::from_xml_str(DRAGON).unwrap().to_string();
        assert!(text.starts_with("Adult Red Dragon\nHuge dragon (chromatic), chaotic evil\n------------------\n"));
        assert!(text.contains("Armor Class 19 (natural armor)\n"));
        assert!(text.contains("Hit Points 256 (19d12+133)\n"));
        assert!(text.contains("STR 27 (+8)\n"));
        assert!(text.contains("DEX 10 (+0)\n"));
        assert!(text.contains("Saving Throws Dex +6, Con +13, Wis +7, Cha +11\n"));
        assert!(text.contains("Skills Perception +13, Stealth +6\n"));
        assert!(text.contains("Damage Immunities fire\n"));
        assert!(text.contains(
            "Senses blindsight 60 ft., darkvision 120 ft., passive Perception 23\n"
        ));
        assert!(text.contains("Languages Common, Draconic\n"));
        assert!(text.contains("Challenge 17 (18,000 XP)\n"));
        assert!(text.contains(
            "The adult red dragon can take 3 legendary actions, using the options below. \
             It can take only one legendary action at a time, and only at the end of another \
             creature's turn. Spent legendary actions are regained at the start of its turn.\n"
        ));
        assert!(text.contains("(Costs 2 Actions) The dragon beats its wings.\n"));
    }

    #[test]
    fn renders_without_languages() {
        let text = Creature::from_xml_str(OWLBEAR).unwrap().to_string();
        assert!(text.contains("Languages \u{2014}\n"));
        assert!(text.contains("ACTIONS\n------------------\nMultiattack. The owlbear makes two attacks.\n\n"));
        assert!(!text.contains("LEGENDARY ACTIONS"));
    }

    #[test]
    fn round_trips_structure() {
        for xml in [OWLBEAR, DRAGON] {
            let source = XmlElement::parse(xml).unwrap();
            let creature = Creature::from_xml(&source).unwrap();
            let written = creature.to_xml();
            assert!(written.structurally_eq(&source), "{xml}");
            assert_eq!(Creature::from_xml(&written).unwrap(), creature);
        }
    }

    #[test]
    fn writes_back_only_what_was_given() {
        let xml = r#"<creature size="small" type="beast">
  <title>Stirge</title>
  <alignment>unaligned</alignment>
  <ac>14</ac>
  <hp>2</hp>
  <speed fly="40" hover="no">10</speed>
  <statblock str="4" dex="16"/>
  <skill name="stealth">+5</skill>
  <skill name="perception">+1</skill>
  <challenge xp="25">1/8</challenge>
  <legendaryactions available="1">
    <action><p>The stirge hums.</p></action>
  </legendaryactions>
</creature>"#;
        let source = XmlElement::parse(xml).unwrap();
        let stirge = Creature::from_xml(&source).unwrap();
        assert_eq!(stirge.stats.get(Ability::Con), DEFAULT_SCORE);
        assert_eq!(stirge.stats.score(Ability::Con), None);
        assert_eq!(stirge.passive_perception, None);
        assert_eq!(stirge.legendary_actions[0].cost(), 1);
        assert_eq!(
            stirge.skills,
            vec![(Skill::Stealth, 5), (Skill::Perception, 1)]
        );
        assert!(stirge.to_xml().structurally_eq(&source));

        let text = stirge.to_string();
        assert!(text.contains("Small beast, unaligned\n"));
        assert!(text.contains("CON 10 (+0)\n"));
        assert!(text.contains("Skills Stealth +5, Perception +1\n"));
        assert!(text.contains("Senses passive Perception 10\n"));
    }

    #[test]
    fn absent_alignment_renders_unaligned() {
        let xml = OWLBEAR.replace("<alignment>unaligned</alignment>", "");
        let source = XmlElement::parse(&xml).unwrap();
        let owlbear = Creature::from_xml(&source).unwrap();
        assert_eq!(owlbear.alignment, None);
        assert_eq!(owlbear.subtitle(), "Large monstrosity, unaligned");
        assert!(owlbear.to_xml().structurally_eq(&source));
    }

    #[test]
    fn skill_titles() {
        assert_eq!(Skill::SleightOfHand.title(), "Sleight of Hand");
        assert_eq!(Skill::AnimalHandling.title(), "Animal Handling");
        assert_eq!(parse_token::<Skill>("skill", "animal handling").unwrap(), Skill::AnimalHandling);
    }

    #[test]
    fn enumeration_fences() {
        let cases = [
            OWLBEAR.replace(r#"type="monstrosity""#, r#"type="vegetable""#),
            OWLBEAR.replace(r#"size="large""#, r#"size="colossal""#),
            OWLBEAR.replace(r#"size="large" "#, ""),
            OWLBEAR.replace("<alignment>unaligned</alignment>", "<alignment>lawful awesome</alignment>"),
            OWLBEAR.replace(r#"str="20""#, r#"luck="20""#),
            OWLBEAR.replace("<title>Owlbear</title>", ""),
            OWLBEAR.replace(r#"<challenge xp="700">3</challenge>"#, ""),
            OWLBEAR.replace("<speed>40</speed>", ""),
            OWLBEAR.replace("<trait>", "<p>").replace("</trait>", "</p>"),
        ];
        for xml in cases {
            let err = Creature::from_xml_str(&xml).unwrap_err();
            assert!(err.is_invalid_format(), "{err}");
        }
        assert!(Creature::from_xml(&XmlElement::new("monster")).unwrap_err().is_argument());
    }
}
