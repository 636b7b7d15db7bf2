//! Random lookup tables.
//!
//! A table is rolled with a single die. Each `<row>` claims an inclusive
//! range of that die and each `<column>` holds one result per row, in row
//! order. Results are stored as data; nothing here rolls dice.
//!
//! ```xml
//! <lookup die="100">
//!   <title>Treasure Hoard</title>
//!   <row startRange="1" endRange="50"/>
//!   <row startRange="51" endRange="100"/>
//!   <column title="Coins">
//!     <coinage denomination="gp" amount="10"/>
//!     <coinage denomination="sp" die="6" quantity="2" mult="100"/>
//!   </column>
//!   <column title="Magic Items">
//!     <item name="Potion of Healing"/>
//!     <roll name="Magic Item Table A" die="4"/>
//!   </column>
//! </lookup>
//! ```

use std::fmt;
use std::ops::RangeInclusive;

use crate::description::Description;
use crate::error::{FormatError, Result};
use crate::mapping::XmlMapping;
use crate::vocab::{expect_element, non_empty, optional_number, required_attribute, required_number};
use crate::xml::XmlElement;

// ============================================================================
// Dice
// ============================================================================

/// Dice notation such as `2d6×100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomRoll {
    pub die: u32,
    /// Number of dice rolled, when stated.
    pub quantity: Option<u32>,
    /// Factor applied to the total, when stated.
    pub multiplier: Option<u32>,
}

impl RandomRoll {
    /// A single roll of one die.
    pub const fn new(die: u32) -> Self {
        Self {
            die,
            quantity: None,
            multiplier: None,
        }
    }

    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub const fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Number of dice rolled; one unless stated.
    pub fn quantity(&self) -> u32 {
        self.quantity.unwrap_or(1)
    }

    /// Factor applied to the total; one unless stated.
    pub fn multiplier(&self) -> u32 {
        self.multiplier.unwrap_or(1)
    }

    /// Reads `die`, `quantity` and `mult` from an element.
    fn from_attributes(element: &XmlElement, element_name: &'static str) -> Result<Self> {
        Ok(Self {
            die: required_number(element, element_name, "die")?,
            quantity: optional_number(element, "quantity")?,
            multiplier: optional_number(element, "mult")?,
        })
    }

    fn write_attributes(&self, element: &mut XmlElement) {
        element.set_attribute("die", self.die.to_string());
        if let Some(quantity) = self.quantity {
            element.set_attribute("quantity", quantity.to_string());
        }
        if let Some(multiplier) = self.multiplier {
            element.set_attribute("mult", multiplier.to_string());
        }
    }
}

impl fmt::Display for RandomRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quantity() > 1 {
            write!(f, "{}", self.quantity())?;
        }
        write!(f, "d{}", self.die)?;
        if self.multiplier() > 1 {
            write!(f, "\u{00D7}{}", self.multiplier())?;
        }
        Ok(())
    }
}

// ============================================================================
// Results
// ============================================================================

/// How much coinage a result awards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Coinage {
    Preset(u32),
    Random(RandomRoll),
}

/// An amount of coins, e.g. "10 gp" or "2d6×100 sp".
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoinageResult {
    pub denomination: String,
    pub amount: Coinage,
}

impl XmlMapping for CoinageResult {
    const ELEMENT: &'static str = "coinage";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;
        let denomination = required_attribute(element, Self::ELEMENT, "denomination")?;
        let amount = if let Some(amount) = optional_number(element, "amount")? {
            Coinage::Preset(amount)
        } else if element.attribute("die").is_some() {
            Coinage::Random(RandomRoll::from_attributes(element, Self::ELEMENT)?)
        } else {
            return Err(FormatError::Invalid(
                "<coinage> element must have either an 'amount' or a 'die' attribute".into(),
            ));
        };
        Ok(Self {
            denomination,
            amount,
        })
    }

    fn to_xml(&self) -> XmlElement {
        let mut element =
            XmlElement::new(Self::ELEMENT).with_attribute("denomination", self.denomination.as_str());
        match &self.amount {
            Coinage::Preset(amount) => element.set_attribute("amount", amount.to_string()),
            Coinage::Random(roll) => roll.write_attributes(&mut element),
        }
        element
    }
}

impl fmt::Display for CoinageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.amount {
            Coinage::Preset(amount) => write!(f, "{amount} {}", self.denomination),
            Coinage::Random(roll) => write!(f, "{roll} {}", self.denomination),
        }
    }
}

/// A named item.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemResult {
    pub item_name: String,
}

impl XmlMapping for ItemResult {
    const ELEMENT: &'static str = "item";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;
        Ok(Self {
            item_name: required_attribute(element, Self::ELEMENT, "name")?,
        })
    }

    fn to_xml(&self) -> XmlElement {
        XmlElement::new(Self::ELEMENT).with_attribute("name", self.item_name.as_str())
    }
}

/// A reference to roll on another table, possibly several times.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableRoll {
    /// Title of the table to roll on.
    pub name: String,
    pub die: u32,
    /// Number of dice rolled, when stated.
    pub quantity: Option<u32>,
}

impl TableRoll {
    /// Number of dice rolled; one unless stated.
    pub fn quantity(&self) -> u32 {
        self.quantity.unwrap_or(1)
    }
}

impl XmlMapping for TableRoll {
    const ELEMENT: &'static str = "roll";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;
        Ok(Self {
            name: required_attribute(element, Self::ELEMENT, "name")?,
            die: required_number(element, Self::ELEMENT, "die")?,
            quantity: optional_number(element, "quantity")?,
        })
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::ELEMENT)
            .with_attribute("name", self.name.as_str())
            .with_attribute("die", self.die.to_string());
        if let Some(quantity) = self.quantity {
            element.set_attribute("quantity", quantity.to_string());
        }
        element
    }
}

impl fmt::Display for TableRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Roll ")?;
        if self.quantity() > 1 {
            write!(f, "{}", self.quantity())?;
        }
        write!(f, "d{} times on {}", self.die, self.name)
    }
}

/// One cell of a lookup column.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LookupResult {
    Coinage(CoinageResult),
    Item(ItemResult),
    Lookup(TableRoll),
    Description(Description),
}

impl LookupResult {
    /// Dispatches a column child to its result type.
    pub fn from_xml(element: &XmlElement) -> Result<Self> {
        Ok(match element.name() {
            CoinageResult::ELEMENT => LookupResult::Coinage(CoinageResult::from_xml(element)?),
            ItemResult::ELEMENT => LookupResult::Item(ItemResult::from_xml(element)?),
            TableRoll::ELEMENT => LookupResult::Lookup(TableRoll::from_xml(element)?),
            Description::ELEMENT => LookupResult::Description(Description::from_xml(element)?),
            other => {
                return Err(FormatError::UnexpectedElement {
                    parent: LookupColumn::ELEMENT,
                    child: other.to_string(),
                });
            }
        })
    }

    pub fn to_xml(&self) -> XmlElement {
        match self {
            LookupResult::Coinage(coinage) => coinage.to_xml(),
            LookupResult::Item(item) => item.to_xml(),
            LookupResult::Lookup(roll) => roll.to_xml(),
            LookupResult::Description(description) => description.to_xml(),
        }
    }
}

impl fmt::Display for LookupResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupResult::Coinage(coinage) => fmt::Display::fmt(coinage, f),
            LookupResult::Item(item) => f.write_str(&item.item_name),
            LookupResult::Lookup(roll) => fmt::Display::fmt(roll, f),
            LookupResult::Description(description) => {
                f.write_str(description.to_string().trim_end())
            }
        }
    }
}

impl From<CoinageResult> for LookupResult {
    fn from(value: CoinageResult) -> Self {
        LookupResult::Coinage(value)
    }
}

impl From<ItemResult> for LookupResult {
    fn from(value: ItemResult) -> Self {
        LookupResult::Item(value)
    }
}

impl From<TableRoll> for LookupResult {
    fn from(value: TableRoll) -> Self {
        LookupResult::Lookup(value)
    }
}

impl From<Description> for LookupResult {
    fn from(value: Description) -> Self {
        LookupResult::Description(value)
    }
}

// ============================================================================
// Table
// ============================================================================

/// A titled column of results, one per table row.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LookupColumn {
    pub title: String,
    pub results: Vec<LookupResult>,
}

impl XmlMapping for LookupColumn {
    const ELEMENT: &'static str = "column";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;
        Ok(Self {
            title: required_attribute(element, Self::ELEMENT, "title")?,
            results: element
                .elements()
                .map(LookupResult::from_xml)
                .collect::<Result<_>>()?,
        })
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::ELEMENT).with_attribute("title", self.title.as_str());
        for result in &self.results {
            element.push_element(result.to_xml());
        }
        element
    }
}

/// A random table keyed by die ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "LookupTableParts"))]
pub struct LookupTable {
    /// Die rolled against the row ranges, e.g. 100 for a d100 table.
    pub die: u32,
    pub title: Option<String>,
    pub description: Description,
    rows: Vec<RangeInclusive<u32>>,
    pub columns: Vec<LookupColumn>,
}

/// Deserialized fields of a [`LookupTable`]; rows go through
/// [`LookupTable::add_row`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct LookupTableParts {
    die: u32,
    title: Option<String>,
    description: Description,
    rows: Vec<RangeInclusive<u32>>,
    columns: Vec<LookupColumn>,
}

#[cfg(feature = "serde")]
impl TryFrom<LookupTableParts> for LookupTable {
    type Error = FormatError;

    fn try_from(parts: LookupTableParts) -> Result<Self> {
        let mut table = LookupTable::new(parts.die);
        table.title = parts.title;
        table.description = parts.description;
        table.columns = parts.columns;
        for row in parts.rows {
            table.add_row(*row.start(), *row.end())?;
        }
        Ok(table)
    }
}

impl LookupTable {
    pub fn new(die: u32) -> Self {
        Self {
            die,
            title: None,
            description: Description::new(),
            rows: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Inclusive row ranges in document order.
    pub fn rows(&self) -> &[RangeInclusive<u32>] {
        &self.rows
    }

    /// Appends a row covering `start..=end`.
    pub fn add_row(&mut self, start: u32, end: u32) -> Result<()> {
        if start > end {
            return Err(FormatError::InvalidArgument(format!(
                "row range {start}-{end} is reversed"
            )));
        }
        self.rows.push(start..=end);
        Ok(())
    }

    /// Index of the row whose range contains `roll`.
    pub fn row_for(&self, roll: u32) -> Option<usize> {
        self.rows.iter().position(|range| range.contains(&roll))
    }

    fn read_row(element: &XmlElement) -> Result<RangeInclusive<u32>> {
        let start = required_number(element, "row", "startRange")?;
        let end = required_number(element, "row", "endRange")?;
        if start > end {
            return Err(FormatError::invalid_value("row range", format!("{start}-{end}")));
        }
        Ok(start..=end)
    }
}

impl XmlMapping for LookupTable {
    const ELEMENT: &'static str = "lookup";

    fn from_xml(element: &XmlElement) -> Result<Self> {
        expect_element(element, Self::ELEMENT)?;
        let mut table = LookupTable::new(required_number(element, Self::ELEMENT, "die")?);

        for child in element.elements() {
            match child.name() {
                "title" => table.title = Some(child.text()),
                "row" => table.rows.push(Self::read_row(child)?),
                LookupColumn::ELEMENT => table.columns.push(LookupColumn::from_xml(child)?),
                Description::ELEMENT => table.description = Description::from_xml(child)?,
                other => tracing::trace!(element = other, "skipping unknown lookup element"),
            }
        }
        Ok(table)
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::ELEMENT).with_attribute("die", self.die.to_string());
        if let Some(title) = &self.title {
            element.push_element(XmlElement::with_text_content("title", title.as_str()));
        }
        if !self.description.is_empty() {
            element.push_element(self.description.to_xml());
        }
        for row in &self.rows {
            element.push_element(
                XmlElement::new("row")
                    .with_attribute("startRange", row.start().to_string())
                    .with_attribute("endRange", row.end().to_string()),
            );
        }
        for column in &self.columns {
            element.push_element(column.to_xml());
        }
        element
    }
}

impl fmt::Display for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = non_empty(&self.title) {
            writeln!(f, "{title}")?;
        }
        write!(f, "{}", self.description)?;

        let mut header = vec![format!("d{}", self.die)];
        header.extend(self.columns.iter().map(|column| column.title.clone()));
        writeln!(f, "{}", header.join(" | "))?;

        for (index, range) in self.rows.iter().enumerate() {
            let mut cells = vec![if range.start() == range.end() {
                range.start().to_string()
            } else {
                format!("{}-{}", range.start(), range.end())
            }];
            cells.extend(self.columns.iter().map(|column| {
                column
                    .results
                    .get(index)
                    .map(ToString::to_string)
                    .unwrap_or_default()
            }));
            writeln!(f, "{}", cells.join(" | "))?;
        }
        Ok(())
    }
}
