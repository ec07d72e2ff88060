/// Targeting configuration model
///
/// Defines the field vocabulary shared by the catalog, the capability table,
/// the validation rules and the form, plus the working configuration itself.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::PresetValues;

/// A named field of the targeting configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Publisher,
    Preset,
    Domain,
    AdSize,
    Device,
    Dsp,
    Country,
    UserMatch,
    Viewability,
    DirectInventory,
}

impl Field {
    /// Every field, in form order
    pub const ALL: [Field; 10] = [
        Field::Publisher,
        Field::Preset,
        Field::Domain,
        Field::AdSize,
        Field::Device,
        Field::Dsp,
        Field::Country,
        Field::UserMatch,
        Field::Viewability,
        Field::DirectInventory,
    ];

    /// Field name as it appears in configuration documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Publisher => "publisher",
            Field::Preset => "preset",
            Field::Domain => "domain",
            Field::AdSize => "adSize",
            Field::Device => "device",
            Field::Dsp => "dsp",
            Field::Country => "country",
            Field::UserMatch => "userMatch",
            Field::Viewability => "viewability",
            Field::DirectInventory => "directInventory",
        }
    }

    /// Human-readable label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            Field::Publisher => "Publisher",
            Field::Preset => "Preset",
            Field::Domain => "Domain",
            Field::AdSize => "Ad size",
            Field::Device => "Device",
            Field::Dsp => "DSP",
            Field::Country => "Country",
            Field::UserMatch => "User match",
            Field::Viewability => "Viewability",
            Field::DirectInventory => "Direct inventory",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The configuration under edit
///
/// Multi-select fields are ordered sets so that two configurations holding
/// the same selections compare equal regardless of selection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingConfiguration {
    pub publisher_id: String,
    #[serde(default)]
    pub preset_id: Option<String>,
    #[serde(default)]
    pub domain: BTreeSet<String>,
    #[serde(default)]
    pub ad_size: BTreeSet<String>,
    #[serde(default)]
    pub device: BTreeSet<String>,
    #[serde(default)]
    pub dsp: BTreeSet<String>,
    pub country: String,
    #[serde(default)]
    pub user_match: bool,
    #[serde(default)]
    pub viewability: u8,
    #[serde(default)]
    pub direct_inventory: bool,
}

/// A complete field-value bundle, as produced by a preset or a commit
pub type ValueBundle = WorkingConfiguration;

impl WorkingConfiguration {
    /// Build the bundle a preset describes for its publisher
    pub fn from_preset(publisher_id: &str, preset_id: &str, values: &PresetValues) -> Self {
        Self {
            publisher_id: publisher_id.to_string(),
            preset_id: Some(preset_id.to_string()),
            domain: values.domain.clone(),
            ad_size: values.ad_size.clone(),
            device: values.device.clone(),
            dsp: values.dsp.clone(),
            country: values.country.clone(),
            user_match: values.user_match,
            viewability: values.viewability,
            direct_inventory: values.direct_inventory,
        }
    }

    /// A configuration with every editable field at its neutral value
    pub fn neutral(publisher_id: &str, country: &str) -> Self {
        Self {
            publisher_id: publisher_id.to_string(),
            preset_id: None,
            domain: BTreeSet::new(),
            ad_size: BTreeSet::new(),
            device: BTreeSet::new(),
            dsp: BTreeSet::new(),
            country: country.to_string(),
            user_match: false,
            viewability: 0,
            direct_inventory: false,
        }
    }

    /// Force a field back to its type-appropriate neutral value
    ///
    /// `publisher`, `preset` and `country` have no neutral value and are left alone.
    pub fn reset_to_neutral(&mut self, field: Field) {
        match field {
            Field::Domain => self.domain.clear(),
            Field::AdSize => self.ad_size.clear(),
            Field::Device => self.device.clear(),
            Field::Dsp => self.dsp.clear(),
            Field::UserMatch => self.user_match = false,
            Field::Viewability => self.viewability = 0,
            Field::DirectInventory => self.direct_inventory = false,
            Field::Publisher | Field::Preset | Field::Country => {}
        }
    }

    /// Whether a field currently holds its neutral value
    pub fn is_neutral(&self, field: Field) -> bool {
        match field {
            Field::Domain => self.domain.is_empty(),
            Field::AdSize => self.ad_size.is_empty(),
            Field::Device => self.device.is_empty(),
            Field::Dsp => self.dsp.is_empty(),
            Field::UserMatch => !self.user_match,
            Field::Viewability => self.viewability == 0,
            Field::DirectInventory => !self.direct_inventory,
            Field::Publisher | Field::Preset | Field::Country => true,
        }
    }

    /// The current value of an editable field, in `setField` form
    pub fn value_of(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Publisher | Field::Preset => None,
            Field::Domain => Some(FieldValue::Domain(self.domain.clone())),
            Field::AdSize => Some(FieldValue::AdSize(AdSizeInput::Selection(
                self.ad_size.clone(),
            ))),
            Field::Device => Some(FieldValue::Device(self.device.clone())),
            Field::Dsp => Some(FieldValue::Dsp(self.dsp.clone())),
            Field::Country => Some(FieldValue::Country(self.country.clone())),
            Field::UserMatch => Some(FieldValue::UserMatch(self.user_match)),
            Field::Viewability => Some(FieldValue::Viewability(self.viewability)),
            Field::DirectInventory => Some(FieldValue::DirectInventory(self.direct_inventory)),
        }
    }

    /// Fields whose values differ from `other`
    pub fn diff(&self, other: &WorkingConfiguration) -> BTreeSet<Field> {
        let mut changed = BTreeSet::new();
        if self.publisher_id != other.publisher_id {
            changed.insert(Field::Publisher);
        }
        if self.preset_id != other.preset_id {
            changed.insert(Field::Preset);
        }
        for field in Field::ALL {
            if field != Field::Publisher
                && field != Field::Preset
                && self.value_of(field) != other.value_of(field)
            {
                changed.insert(field);
            }
        }
        changed
    }
}

/// A single-field edit
///
/// `publisher` and `preset` are not editable through this type; they change
/// through publisher and preset selection, which carry cascades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    Domain(BTreeSet<String>),
    AdSize(AdSizeInput),
    Device(BTreeSet<String>),
    Dsp(BTreeSet<String>),
    Country(String),
    UserMatch(bool),
    Viewability(u8),
    DirectInventory(bool),
}

impl FieldValue {
    pub fn field(&self) -> Field {
        match self {
            FieldValue::Domain(_) => Field::Domain,
            FieldValue::AdSize(_) => Field::AdSize,
            FieldValue::Device(_) => Field::Device,
            FieldValue::Dsp(_) => Field::Dsp,
            FieldValue::Country(_) => Field::Country,
            FieldValue::UserMatch(_) => Field::UserMatch,
            FieldValue::Viewability(_) => Field::Viewability,
            FieldValue::DirectInventory(_) => Field::DirectInventory,
        }
    }
}

/// Ad-size input: either a full selection or a single user-typed size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdSizeInput {
    /// Free text typed by the user; becomes the whole selection
    Literal(String),
    /// Replacement for the full selection
    Selection(BTreeSet<String>),
}

impl AdSizeInput {
    /// The selection this input resolves to
    pub fn into_selection(self) -> BTreeSet<String> {
        match self {
            AdSizeInput::Literal(size) => BTreeSet::from([size]),
            AdSizeInput::Selection(sizes) => sizes,
        }
    }
}
