/// Configuration validation
///
/// Declarative per-field rules, evaluated independently of one another. The
/// same rule table validates typed working configurations and untyped
/// configuration documents read from disk.
use serde_json::Value;
use std::collections::BTreeMap;

use super::model::{Field, WorkingConfiguration};
use crate::error::TargetingError;

pub const PUBLISHER_REQUIRED: &str = "Publisher is required.";

/// Field errors keyed by field
pub type FieldErrors = BTreeMap<Field, String>;

/// Expected shape of an optional field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Text,
    /// A list of strings; a lone string is accepted as a one-element list
    TextList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// Must be present and a non-blank string
    Required,
    /// May be absent; if present must have the given shape
    Optional(Shape),
}

fn rule_for(field: Field) -> Option<Rule> {
    match field {
        Field::Publisher => Some(Rule::Required),
        Field::Preset => Some(Rule::Optional(Shape::Text)),
        Field::Domain | Field::AdSize => Some(Rule::Optional(Shape::TextList)),
        Field::Device
        | Field::Dsp
        | Field::Country
        | Field::UserMatch
        | Field::Viewability
        | Field::DirectInventory => None,
    }
}

/// What a rule sees of a field value
enum Slot<'a> {
    Absent,
    Text(&'a str),
    TextList,
    Other,
}

impl Rule {
    fn check(&self, field: Field, slot: &Slot<'_>) -> Option<String> {
        match (self, slot) {
            (Rule::Required, Slot::Text(text)) if !text.trim().is_empty() => None,
            (Rule::Required, Slot::Absent | Slot::Text(_)) => Some(required_message(field)),
            (Rule::Required, _) => Some(format!("{} must be a string.", field.label())),
            (Rule::Optional(_), Slot::Absent) => None,
            (Rule::Optional(Shape::Text), Slot::Text(_)) => None,
            (Rule::Optional(Shape::Text), _) => {
                Some(format!("{} must be a string.", field.label()))
            }
            (Rule::Optional(Shape::TextList), Slot::Text(_) | Slot::TextList) => None,
            (Rule::Optional(Shape::TextList), Slot::Other) => {
                Some(format!("{} must be a list of strings.", field.label()))
            }
        }
    }
}

fn required_message(field: Field) -> String {
    match field {
        Field::Publisher => PUBLISHER_REQUIRED.to_string(),
        other => format!("{} is required.", other.label()),
    }
}

fn config_slot(config: &WorkingConfiguration, field: Field) -> Slot<'_> {
    match field {
        Field::Publisher => Slot::Text(&config.publisher_id),
        Field::Preset => match &config.preset_id {
            Some(id) => Slot::Text(id),
            None => Slot::Absent,
        },
        Field::Domain | Field::AdSize | Field::Device | Field::Dsp => Slot::TextList,
        Field::Country => Slot::Text(&config.country),
        Field::UserMatch | Field::Viewability | Field::DirectInventory => Slot::Other,
    }
}

/// Keys a field may appear under in a document
fn document_keys(field: Field) -> &'static [&'static str] {
    match field {
        Field::Publisher => &["publisher", "publisherId"],
        Field::Preset => &["preset", "presetId"],
        Field::Domain => &["domain"],
        Field::AdSize => &["adSize"],
        Field::Device => &["device"],
        Field::Dsp => &["dsp"],
        Field::Country => &["country"],
        Field::UserMatch => &["userMatch"],
        Field::Viewability => &["viewability"],
        Field::DirectInventory => &["directInventory"],
    }
}

fn document_slot(document: &Value, field: Field) -> Slot<'_> {
    let value = document_keys(field)
        .iter()
        .filter_map(|key| document.get(*key))
        .find(|value| !value.is_null());

    match value {
        None => Slot::Absent,
        Some(Value::String(text)) => Slot::Text(text),
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => Slot::TextList,
        Some(_) => Slot::Other,
    }
}

fn evaluate<'a>(slot_of: impl Fn(Field) -> Slot<'a>) -> FieldErrors {
    Field::ALL
        .into_iter()
        .filter_map(|field| {
            let rule = rule_for(field)?;
            rule.check(field, &slot_of(field))
                .map(|message| (field, message))
        })
        .collect()
}

/// Validate a working configuration, returning every field error
pub fn validate_config(config: &WorkingConfiguration) -> FieldErrors {
    evaluate(|field| config_slot(config, field))
}

/// Validate an untyped configuration document
///
/// Accepts both the form's field names (`publisher`, `preset`) and the
/// serialized configuration names (`publisherId`, `presetId`).
pub fn validate_document(document: &Value) -> FieldErrors {
    evaluate(|field| document_slot(document, field))
}

/// Turn a set of field errors into a commit decision
pub fn ensure_valid(errors: FieldErrors) -> Result<(), TargetingError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TargetingError::Validation { fields: errors })
    }
}
