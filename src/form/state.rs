//! Render-facing form snapshot

use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::{CapabilityMap, Field, FieldErrors, WorkingConfiguration};

/// Everything a renderer needs after a form operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub values: WorkingConfiguration,
    pub errors: FieldErrors,
    pub touched: BTreeSet<Field>,
    pub dirty: bool,
    pub disabled: BTreeSet<Field>,
    pub capabilities: CapabilityMap,
}

impl FormState {
    /// The error to display for a field
    ///
    /// Errors stay hidden until the field has been touched.
    pub fn visible_error(&self, field: Field) -> Option<&str> {
        if self.touched.contains(&field) {
            self.errors.get(&field).map(String::as_str)
        } else {
            None
        }
    }

    pub fn is_disabled(&self, field: Field) -> bool {
        self.disabled.contains(&field)
    }
}
