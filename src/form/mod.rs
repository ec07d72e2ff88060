//! Targeting configuration form
//!
//! The stateful editor: holds the working configuration and the last
//! committed baseline, runs cascades through the reducer, re-validates after
//! every mutation and tracks whether the working configuration has diverged
//! from the baseline.
//!
//! One form belongs to one editing session. All operations run to completion
//! synchronously, so every cascade is visible to the very next render.

pub mod reducer;
pub mod state;

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use reducer::{Event, Reducer, Reduction, Rejection};
pub use state::FormState;

use crate::catalog::{Catalog, DomainOption, Preset};
use crate::config::{
    ensure_valid, validate_config, CapabilityMap, CapabilityResolver, Field, FieldErrors,
    FieldValue, PresetOnPublisherChange, PresetResolver, ValueBundle, WorkingConfiguration,
};
use crate::error::TargetingError;

/// Result of a form event; only single-field edits are ever rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetFieldOutcome {
    Applied,
    Rejected(Rejection),
}

impl SetFieldOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SetFieldOutcome::Applied)
    }
}

pub struct ConfigurationForm {
    catalog: Arc<Catalog>,
    policy: PresetOnPublisherChange,
    working: WorkingConfiguration,
    committed: WorkingConfiguration,
    capabilities: CapabilityMap,
    committed_capabilities: CapabilityMap,
    errors: FieldErrors,
    touched: BTreeSet<Field>,
    dirty: bool,
}

impl ConfigurationForm {
    /// Start a session on the publisher's first preset
    pub fn initialize(
        catalog: Arc<Catalog>,
        default_publisher_id: &str,
    ) -> Result<Self, TargetingError> {
        Self::initialize_with_policy(
            catalog,
            default_publisher_id,
            PresetOnPublisherChange::default(),
        )
    }

    /// Start a session with an explicit preset policy for publisher changes
    pub fn initialize_with_policy(
        catalog: Arc<Catalog>,
        default_publisher_id: &str,
        policy: PresetOnPublisherChange,
    ) -> Result<Self, TargetingError> {
        let capabilities = CapabilityResolver::new(&catalog).resolve(default_publisher_id)?;

        let working = match PresetResolver::new(&catalog).resolve_default(default_publisher_id) {
            Some(bundle) => bundle,
            None => {
                warn!(
                    "Publisher '{}' has no presets, starting from neutral values",
                    default_publisher_id
                );
                WorkingConfiguration::neutral(default_publisher_id, catalog.fallback_country())
            }
        };

        info!(
            "Initialized targeting form for publisher '{}' (preset {:?})",
            working.publisher_id, working.preset_id
        );

        let mut form = Self {
            catalog,
            policy,
            committed: working.clone(),
            working,
            capabilities,
            committed_capabilities: capabilities,
            errors: FieldErrors::new(),
            touched: BTreeSet::new(),
            dirty: false,
        };
        form.refresh();
        Ok(form)
    }

    /// Switch publisher, cascading scope filtering and capability changes
    ///
    /// The preset id is handled per the form's `PresetOnPublisherChange` policy;
    /// no preset values are applied.
    pub fn select_publisher(&mut self, publisher_id: &str) -> Result<(), TargetingError> {
        self.dispatch(&Event::SelectPublisher {
            publisher: publisher_id.to_string(),
        })?;
        Ok(())
    }

    /// Replace the whole working configuration with a preset of the current publisher
    pub fn select_preset(&mut self, preset_id: &str) -> Result<(), TargetingError> {
        self.dispatch(&Event::SelectPreset {
            preset: preset_id.to_string(),
        })?;
        Ok(())
    }

    /// Unset the preset selection, keeping every field value
    pub fn clear_preset(&mut self) {
        if let Err(e) = self.dispatch(&Event::ClearPreset) {
            warn!("Clearing preset failed: {}", e);
        }
    }

    /// Edit one field
    ///
    /// Edits to disabled fields and out-of-domain values are ignored, not raised.
    pub fn set_field(&mut self, value: FieldValue) -> SetFieldOutcome {
        let field = value.field();
        match self.dispatch(&Event::SetField(value)) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Edit of '{}' failed: {}", field, e);
                SetFieldOutcome::Rejected(Rejection::Unresolved(e))
            }
        }
    }

    /// Run one event through the reducer and fold the result into the form
    ///
    /// Unknown publisher or preset ids leave the form untouched. A rejected
    /// edit leaves it untouched too and is reported in the outcome.
    pub fn dispatch(&mut self, event: &Event) -> Result<SetFieldOutcome, TargetingError> {
        let reducer = Reducer::new(&self.catalog, self.policy);
        let reduction = reducer.reduce(self.working.clone(), event)?;
        if let Some(rejection) = reduction.rejection {
            return Ok(SetFieldOutcome::Rejected(rejection));
        }

        self.working = reduction.config;
        self.capabilities = reduction.capabilities;
        self.touched.insert(match event {
            Event::SelectPublisher { .. } => Field::Publisher,
            Event::SelectPreset { .. } | Event::ClearPreset => Field::Preset,
            Event::SetField(value) => value.field(),
        });
        self.refresh();
        Ok(SetFieldOutcome::Applied)
    }

    /// Freeze the working configuration as the new baseline
    ///
    /// On validation failure the working configuration is left as it is and
    /// every field is marked touched so that all errors become visible.
    pub fn commit(&mut self) -> Result<ValueBundle, TargetingError> {
        self.touched.extend(Field::ALL);
        self.errors = validate_config(&self.working);
        if let Err(err) = ensure_valid(self.errors.clone()) {
            warn!("Commit rejected: {}", err);
            return Err(err);
        }

        self.committed = self.working.clone();
        self.committed_capabilities = self.capabilities;
        self.dirty = false;
        info!(
            "Committed targeting configuration for publisher '{}' (preset {:?})",
            self.committed.publisher_id, self.committed.preset_id
        );
        Ok(self.committed.clone())
    }

    /// Return to the last committed baseline
    pub fn discard(&mut self) {
        debug!("Discarding edits to {:?}", self.changed_fields());
        self.working = self.committed.clone();
        self.capabilities = self.committed_capabilities;
        self.touched.clear();
        self.refresh();
    }

    fn refresh(&mut self) {
        self.errors = validate_config(&self.working);
        self.dirty = self.working != self.committed;
    }

    /// Raw access for tests that need states the public API cannot reach
    #[cfg(test)]
    pub(crate) fn working_mut(&mut self) -> &mut WorkingConfiguration {
        &mut self.working
    }

    pub fn values(&self) -> &WorkingConfiguration {
        &self.working
    }

    pub fn committed(&self) -> &WorkingConfiguration {
        &self.committed
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn touched(&self) -> &BTreeSet<Field> {
        &self.touched
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn capabilities(&self) -> &CapabilityMap {
        &self.capabilities
    }

    pub fn is_disabled(&self, field: Field) -> bool {
        !self.capabilities.is_enabled(field)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fields that differ from the committed baseline
    pub fn changed_fields(&self) -> BTreeSet<Field> {
        self.working.diff(&self.committed)
    }

    /// Domains selectable for the current publisher
    pub fn domain_options(&self) -> Vec<&DomainOption> {
        self.catalog.domains(&self.working.publisher_id)
    }

    /// Presets selectable for the current publisher
    pub fn preset_options(&self) -> Vec<&Preset> {
        self.catalog.presets(&self.working.publisher_id)
    }

    /// Snapshot for the rendering layer
    pub fn state(&self) -> FormState {
        FormState {
            values: self.working.clone(),
            errors: self.errors.clone(),
            touched: self.touched.clone(),
            dirty: self.dirty,
            disabled: self.capabilities.disabled_fields(),
            capabilities: self.capabilities,
        }
    }
}
