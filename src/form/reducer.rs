//! Cascade reducer
//!
//! Every form mutation is a pure step `(WorkingConfiguration, Event) ->
//! Reduction`. Cascade order is fixed:
//! 1. capability recompute for the (possibly new) publisher
//! 2. scope filtering of multi-select fields
//! 3. forced neutral values for disabled fields
//!
//! Validation and dirty tracking run afterwards, in the form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::{
    AdSizeInput, CapabilityMap, CapabilityResolver, Field, FieldValue, PresetOnPublisherChange,
    PresetResolver, ViewabilityMode, WorkingConfiguration,
};
use crate::error::TargetingError;

/// A user-originated form event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Event {
    SelectPublisher { publisher: String },
    SelectPreset { preset: String },
    ClearPreset,
    SetField(FieldValue),
}

/// Why a single-field edit was ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The publisher's plan disables the field
    Disabled(Field),
    /// A value outside the field's current option list
    OutOfScope { field: Field, value: String },
    /// An empty or whitespace-only ad size
    BlankAdSize,
    /// Viewability outside the current mode's value domain
    OutOfRange { value: u8, mode: ViewabilityMode },
    /// The working publisher does not resolve against the catalog
    Unresolved(TargetingError),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Disabled(field) => write!(f, "'{}' is disabled for this publisher", field),
            Rejection::OutOfScope { field, value } => {
                write!(f, "'{}' is not a selectable {}", value, field)
            }
            Rejection::BlankAdSize => f.write_str("ad size must not be blank"),
            Rejection::OutOfRange { value, mode } => {
                write!(f, "viewability {} is outside the {} mode range", value, mode)
            }
            Rejection::Unresolved(err) => write!(f, "{}", err),
        }
    }
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub config: WorkingConfiguration,
    /// Capabilities of the resulting configuration's publisher
    pub capabilities: CapabilityMap,
    /// Set when a single-field edit was ignored; `config` is then unchanged
    pub rejection: Option<Rejection>,
}

impl Reduction {
    fn applied(config: WorkingConfiguration, capabilities: CapabilityMap) -> Self {
        Self {
            config,
            capabilities,
            rejection: None,
        }
    }
}

/// Applies events to working configurations
pub struct Reducer<'a> {
    catalog: &'a Catalog,
    policy: PresetOnPublisherChange,
}

impl<'a> Reducer<'a> {
    pub fn new(catalog: &'a Catalog, policy: PresetOnPublisherChange) -> Self {
        Self { catalog, policy }
    }

    /// Apply one event
    ///
    /// Rejected single-field edits leave the configuration unchanged and are
    /// reported in the `Reduction`, not as errors; unknown publisher and
    /// preset ids are errors.
    pub fn reduce(
        &self,
        config: WorkingConfiguration,
        event: &Event,
    ) -> Result<Reduction, TargetingError> {
        match event {
            Event::SelectPublisher { publisher } => self.select_publisher(config, publisher),
            Event::SelectPreset { preset } => self.select_preset(&config, preset),
            Event::ClearPreset => {
                let capabilities = self.capabilities(&config.publisher_id)?;
                Ok(Reduction::applied(
                    WorkingConfiguration {
                        preset_id: None,
                        ..config
                    },
                    capabilities,
                ))
            }
            Event::SetField(value) => {
                let capabilities = self.capabilities(&config.publisher_id)?;
                if let Err(rejection) = self.check_field(&config, &capabilities, value) {
                    debug!("Ignoring edit of '{}': {}", value.field(), rejection);
                    return Ok(Reduction {
                        config,
                        capabilities,
                        rejection: Some(rejection),
                    });
                }
                let mut config = config;
                write_field(&mut config, value.clone());
                Ok(Reduction::applied(config, capabilities))
            }
        }
    }

    fn capabilities(&self, publisher_id: &str) -> Result<CapabilityMap, TargetingError> {
        CapabilityResolver::new(self.catalog).resolve(publisher_id)
    }

    fn select_publisher(
        &self,
        mut config: WorkingConfiguration,
        publisher_id: &str,
    ) -> Result<Reduction, TargetingError> {
        let capabilities = self.capabilities(publisher_id)?;
        let previous = std::mem::replace(&mut config.publisher_id, publisher_id.to_string());

        let selected = config.domain.len() + config.device.len() + config.dsp.len();
        config
            .domain
            .retain(|domain| self.catalog.has_domain(publisher_id, domain));
        config.device.retain(|id| self.catalog.has_device(id));
        config.dsp.retain(|id| self.catalog.has_dsp(id));
        let dropped = selected - (config.domain.len() + config.device.len() + config.dsp.len());

        config.preset_id =
            self.policy
                .next_preset_id(self.catalog, config.preset_id.take(), publisher_id);

        let forced = enforce_capabilities(&mut config, &capabilities);
        debug!(
            "Publisher '{}' -> '{}': dropped {} stale selection(s), forced {:?}",
            previous, publisher_id, dropped, forced
        );

        Ok(Reduction::applied(config, capabilities))
    }

    fn select_preset(
        &self,
        config: &WorkingConfiguration,
        preset_id: &str,
    ) -> Result<Reduction, TargetingError> {
        let capabilities = self.capabilities(&config.publisher_id)?;
        let mut bundle =
            PresetResolver::new(self.catalog).resolve(&config.publisher_id, preset_id)?;
        let forced = enforce_capabilities(&mut bundle, &capabilities);
        if !forced.is_empty() {
            debug!("Preset '{}' carried disabled values {:?}", preset_id, forced);
        }
        Ok(Reduction::applied(bundle, capabilities))
    }

    /// Decide whether a single-field edit is allowed
    pub fn check_field(
        &self,
        config: &WorkingConfiguration,
        capabilities: &CapabilityMap,
        value: &FieldValue,
    ) -> Result<(), Rejection> {
        let field = value.field();
        if !capabilities.is_enabled(field) {
            return Err(Rejection::Disabled(field));
        }

        let out_of_scope = |value: &String| Rejection::OutOfScope {
            field,
            value: value.clone(),
        };

        match value {
            FieldValue::Domain(domains) => {
                match domains
                    .iter()
                    .find(|d| !self.catalog.has_domain(&config.publisher_id, d))
                {
                    Some(domain) => Err(out_of_scope(domain)),
                    None => Ok(()),
                }
            }
            FieldValue::AdSize(AdSizeInput::Literal(size)) => {
                if size.trim().is_empty() {
                    Err(Rejection::BlankAdSize)
                } else {
                    Ok(())
                }
            }
            FieldValue::AdSize(AdSizeInput::Selection(sizes)) => {
                if sizes.iter().any(|size| size.trim().is_empty()) {
                    Err(Rejection::BlankAdSize)
                } else {
                    Ok(())
                }
            }
            FieldValue::Device(ids) => match ids.iter().find(|id| !self.catalog.has_device(id)) {
                Some(id) => Err(out_of_scope(id)),
                None => Ok(()),
            },
            FieldValue::Dsp(ids) => match ids.iter().find(|id| !self.catalog.has_dsp(id)) {
                Some(id) => Err(out_of_scope(id)),
                None => Ok(()),
            },
            FieldValue::Country(id) => {
                if self.catalog.has_country(id) {
                    Ok(())
                } else {
                    Err(out_of_scope(id))
                }
            }
            FieldValue::Viewability(value) => {
                if capabilities.viewability.accepts(*value) {
                    Ok(())
                } else {
                    Err(Rejection::OutOfRange {
                        value: *value,
                        mode: capabilities.viewability,
                    })
                }
            }
            FieldValue::UserMatch(_) | FieldValue::DirectInventory(_) => Ok(()),
        }
    }
}

/// Write an already-checked edit into a configuration
pub fn write_field(config: &mut WorkingConfiguration, value: FieldValue) {
    match value {
        FieldValue::Domain(domains) => config.domain = domains,
        FieldValue::AdSize(input) => config.ad_size = input.into_selection(),
        FieldValue::Device(ids) => config.device = ids,
        FieldValue::Dsp(ids) => config.dsp = ids,
        FieldValue::Country(id) => config.country = id,
        FieldValue::UserMatch(on) => config.user_match = on,
        FieldValue::Viewability(value) => config.viewability = value,
        FieldValue::DirectInventory(on) => config.direct_inventory = on,
    }
}

/// Force disabled fields to neutral values and viewability into its mode's domain
///
/// Returns the fields whose values changed.
pub fn enforce_capabilities(
    config: &mut WorkingConfiguration,
    capabilities: &CapabilityMap,
) -> BTreeSet<Field> {
    let mut forced = BTreeSet::new();

    for field in capabilities.disabled_fields() {
        if !config.is_neutral(field) {
            config.reset_to_neutral(field);
            forced.insert(field);
        }
    }

    let coerced = capabilities.viewability.coerce(config.viewability);
    if coerced != config.viewability {
        config.viewability = coerced;
        forced.insert(Field::Viewability);
    }

    forced
}
