//! Option catalogs for the targeting form
//!
//! The catalog is a read-only registry loaded once at start-up: publishers and
//! their plans, publisher-scoped domains and presets, and the global ad-size,
//! device, DSP and country lists. Lookups never fail; an unknown id simply
//! yields an empty collection or `None`.

mod consistency;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use crate::config::Plan;
use crate::error::CatalogError;

/// Catalog compiled into the binary
const DEFAULT_CATALOG: &str = include_str!("default_catalog.yaml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: String,
    pub name: String,
    pub plan: Plan,
}

/// A domain selectable only while its publisher is selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainOption {
    pub domain: String,
    pub publisher_id: String,
}

/// An `{ id, name }` option shared by every publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedOption {
    pub id: String,
    pub name: String,
}

pub type DeviceOption = NamedOption;
pub type DspOption = NamedOption;
pub type CountryOption = NamedOption;

/// Field values carried by a preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetValues {
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

/// A named bundle of field values, unique per `(publisher_id, id)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub publisher_id: String,
    pub name: String,
    pub values: PresetValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    publishers: Vec<Publisher>,
    #[serde(default)]
    domains: Vec<DomainOption>,
    #[serde(default)]
    ad_sizes: Vec<String>,
    #[serde(default)]
    devices: Vec<DeviceOption>,
    #[serde(default)]
    dsps: Vec<DspOption>,
    #[serde(default)]
    countries: Vec<CountryOption>,
    #[serde(default)]
    presets: Vec<Preset>,
}

impl Catalog {
    /// Load the catalog compiled into the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(DEFAULT_CATALOG)
    }

    /// Parse and verify a YAML catalog
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(yaml)?;
        consistency::verify(&catalog)?;
        debug!(
            "Loaded catalog: {} publishers, {} domains, {} presets",
            catalog.publishers.len(),
            catalog.domains.len(),
            catalog.presets.len()
        );
        Ok(catalog)
    }

    /// Load a catalog file, replacing the built-in one
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn publishers(&self) -> &[Publisher] {
        &self.publishers
    }

    pub fn publisher(&self, publisher_id: &str) -> Option<&Publisher> {
        self.publishers.iter().find(|p| p.id == publisher_id)
    }

    /// Domains scoped to a publisher, in catalog order
    pub fn domains(&self, publisher_id: &str) -> Vec<&DomainOption> {
        self.domains
            .iter()
            .filter(|d| d.publisher_id == publisher_id)
            .collect()
    }

    /// Presets scoped to a publisher, in catalog order
    pub fn presets(&self, publisher_id: &str) -> Vec<&Preset> {
        self.presets
            .iter()
            .filter(|p| p.publisher_id == publisher_id)
            .collect()
    }

    pub fn preset(&self, publisher_id: &str, preset_id: &str) -> Option<&Preset> {
        self.presets
            .iter()
            .find(|p| p.publisher_id == publisher_id && p.id == preset_id)
    }

    /// The first preset scoped to a publisher
    pub fn default_preset(&self, publisher_id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.publisher_id == publisher_id)
    }

    pub fn ad_sizes(&self) -> &[String] {
        &self.ad_sizes
    }

    pub fn devices(&self) -> &[DeviceOption] {
        &self.devices
    }

    pub fn dsps(&self) -> &[DspOption] {
        &self.dsps
    }

    pub fn countries(&self) -> &[CountryOption] {
        &self.countries
    }

    pub fn has_domain(&self, publisher_id: &str, domain: &str) -> bool {
        self.domains
            .iter()
            .any(|d| d.publisher_id == publisher_id && d.domain == domain)
    }

    pub fn has_device(&self, id: &str) -> bool {
        self.devices.iter().any(|d| d.id == id)
    }

    pub fn has_dsp(&self, id: &str) -> bool {
        self.dsps.iter().any(|d| d.id == id)
    }

    pub fn has_country(&self, id: &str) -> bool {
        self.countries.iter().any(|c| c.id == id)
    }

    /// Country used for configurations that start without a preset
    pub fn fallback_country(&self) -> &str {
        self.countries.first().map(|c| c.id.as_str()).unwrap_or("")
    }
}
