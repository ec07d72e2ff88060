/// Plan-derived field capabilities
///
/// Every publisher is on exactly one subscription plan, and the plan alone
/// decides which targeting fields the publisher may edit:
/// - **Platinum**: every field, continuous viewability slider
/// - **Gold**: no direct-inventory filter, viewability as an on/off select
/// - **Silver**: no DSP, user-match or direct-inventory filters, no viewability
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::model::Field;
use crate::catalog::Catalog;
use crate::error::TargetingError;

/// Subscription plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Platinum,
    Gold,
    Silver,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Platinum => "platinum",
            Plan::Gold => "gold",
            Plan::Silver => "silver",
        }
    }

    /// The fixed feature table for this plan
    pub fn capabilities(&self) -> CapabilityMap {
        match self {
            Plan::Platinum => CapabilityMap {
                domain: true,
                ad_size: true,
                device: true,
                dsp: true,
                user_match: true,
                direct_inventory: true,
                viewability: ViewabilityMode::Full,
            },
            Plan::Gold => CapabilityMap {
                domain: true,
                ad_size: true,
                device: true,
                dsp: true,
                user_match: true,
                direct_inventory: false,
                viewability: ViewabilityMode::On,
            },
            Plan::Silver => CapabilityMap {
                domain: true,
                ad_size: true,
                device: true,
                dsp: false,
                user_match: false,
                direct_inventory: false,
                viewability: ViewabilityMode::Off,
            },
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the viewability field may be edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewabilityMode {
    /// Continuous threshold, 0 to 100
    Full,
    /// Binary select: 0 (all traffic) or 1 (viewable only)
    On,
    /// Disabled; the value is held at 0
    Off,
}

impl ViewabilityMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ViewabilityMode::Off)
    }

    /// Whether `value` lies in this mode's value domain
    pub fn accepts(&self, value: u8) -> bool {
        match self {
            ViewabilityMode::Full => value <= 100,
            ViewabilityMode::On => value <= 1,
            ViewabilityMode::Off => value == 0,
        }
    }

    /// Map a value into this mode's value domain
    pub fn coerce(&self, value: u8) -> u8 {
        match self {
            ViewabilityMode::Full => value.min(100),
            ViewabilityMode::On => u8::from(value > 0),
            ViewabilityMode::Off => 0,
        }
    }
}

impl fmt::Display for ViewabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewabilityMode::Full => "full",
            ViewabilityMode::On => "on",
            ViewabilityMode::Off => "off",
        };
        f.write_str(name)
    }
}

/// Per-field enablement for one plan
///
/// `publisher`, `preset` and `country` are never gated and always report enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityMap {
    pub domain: bool,
    pub ad_size: bool,
    pub device: bool,
    pub dsp: bool,
    pub user_match: bool,
    pub direct_inventory: bool,
    pub viewability: ViewabilityMode,
}

impl CapabilityMap {
    pub fn is_enabled(&self, field: Field) -> bool {
        match field {
            Field::Publisher | Field::Preset | Field::Country => true,
            Field::Domain => self.domain,
            Field::AdSize => self.ad_size,
            Field::Device => self.device,
            Field::Dsp => self.dsp,
            Field::UserMatch => self.user_match,
            Field::DirectInventory => self.direct_inventory,
            Field::Viewability => self.viewability.is_enabled(),
        }
    }

    /// Fields the renderer must show as disabled
    pub fn disabled_fields(&self) -> BTreeSet<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| !self.is_enabled(*field))
            .collect()
    }
}

/// Resolves a publisher's capabilities through its plan
pub struct CapabilityResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> CapabilityResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Look up the publisher's plan and return that plan's feature table
    ///
    /// Publisher ids only ever come from the catalog's own option list, so an
    /// unknown id means a caller is broken rather than the user.
    pub fn resolve(&self, publisher_id: &str) -> Result<CapabilityMap, TargetingError> {
        self.catalog
            .publisher(publisher_id)
            .map(|publisher| publisher.plan.capabilities())
            .ok_or_else(|| TargetingError::UnknownPublisher(publisher_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_platinum_enables_everything() {
        let caps = Plan::Platinum.capabilities();
        assert!(caps.disabled_fields().is_empty());
        assert_eq!(caps.viewability, ViewabilityMode::Full);
    }

    #[test]
    fn test_gold_disables_direct_inventory_only() {
        let caps = Plan::Gold.capabilities();
        assert_eq!(
            caps.disabled_fields(),
            BTreeSet::from([Field::DirectInventory])
        );
        assert_eq!(caps.viewability, ViewabilityMode::On);
    }

    #[test]
    fn test_silver_disables_premium_filters() {
        let caps = Plan::Silver.capabilities();
        assert_eq!(
            caps.disabled_fields(),
            BTreeSet::from([
                Field::Dsp,
                Field::UserMatch,
                Field::Viewability,
                Field::DirectInventory
            ])
        );
    }

    #[test]
    fn test_ungated_fields_always_enabled() {
        for plan in [Plan::Platinum, Plan::Gold, Plan::Silver] {
            let caps = plan.capabilities();
            assert!(caps.is_enabled(Field::Publisher));
            assert!(caps.is_enabled(Field::Preset));
            assert!(caps.is_enabled(Field::Country));
        }
    }

    #[test_case(ViewabilityMode::Full, 0, true)]
    #[test_case(ViewabilityMode::Full, 100, true)]
    #[test_case(ViewabilityMode::Full, 101, false)]
    #[test_case(ViewabilityMode::On, 1, true)]
    #[test_case(ViewabilityMode::On, 45, false)]
    #[test_case(ViewabilityMode::Off, 0, true)]
    #[test_case(ViewabilityMode::Off, 1, false)]
    fn test_viewability_accepts(mode: ViewabilityMode, value: u8, expected: bool) {
        assert_eq!(mode.accepts(value), expected);
    }

    #[test_case(ViewabilityMode::Full, 250, 100)]
    #[test_case(ViewabilityMode::Full, 45, 45)]
    #[test_case(ViewabilityMode::On, 45, 1)]
    #[test_case(ViewabilityMode::On, 0, 0)]
    #[test_case(ViewabilityMode::Off, 45, 0)]
    fn test_viewability_coerce(mode: ViewabilityMode, value: u8, expected: u8) {
        assert_eq!(mode.coerce(value), expected);
        assert!(mode.accepts(mode.coerce(value)));
    }

    #[test]
    fn test_resolve_known_publisher() {
        let catalog = Catalog::builtin().unwrap();
        let resolver = CapabilityResolver::new(&catalog);

        let caps = resolver.resolve("cbsi").unwrap();
        assert_eq!(caps, Plan::Platinum.capabilities());

        let caps = resolver.resolve("sharethrough").unwrap();
        assert_eq!(caps.viewability, ViewabilityMode::Off);
    }

    #[test]
    fn test_resolve_unknown_publisher() {
        let catalog = Catalog::builtin().unwrap();
        let err = CapabilityResolver::new(&catalog)
            .resolve("nobody")
            .unwrap_err();
        assert!(matches!(err, TargetingError::UnknownPublisher(id) if id == "nobody"));
    }
}
