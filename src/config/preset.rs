/// Preset resolution
///
/// Presets are publisher-scoped bundles of field values:
/// - **Lookup** is by `(publisher, preset)`; preset ids repeat across publishers
/// - **Application** is a total overwrite of the working configuration
/// - **Publisher change** keeps or resets the selected preset id per policy
use serde::{Deserialize, Serialize};

use super::model::ValueBundle;
use crate::catalog::Catalog;
use crate::error::TargetingError;

/// Resolves `(publisher, preset)` pairs into value bundles
pub struct PresetResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> PresetResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Resolve a preset into the full bundle it describes
    ///
    /// Callers only pass preset ids they just read from the publisher's scoped
    /// preset list, so a miss signals an inconsistency elsewhere.
    pub fn resolve(
        &self,
        publisher_id: &str,
        preset_id: &str,
    ) -> Result<ValueBundle, TargetingError> {
        self.catalog
            .preset(publisher_id, preset_id)
            .map(|preset| ValueBundle::from_preset(publisher_id, &preset.id, &preset.values))
            .ok_or_else(|| TargetingError::UnknownPreset {
                publisher_id: publisher_id.to_string(),
                preset_id: preset_id.to_string(),
            })
    }

    /// Resolve the first preset scoped to a publisher, if it has any
    pub fn resolve_default(&self, publisher_id: &str) -> Option<ValueBundle> {
        self.catalog
            .default_preset(publisher_id)
            .map(|preset| ValueBundle::from_preset(publisher_id, &preset.id, &preset.values))
    }
}

/// What happens to the selected preset id when the publisher changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetOnPublisherChange {
    /// Leave the previous id in place, even if the new publisher has no
    /// preset by that id. The preset selector may then show an id missing
    /// from its own option list until the user picks again.
    #[default]
    Keep,

    /// Point at the new publisher's first preset without applying its values
    ResetToDefault,
}

impl PresetOnPublisherChange {
    /// Parse a policy from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Some(PresetOnPublisherChange::Keep),
            "reset-to-default" | "reset_to_default" | "reset" => {
                Some(PresetOnPublisherChange::ResetToDefault)
            }
            _ => None,
        }
    }

    /// The preset id to hold after switching to `publisher_id`
    pub fn next_preset_id(
        &self,
        catalog: &Catalog,
        current: Option<String>,
        publisher_id: &str,
    ) -> Option<String> {
        match self {
            PresetOnPublisherChange::Keep => current,
            PresetOnPublisherChange::ResetToDefault => catalog
                .default_preset(publisher_id)
                .map(|preset| preset.id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_resolve_cbsi_default() {
        let catalog = Catalog::builtin().unwrap();
        let bundle = PresetResolver::new(&catalog)
            .resolve("cbsi", "default")
            .unwrap();

        assert_eq!(bundle.publisher_id, "cbsi");
        assert_eq!(bundle.preset_id.as_deref(), Some("default"));
        assert_eq!(
            bundle.ad_size,
            BTreeSet::from(["728x90".to_string(), "768x90".to_string()])
        );
        assert_eq!(bundle.viewability, 0);
    }

    #[test]
    fn test_same_id_resolves_per_publisher() {
        let catalog = Catalog::builtin().unwrap();
        let resolver = PresetResolver::new(&catalog);

        let cbsi = resolver.resolve("cbsi", "default").unwrap();
        let sharethrough = resolver.resolve("sharethrough", "default").unwrap();

        assert!(cbsi.domain.contains("cbsi.com"));
        assert!(sharethrough.domain.contains("sharethrough.com"));
    }

    #[test]
    fn test_resolve_out_of_scope_preset() {
        let catalog = Catalog::builtin().unwrap();
        let err = PresetResolver::new(&catalog)
            .resolve("nypost", "mobile-viewable")
            .unwrap_err();

        assert_eq!(
            err,
            TargetingError::UnknownPreset {
                publisher_id: "nypost".to_string(),
                preset_id: "mobile-viewable".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_default() {
        let catalog = Catalog::builtin().unwrap();
        let resolver = PresetResolver::new(&catalog);

        let bundle = resolver.resolve_default("nypost").unwrap();
        assert_eq!(bundle.preset_id.as_deref(), Some("default"));
        assert!(resolver.resolve_default("nobody").is_none());
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(
            PresetOnPublisherChange::parse("keep"),
            Some(PresetOnPublisherChange::Keep)
        );
        assert_eq!(
            PresetOnPublisherChange::parse("RESET-TO-DEFAULT"),
            Some(PresetOnPublisherChange::ResetToDefault)
        );
        assert_eq!(
            PresetOnPublisherChange::parse("reset_to_default"),
            Some(PresetOnPublisherChange::ResetToDefault)
        );
        assert_eq!(PresetOnPublisherChange::parse("merge"), None);
    }

    #[test]
    fn test_keep_policy_preserves_stale_id() {
        let catalog = Catalog::builtin().unwrap();
        let next = PresetOnPublisherChange::Keep.next_preset_id(
            &catalog,
            Some("mobile-viewable".to_string()),
            "nypost",
        );
        assert_eq!(next.as_deref(), Some("mobile-viewable"));
    }

    #[test]
    fn test_reset_policy_points_at_first_preset() {
        let catalog = Catalog::builtin().unwrap();
        let next = PresetOnPublisherChange::ResetToDefault.next_preset_id(
            &catalog,
            Some("mobile-viewable".to_string()),
            "nypost",
        );
        assert_eq!(next.as_deref(), Some("default"));
    }
}
