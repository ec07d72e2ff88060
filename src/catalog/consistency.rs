/// Catalog consistency checks
///
/// Runs once when a catalog is loaded so that the form can rely on catalog
/// data: every preset is applicable to its publisher without cascading
/// changes, and every scoped option points at a real publisher.
use std::collections::HashSet;

use super::{Catalog, Preset};
use crate::config::{Field, WorkingConfiguration};
use crate::error::CatalogError;

fn inconsistent(message: String) -> CatalogError {
    CatalogError::Inconsistent(message)
}

/// Verify a freshly parsed catalog
pub(super) fn verify(catalog: &Catalog) -> Result<(), CatalogError> {
    verify_publishers(catalog)?;
    verify_domains(catalog)?;
    verify_presets(catalog)?;
    Ok(())
}

fn verify_publishers(catalog: &Catalog) -> Result<(), CatalogError> {
    if catalog.publishers.is_empty() {
        return Err(inconsistent("catalog defines no publishers".to_string()));
    }

    let mut seen = HashSet::new();
    for publisher in &catalog.publishers {
        if publisher.id.trim().is_empty() {
            return Err(inconsistent(format!(
                "publisher '{}' has an empty id",
                publisher.name
            )));
        }
        if !seen.insert(publisher.id.as_str()) {
            return Err(inconsistent(format!(
                "duplicate publisher id '{}'",
                publisher.id
            )));
        }
    }

    Ok(())
}

fn verify_domains(catalog: &Catalog) -> Result<(), CatalogError> {
    for option in &catalog.domains {
        if catalog.publisher(&option.publisher_id).is_none() {
            return Err(inconsistent(format!(
                "domain '{}' is scoped to unknown publisher '{}'",
                option.domain, option.publisher_id
            )));
        }
    }
    Ok(())
}

fn verify_presets(catalog: &Catalog) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for preset in &catalog.presets {
        if !seen.insert((preset.publisher_id.as_str(), preset.id.as_str())) {
            return Err(inconsistent(format!(
                "duplicate preset '{}' for publisher '{}'",
                preset.id, preset.publisher_id
            )));
        }
        verify_preset_values(catalog, preset)?;
    }
    Ok(())
}

fn verify_preset_values(catalog: &Catalog, preset: &Preset) -> Result<(), CatalogError> {
    let context = format!("preset '{}/{}'", preset.publisher_id, preset.id);

    let publisher = catalog.publisher(&preset.publisher_id).ok_or_else(|| {
        inconsistent(format!(
            "{} is scoped to unknown publisher '{}'",
            context, preset.publisher_id
        ))
    })?;

    let values = &preset.values;
    if let Some(domain) = values
        .domain
        .iter()
        .find(|d| !catalog.has_domain(&preset.publisher_id, d))
    {
        return Err(inconsistent(format!(
            "{} selects domain '{}' outside its publisher's scope",
            context, domain
        )));
    }
    if let Some(device) = values.device.iter().find(|d| !catalog.has_device(d)) {
        return Err(inconsistent(format!(
            "{} selects unknown device '{}'",
            context, device
        )));
    }
    if let Some(dsp) = values.dsp.iter().find(|d| !catalog.has_dsp(d)) {
        return Err(inconsistent(format!(
            "{} selects unknown DSP '{}'",
            context, dsp
        )));
    }
    if !catalog.has_country(&values.country) {
        return Err(inconsistent(format!(
            "{} selects unknown country '{}'",
            context, values.country
        )));
    }

    let capabilities = publisher.plan.capabilities();
    if !capabilities.viewability.accepts(values.viewability) {
        return Err(inconsistent(format!(
            "{} sets viewability {} which the {} plan does not allow ({} mode)",
            context, values.viewability, publisher.plan, capabilities.viewability
        )));
    }

    let bundle = WorkingConfiguration::from_preset(&preset.publisher_id, &preset.id, values);
    for field in capabilities.disabled_fields() {
        if !bundle.is_neutral(field) {
            return Err(inconsistent(format!(
                "{} sets '{}' which the {} plan disables",
                context, field, publisher.plan
            )));
        }
    }

    if values.ad_size.iter().any(|size| size.trim().is_empty()) {
        return Err(inconsistent(format!(
            "{} contains a blank {}",
            context,
            Field::AdSize.label().to_lowercase()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::Catalog;
    use crate::error::CatalogError;

    const HEADER: &str = r#"
publishers:
  - id: acme
    name: Acme
    plan: silver
domains:
  - domain: acme.test
    publisherId: acme
devices:
  - id: desktop
    name: Desktop
dsps:
  - id: dsp1
    name: DSP 1
countries:
  - id: us
    name: United States
"#;

    fn load_with_presets(presets: &str) -> Result<Catalog, CatalogError> {
        Catalog::from_yaml_str(&format!("{}\npresets:\n{}", HEADER, presets))
    }

    fn assert_inconsistent(result: Result<Catalog, CatalogError>, needle: &str) {
        match result {
            Err(CatalogError::Inconsistent(message)) => assert!(
                message.contains(needle),
                "expected '{}' in '{}'",
                needle,
                message
            ),
            other => panic!("expected inconsistent catalog, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_preset_accepted() {
        let catalog = load_with_presets(
            r#"
  - id: default
    publisherId: acme
    name: Default
    values:
      domain: [acme.test]
      adSize: [300x250]
      device: [desktop]
      country: us
"#,
        );
        assert!(catalog.is_ok(), "{:?}", catalog);
    }

    #[test]
    fn test_empty_publishers_rejected() {
        let result = Catalog::from_yaml_str("publishers: []\n");
        assert_inconsistent(result, "no publishers");
    }

    #[test]
    fn test_duplicate_publisher_rejected() {
        let result = Catalog::from_yaml_str(
            r#"
publishers:
  - id: acme
    name: Acme
    plan: gold
  - id: acme
    name: Acme Again
    plan: silver
"#,
        );
        assert_inconsistent(result, "duplicate publisher id 'acme'");
    }

    #[test]
    fn test_domain_for_unknown_publisher_rejected() {
        let result = Catalog::from_yaml_str(
            r#"
publishers:
  - id: acme
    name: Acme
    plan: gold
domains:
  - domain: other.test
    publisherId: other
"#,
        );
        assert_inconsistent(result, "unknown publisher 'other'");
    }

    #[test]
    fn test_duplicate_preset_rejected() {
        let preset = r#"
  - id: default
    publisherId: acme
    name: Default
    values:
      country: us
"#;
        let result = load_with_presets(&format!("{}{}", preset, preset));
        assert_inconsistent(result, "duplicate preset 'default'");
    }

    #[test]
    fn test_out_of_scope_domain_rejected() {
        let result = load_with_presets(
            r#"
  - id: default
    publisherId: acme
    name: Default
    values:
      domain: [cbsi.com]
      country: us
"#,
        );
        assert_inconsistent(result, "outside its publisher's scope");
    }

    #[test]
    fn test_unknown_country_rejected() {
        let result = load_with_presets(
            r#"
  - id: default
    publisherId: acme
    name: Default
    values:
      country: mars
"#,
        );
        assert_inconsistent(result, "unknown country 'mars'");
    }

    #[test]
    fn test_disabled_field_value_rejected() {
        let result = load_with_presets(
            r#"
  - id: default
    publisherId: acme
    name: Default
    values:
      dsp: [dsp1]
      country: us
"#,
        );
        assert_inconsistent(result, "'dsp' which the silver plan disables");
    }

    #[test]
    fn test_viewability_outside_plan_rejected() {
        let result = load_with_presets(
            r#"
  - id: default
    publisherId: acme
    name: Default
    values:
      viewability: 40
      country: us
"#,
        );
        assert_inconsistent(result, "viewability 40");
    }
}
