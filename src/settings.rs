//! Engine settings
//!
//! Settings are layered, highest priority last:
//! 1. Built-in defaults
//! 2. User settings (`<config dir>/targeting-engine/settings.yaml`)
//! 3. Project settings (`.targeting.yaml` in the working directory)
//! 4. Environment variables (`TARGETING_*`)
//! 5. CLI flags (applied in main.rs)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::PresetOnPublisherChange;
use crate::error::SettingsError;

pub const ENV_DEFAULT_PUBLISHER: &str = "TARGETING_DEFAULT_PUBLISHER";
pub const ENV_CATALOG: &str = "TARGETING_CATALOG";
pub const ENV_PRESET_POLICY: &str = "TARGETING_PRESET_POLICY";

const PROJECT_SETTINGS_FILE: &str = ".targeting.yaml";
const USER_SETTINGS_FILE: &str = "settings.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Publisher selected when a form is initialized
    pub default_publisher: String,

    /// Catalog file replacing the built-in catalog
    pub catalog_path: Option<PathBuf>,

    /// Preset id handling on publisher change
    pub preset_on_publisher_change: PresetOnPublisherChange,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_publisher: "cbsi".to_string(),
            catalog_path: None,
            preset_on_publisher_change: PresetOnPublisherChange::Keep,
        }
    }
}

/// One settings layer; absent keys leave lower layers in place
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsLayer {
    default_publisher: Option<String>,
    catalog_path: Option<PathBuf>,
    preset_on_publisher_change: Option<PresetOnPublisherChange>,
}

impl Settings {
    fn merge(&mut self, layer: SettingsLayer) {
        if let Some(publisher) = layer.default_publisher {
            self.default_publisher = publisher;
        }
        if let Some(path) = layer.catalog_path {
            self.catalog_path = Some(path);
        }
        if let Some(policy) = layer.preset_on_publisher_change {
            self.preset_on_publisher_change = policy;
        }
    }
}

/// Loads settings from every layer
pub struct SettingsLoader {
    user_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
    use_env: bool,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        let user_path = directories::ProjectDirs::from("io", "targeting", "targeting-engine")
            .map(|dirs| dirs.config_dir().join(USER_SETTINGS_FILE));

        Self {
            user_path,
            project_path: Some(PathBuf::from(PROJECT_SETTINGS_FILE)),
            use_env: true,
        }
    }

    pub fn with_user_path(mut self, path: Option<PathBuf>) -> Self {
        self.user_path = path;
        self
    }

    pub fn with_project_path(mut self, path: Option<PathBuf>) -> Self {
        self.project_path = path;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn load(&self) -> Result<Settings, SettingsError> {
        let mut settings = Settings::default();

        for path in [&self.user_path, &self.project_path].into_iter().flatten() {
            if path.is_file() {
                debug!("Loading settings from {:?}", path);
                settings.merge(read_layer(path)?);
            }
        }

        if self.use_env {
            apply_overrides(&mut settings, |key| std::env::var(key).ok())?;
        }

        Ok(settings)
    }
}

fn read_layer(path: &Path) -> Result<SettingsLayer, SettingsError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if yaml.trim().is_empty() {
        return Ok(SettingsLayer::default());
    }
    serde_yaml::from_str(&yaml).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `TARGETING_*` overrides from a variable lookup
pub fn apply_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    if let Some(publisher) = lookup(ENV_DEFAULT_PUBLISHER).filter(|v| !v.trim().is_empty()) {
        settings.default_publisher = publisher.trim().to_string();
    }
    if let Some(path) = lookup(ENV_CATALOG).filter(|v| !v.trim().is_empty()) {
        settings.catalog_path = Some(PathBuf::from(path));
    }
    if let Some(policy) = lookup(ENV_PRESET_POLICY) {
        settings.preset_on_publisher_change = PresetOnPublisherChange::parse(&policy)
            .ok_or(SettingsError::InvalidValue {
                key: ENV_PRESET_POLICY.to_string(),
                value: policy,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn isolated_loader() -> SettingsLoader {
        SettingsLoader::new()
            .with_user_path(None)
            .with_project_path(None)
            .without_env()
    }

    #[test]
    fn test_defaults() {
        let settings = isolated_loader().load().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_publisher, "cbsi");
        assert_eq!(
            settings.preset_on_publisher_change,
            PresetOnPublisherChange::Keep
        );
    }

    #[test]
    fn test_project_overrides_user() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.yaml");
        let project = dir.path().join("project.yaml");
        std::fs::write(
            &user,
            "default_publisher: nypost\ncatalog_path: /etc/catalog.yaml\n",
        )
        .unwrap();
        std::fs::write(
            &project,
            "default_publisher: sharethrough\npreset_on_publisher_change: reset_to_default\n",
        )
        .unwrap();

        let settings = isolated_loader()
            .with_user_path(Some(user))
            .with_project_path(Some(project))
            .load()
            .unwrap();

        assert_eq!(settings.default_publisher, "sharethrough");
        assert_eq!(
            settings.catalog_path,
            Some(PathBuf::from("/etc/catalog.yaml"))
        );
        assert_eq!(
            settings.preset_on_publisher_change,
            PresetOnPublisherChange::ResetToDefault
        );
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let settings = isolated_loader()
            .with_user_path(Some(PathBuf::from("/nonexistent/settings.yaml")))
            .load()
            .unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_empty_file_is_a_noop_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "\n").unwrap();

        let settings = isolated_loader()
            .with_project_path(Some(path))
            .load()
            .unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unknown_key_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "default_publisher: cbsi\nbudget: 10\n").unwrap();

        let err = isolated_loader()
            .with_project_path(Some(path))
            .load()
            .unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DEFAULT_PUBLISHER, " nypost "),
            (ENV_CATALOG, "/tmp/catalog.yaml"),
            (ENV_PRESET_POLICY, "reset-to-default"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        apply_overrides(&mut settings, |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.default_publisher, "nypost");
        assert_eq!(
            settings.catalog_path,
            Some(PathBuf::from("/tmp/catalog.yaml"))
        );
        assert_eq!(
            settings.preset_on_publisher_change,
            PresetOnPublisherChange::ResetToDefault
        );
    }

    #[test]
    fn test_env_invalid_policy() {
        let mut settings = Settings::default();
        let err = apply_overrides(&mut settings, |key| {
            (key == ENV_PRESET_POLICY).then(|| "merge".to_string())
        })
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid value 'merge' for TARGETING_PRESET_POLICY"
        );
    }
}
