//! Error types for the targeting engine
//!
//! Two classes of failure exist:
//! - Caller contract violations (`UnknownPublisher`, `UnknownPreset`): ids fed
//!   back into the resolvers must originate from the catalog itself.
//! - Validation rejections (`Validation`): expected and user-recoverable; they
//!   block a commit but never touch the working configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::Field;

/// Errors raised by the resolvers and the configuration form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetingError {
    #[error("unknown publisher '{0}'")]
    UnknownPublisher(String),

    #[error("unknown preset '{preset_id}' for publisher '{publisher_id}'")]
    UnknownPreset {
        publisher_id: String,
        preset_id: String,
    },

    #[error("validation failed: {}", summarize(.fields))]
    Validation { fields: BTreeMap<Field, String> },
}

fn summarize(fields: &BTreeMap<Field, String>) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog from {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("inconsistent catalog: {0}")]
    Inconsistent(String),
}

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}
