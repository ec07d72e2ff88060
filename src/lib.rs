//! Capability-gated targeting configuration engine
//!
//! Edits one in-memory targeting configuration for an ad-traffic dashboard.
//! Which fields a publisher may edit, and with what values, follows from the
//! publisher's subscription plan; presets overwrite the configuration
//! wholesale; a committed baseline backs dirty tracking and discard.
//!
//! ```no_run
//! use std::sync::Arc;
//! use targeting_engine::catalog::Catalog;
//! use targeting_engine::config::FieldValue;
//! use targeting_engine::form::ConfigurationForm;
//!
//! let catalog = Arc::new(Catalog::builtin()?);
//! let mut form = ConfigurationForm::initialize(catalog, "cbsi")?;
//! form.set_field(FieldValue::Viewability(45));
//! form.select_publisher("sharethrough")?;
//! assert_eq!(form.values().viewability, 0);
//! let bundle = form.commit()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod settings;
pub mod submit;

pub use error::{CatalogError, SettingsError, TargetingError};
