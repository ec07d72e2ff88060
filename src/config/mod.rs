/// Targeting configuration domain
///
/// This module defines what a targeting configuration is and which values it
/// may hold:
/// - The field vocabulary and the working configuration (`model`)
/// - Plan-derived capabilities and their resolver (`capability`)
/// - Publisher-scoped presets and their resolver (`preset`)
/// - Declarative field validation (`validation`)
///
/// The stateful editor built on top of these lives in `crate::form`.
pub mod capability;
pub mod model;
pub mod preset;
pub mod validation;

pub use capability::{CapabilityMap, CapabilityResolver, Plan, ViewabilityMode};
pub use model::{AdSizeInput, Field, FieldValue, ValueBundle, WorkingConfiguration};
pub use preset::{PresetOnPublisherChange, PresetResolver};
pub use validation::{ensure_valid, validate_config, validate_document, FieldErrors};
