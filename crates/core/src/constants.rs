//! Constants used throughout the worksheet core crate.
//!
//! This module collects environment variable names, configuration defaults and the fixed
//! vocabulary of the legacy formulation migrator.

/// Environment variable holding the maximum accepted document size in bytes.
pub const MAX_DOCUMENT_BYTES_ENV: &str = "WORKSHEET_MAX_DOCUMENT_BYTES";

/// Environment variable controlling whether legacy schemas are migrated or rejected.
pub const MIGRATE_LEGACY_ENV: &str = "WORKSHEET_MIGRATE_LEGACY";

/// Default maximum accepted document size (1 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 1024 * 1024;

/// Base id of the section that receives a migrated formulation.
pub const FORMULATION_SECTION_ID: &str = "formulation";

/// Base id of the migrated formulation field.
pub const FORMULATION_FIELD_ID: &str = "formulation";

/// Id of the textarea generated for a petal with no field template.
pub const DEFAULT_NODE_FIELD_ID: &str = "notes";

/// Label of generated node inputs when the item has no usable label.
pub const DEFAULT_NODE_FIELD_LABEL: &str = "Notes";

/// Titles of the formulation produced from each legacy layout.
pub const CROSS_SECTIONAL_TITLE: &str = "Cross-sectional formulation";
pub const VICIOUS_FLOWER_TITLE: &str = "Vicious flower";
pub const LONGITUDINAL_TITLE: &str = "Longitudinal formulation";

/// Legacy radial section names.
pub const RADIAL_CENTRE_SECTION: &str = "centre";
pub const RADIAL_PETALS_SECTION: &str = "petals";

/// Longitudinal step colours, keyed by legacy highlight.
pub const STEP_COLOUR_AMBER: &str = "#d4a44a";
pub const STEP_COLOUR_RED_DASHED: &str = "#c46b6b";
pub const STEP_COLOUR_DEFAULT: &str = "#6b7280";
