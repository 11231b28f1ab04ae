//! # Worksheet Core
//!
//! Runtime behaviour of clinical worksheets, built on the model in `worksheet-schema`:
//! - evaluation of computed fields with a diagnostics channel ([`compute`])
//! - migration of the retired section-based formulation formats ([`migrate`])
//! - the [`WorksheetService`] preparation pipeline (size guard, legacy policy, validation)
//!
//! Everything here is synchronous and free of global state. Configuration is resolved once at
//! startup into a [`CoreConfig`] and shared with the service through an `Arc`.

pub mod compute;
pub mod config;
pub mod constants;
pub mod error;
pub mod migrate;
pub mod service;

pub use compute::{
    evaluate, evaluate_all, evaluate_with_diagnostics, ComputedValue, Diagnostics, Evaluation,
    SkipReason, SkippedCell, UnresolvedReason, UnresolvedRef,
};
pub use config::{
    config_from_env_values, max_document_bytes_from_env_value, migrate_legacy_from_env_value,
    CoreConfig,
};
pub use error::{WorksheetError, WorksheetResult};
pub use migrate::migrate;
pub use service::WorksheetService;
