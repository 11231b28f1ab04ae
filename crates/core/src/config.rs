//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into [`crate::WorksheetService`]. Parsing helpers take the raw environment values as
//! `Option<String>` so callers decide where values come from and tests never touch the process
//! environment.

use crate::constants::DEFAULT_MAX_DOCUMENT_BYTES;
use crate::{WorksheetError, WorksheetResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    max_document_bytes: u64,
    migrate_legacy: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`WorksheetError::InvalidConfig`] if `max_document_bytes` is zero.
    pub fn new(max_document_bytes: u64, migrate_legacy: bool) -> WorksheetResult<Self> {
        if max_document_bytes == 0 {
            return Err(WorksheetError::InvalidConfig(
                "max_document_bytes must be greater than zero".into(),
            ));
        }

        Ok(Self {
            max_document_bytes,
            migrate_legacy,
        })
    }

    /// Upper bound on the size of a schema or response document.
    pub fn max_document_bytes(&self) -> u64 {
        self.max_document_bytes
    }

    /// Whether legacy formulation schemas are migrated (`true`) or rejected (`false`).
    pub fn migrate_legacy(&self) -> bool {
        self.migrate_legacy
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            migrate_legacy: true,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the maximum document size from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MAX_DOCUMENT_BYTES`].
pub fn max_document_bytes_from_env_value(value: Option<String>) -> WorksheetResult<u64> {
    match non_blank(value) {
        None => Ok(DEFAULT_MAX_DOCUMENT_BYTES),
        Some(v) => v.parse::<u64>().map_err(|_| {
            WorksheetError::InvalidConfig(format!(
                "max document bytes must be a positive integer, got '{v}'"
            ))
        }),
    }
}

/// Parse the legacy migration switch from an optional string value.
///
/// Accepts `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off` (case-insensitive). If `value`
/// is `None` or empty/whitespace, migration is enabled.
pub fn migrate_legacy_from_env_value(value: Option<String>) -> WorksheetResult<bool> {
    let Some(v) = non_blank(value) else {
        return Ok(true);
    };

    match v.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(WorksheetError::InvalidConfig(format!(
            "migrate legacy must be a boolean, got '{v}'"
        ))),
    }
}

/// Build a [`CoreConfig`] from raw environment values.
pub fn config_from_env_values(
    max_document_bytes: Option<String>,
    migrate_legacy: Option<String>,
) -> WorksheetResult<CoreConfig> {
    CoreConfig::new(
        max_document_bytes_from_env_value(max_document_bytes)?,
        migrate_legacy_from_env_value(migrate_legacy)?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset_or_blank() {
        let cfg = config_from_env_values(None, Some("   ".into())).expect("defaults");
        assert_eq!(cfg, CoreConfig::default());
        assert_eq!(cfg.max_document_bytes(), DEFAULT_MAX_DOCUMENT_BYTES);
        assert!(cfg.migrate_legacy());
    }

    #[test]
    fn parses_explicit_values() {
        let cfg = config_from_env_values(Some(" 2048 ".into()), Some("Off".into()))
            .expect("explicit values");
        assert_eq!(cfg.max_document_bytes(), 2048);
        assert!(!cfg.migrate_legacy());
    }

    #[test]
    fn rejects_invalid_values() {
        let err = max_document_bytes_from_env_value(Some("lots".into())).expect_err("not a number");
        assert!(matches!(err, WorksheetError::InvalidConfig(msg) if msg.contains("lots")));

        let err = migrate_legacy_from_env_value(Some("maybe".into())).expect_err("not a boolean");
        assert!(matches!(err, WorksheetError::InvalidConfig(_)));

        let err = config_from_env_values(Some("0".into()), None).expect_err("zero limit");
        assert!(matches!(err, WorksheetError::InvalidConfig(msg) if msg.contains("greater than zero")));
    }
}
