//! Schema preparation service.
//!
//! [`WorksheetService`] is the entry point used by persistence and rendering collaborators:
//! it reads documents within the configured size limit, applies the legacy migration policy
//! and validates schemas before they are stored or used.

use crate::compute::{self, ComputedValue};
use crate::config::CoreConfig;
use crate::migrate;
use crate::{WorksheetError, WorksheetResult};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use worksheet_schema::{
    validate, validation_report, LegacyLayout, Responses, ValidationReport, WorksheetSchema,
};

/// Service for preparing worksheet schemas and evaluating their computed fields.
#[derive(Clone)]
pub struct WorksheetService {
    cfg: Arc<CoreConfig>,
}

impl WorksheetService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }
}

impl WorksheetService {
    /// Parses, migrates and validates a schema written as JSON text.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`WorksheetError::DocumentTooLarge`] if the text exceeds the configured limit,
    /// - [`WorksheetError::JsonDeserialization`] if the text is not JSON,
    /// - any error of [`WorksheetService::prepare_value`].
    pub fn prepare_json(&self, json_text: &str) -> WorksheetResult<WorksheetSchema> {
        self.check_size(json_text.len() as u64)?;
        let raw: Value =
            serde_json::from_str(json_text).map_err(WorksheetError::JsonDeserialization)?;
        self.prepare_value(&raw)
    }

    /// Parses, migrates and validates a schema written as YAML text.
    pub fn prepare_yaml(&self, yaml_text: &str) -> WorksheetResult<WorksheetSchema> {
        self.check_size(yaml_text.len() as u64)?;
        let raw: Value =
            serde_yaml::from_str(yaml_text).map_err(WorksheetError::YamlDeserialization)?;
        self.prepare_value(&raw)
    }

    /// Migrates a legacy schema (when allowed) and validates the result.
    ///
    /// Current schemas are validated as given. Legacy schemas are decoded, migrated and then
    /// validated in their migrated form.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`WorksheetError::LegacyMigrationDisabled`] for a legacy schema when migration is
    ///   switched off,
    /// - [`WorksheetError::Schema`] if a legacy schema cannot be decoded,
    /// - [`WorksheetError::Validation`] if the (migrated) schema is structurally invalid.
    pub fn prepare_value(&self, raw: &Value) -> WorksheetResult<WorksheetSchema> {
        let Some(legacy) = legacy_layout(raw) else {
            return validate(raw).map_err(|err| {
                tracing::warn!(error = %err, "rejected worksheet schema");
                WorksheetError::Validation(err)
            });
        };

        if !self.cfg.migrate_legacy() {
            tracing::warn!(legacy = %legacy, "rejected legacy schema, migration is disabled");
            return Err(WorksheetError::LegacyMigrationDisabled(legacy.to_string()));
        }

        let migrated = migrate::migrate(&WorksheetSchema::from_json_value(raw)?);
        validate(&migrated.to_json_value()?).map_err(|err| {
            tracing::warn!(legacy = %legacy, error = %err, "rejected migrated schema");
            WorksheetError::Validation(err)
        })
    }

    /// Reads and prepares a schema file (`.json`, `.yaml` or `.yml`).
    pub fn load_schema_file(&self, path: &Path) -> WorksheetResult<WorksheetSchema> {
        let raw = self.read_document(path)?;
        self.prepare_value(&raw)
    }

    /// Validates a raw schema without migrating it.
    pub fn validate(&self, raw: &Value) -> ValidationReport {
        validation_report(raw)
    }

    /// Decodes a raw schema and applies the legacy migration, without validating.
    ///
    /// The migration policy of [`CoreConfig::migrate_legacy`] does not apply here: an explicit
    /// migration request is always honoured.
    pub fn migrate(&self, raw: &Value) -> WorksheetResult<WorksheetSchema> {
        Ok(migrate::migrate(&WorksheetSchema::from_json_value(raw)?))
    }

    /// Evaluates every computed field of `schema` against `values`.
    pub fn evaluate_all(&self, schema: &WorksheetSchema, values: &Responses) -> Vec<ComputedValue> {
        compute::evaluate_all(schema, values)
    }

    /// Parses a response document from JSON text.
    pub fn parse_responses(&self, json_text: &str) -> WorksheetResult<Responses> {
        self.check_size(json_text.len() as u64)?;
        Ok(worksheet_schema::parse_responses(json_text)?)
    }

    /// Reads a response document file.
    pub fn load_responses_file(&self, path: &Path) -> WorksheetResult<Responses> {
        let raw = self.read_document(path)?;
        serde_json::from_value(raw).map_err(WorksheetError::JsonDeserialization)
    }

    /// Reads a JSON or YAML document into a JSON value.
    ///
    /// The format is chosen by file extension. The file size is checked against
    /// [`CoreConfig::max_document_bytes`] before it is read.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`WorksheetError::UnsupportedFormat`] for any other extension,
    /// - [`WorksheetError::DocumentTooLarge`] if the file exceeds the configured limit,
    /// - [`WorksheetError::FileRead`] if the file cannot be read,
    /// - a deserialisation error if the content does not parse.
    pub fn read_document(&self, path: &Path) -> WorksheetResult<Value> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let is_yaml = match extension.as_deref() {
            Some("json") => false,
            Some("yaml" | "yml") => true,
            other => {
                return Err(WorksheetError::UnsupportedFormat(format!(
                    "{} (extension {})",
                    path.display(),
                    other.unwrap_or("<none>")
                )))
            }
        };

        let metadata = fs::metadata(path).map_err(WorksheetError::FileRead)?;
        self.check_size(metadata.len())?;
        let text = fs::read_to_string(path).map_err(WorksheetError::FileRead)?;

        tracing::debug!(path = %path.display(), bytes = text.len(), "read worksheet document");

        if is_yaml {
            serde_yaml::from_str(&text).map_err(WorksheetError::YamlDeserialization)
        } else {
            serde_json::from_str(&text).map_err(WorksheetError::JsonDeserialization)
        }
    }

    fn check_size(&self, size: u64) -> WorksheetResult<()> {
        let limit = self.cfg.max_document_bytes();
        if size > limit {
            return Err(WorksheetError::DocumentTooLarge { size, limit });
        }
        Ok(())
    }
}

fn legacy_layout(raw: &Value) -> Option<LegacyLayout> {
    raw.get("layout")
        .and_then(Value::as_str)
        .and_then(LegacyLayout::parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;
    use worksheet_schema::{Field, ValidationError};

    fn service() -> WorksheetService {
        WorksheetService::new(Arc::new(CoreConfig::default()))
    }

    fn legacy_radial() -> Value {
        json!({"layout": "vicious_flower", "sections": [
            {"id": "centre", "fields": [{"id": "worry", "type": "text", "label": "Worry"}]},
            {"id": "petals", "fields": [], "default_items": ["Checking", "Avoidance", "Scanning"]}
        ]})
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).expect("create file");
        file.write_all(contents.as_bytes()).expect("write file");
        path
    }

    #[test]
    fn prepares_current_schema() {
        let schema = service()
            .prepare_json(r#"{"sections": [{"id": "s", "fields": [{"id": "a", "type": "text", "label": "A"}]}]}"#)
            .expect("valid schema");
        assert_eq!(schema.fields().count(), 1);
    }

    #[test]
    fn rejects_invalid_schema() {
        let err = service()
            .prepare_value(&json!({"sections": [{"id": "s", "fields": [
                {"id": "a", "type": "slider", "label": "A"}
            ]}]}))
            .expect_err("unsupported field type");
        assert!(matches!(err, WorksheetError::Validation(ValidationError::Field(_))));
        assert!(err.to_string().contains("unsupported type"));
    }

    #[test]
    fn migrates_legacy_schema_before_validation() {
        let schema = service()
            .prepare_value(&legacy_radial())
            .expect("migrated schema");
        assert_eq!(schema.layout, None);
        let first = schema.fields().next();
        match first {
            Some(Field::Formulation(field)) => {
                assert_eq!(field.nodes.len(), 4);
                assert_eq!(field.connections.len(), 3);
            }
            other => panic!("expected formulation, got {other:?}"),
        }
    }

    #[test]
    fn rejects_legacy_schema_when_migration_is_disabled() {
        let cfg = CoreConfig::new(1024, false).expect("config");
        let service = WorksheetService::new(Arc::new(cfg));
        let err = service
            .prepare_value(&legacy_radial())
            .expect_err("legacy rejected");
        assert!(matches!(err, WorksheetError::LegacyMigrationDisabled(tag) if tag == "vicious_flower"));

        let migrated = service.migrate(&legacy_radial()).expect("explicit migration");
        assert!(!migrated.is_legacy());
    }

    #[test]
    fn enforces_document_size_limit() {
        let cfg = CoreConfig::new(16, true).expect("config");
        let service = WorksheetService::new(Arc::new(cfg));
        let err = service
            .prepare_json(r#"{"sections": [], "version": 1}"#)
            .expect_err("too large");
        assert!(matches!(err, WorksheetError::DocumentTooLarge { limit: 16, .. }));

        let err = service
            .parse_responses(r#"{"diary": [{"n": 1}, {"n": 2}]}"#)
            .expect_err("too large");
        assert!(matches!(err, WorksheetError::DocumentTooLarge { .. }));
    }

    #[test]
    fn reads_json_and_yaml_files() {
        let dir = TempDir::new().expect("temp dir");
        let json_path = write_file(
            &dir,
            "schema.json",
            r#"{"sections": [{"id": "s", "fields": [{"id": "a", "type": "text", "label": "A"}]}]}"#,
        );
        let yaml_path = write_file(
            &dir,
            "schema.YML",
            "sections:\n  - id: s\n    fields:\n      - id: a\n        type: text\n        label: A\n",
        );

        let service = service();
        let from_json = service.load_schema_file(&json_path).expect("json schema");
        let from_yaml = service.load_schema_file(&yaml_path).expect("yaml schema");
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn rejects_unknown_extension_and_oversized_file() {
        let dir = TempDir::new().expect("temp dir");
        let txt = write_file(&dir, "schema.txt", "{}");
        let err = service().read_document(&txt).expect_err("unsupported");
        assert!(matches!(err, WorksheetError::UnsupportedFormat(_)));

        let big = write_file(&dir, "big.json", &format!("{{\"pad\": \"{}\"}}", "x".repeat(64)));
        let small = WorksheetService::new(Arc::new(CoreConfig::new(32, true).expect("config")));
        let err = small.read_document(&big).expect_err("too large");
        assert!(matches!(err, WorksheetError::DocumentTooLarge { limit: 32, .. }));

        let missing = dir.path().join("missing.json");
        let err = service().read_document(&missing).expect_err("missing");
        assert!(matches!(err, WorksheetError::FileRead(_)));
    }

    #[test]
    fn evaluates_loaded_responses() {
        let dir = TempDir::new().expect("temp dir");
        let responses_path = write_file(&dir, "responses.json", r#"{"t": [{"n": 5}, {"n": ""}, {"n": 10}]}"#);

        let service = service();
        let schema = service
            .prepare_value(&json!({"sections": [{"id": "s", "fields": [
                {"id": "t", "type": "table", "label": "T", "min_rows": 0, "max_rows": 10,
                 "columns": [{"id": "n", "header": "N", "type": "number"}]},
                {"id": "total", "type": "computed", "label": "Total",
                 "computation": {"operation": "sum", "field": "t.n", "format": "integer"}}
            ]}]}))
            .expect("schema");
        let values = service.load_responses_file(&responses_path).expect("responses");

        let results = service.evaluate_all(&schema, &values);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value.as_deref(), Some("15"));
        assert_eq!(results[0].diagnostics.skipped_cells.len(), 1);
    }
}
