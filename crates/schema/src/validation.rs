//! Schema validator.
//!
//! [`validate`] is the structural gate applied to every candidate schema before it is stored,
//! whether a clinician authored it or it was generated externally. Checks run in a fixed order
//! and stop at the first failure:
//!
//! 1. `sections` is an array and no legacy formulation `layout` is set; each section has a
//!    non-empty `id` and (unless it is a branch) a `fields` array, which may be empty.
//! 2. Every field classifies: non-empty `id` and `label`, a recognised `type`, well-typed
//!    attributes.
//! 3. Section ids are unique, and field ids are unique across the whole schema.
//! 4. Tables have `min_rows <= max_rows` and at least one column.
//! 5. Computed fields only use references of the form `tableId.columnId`.
//! 6. Formulations are internally consistent: unique node ids and slots, slots valid for the
//!    layout, simple inputs inside nodes, connections between existing nodes.
//!
//! Whether a computed field points at a table that exists is deliberately not checked; such a
//! field evaluates to "no value".

use crate::computation::ComputedField;
use crate::field::{classify, ClassificationError, Field};
use crate::formulation::FormulationField;
use crate::table::TableField;
use crate::worksheet::{LegacyLayout, WorksheetSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("schema must be a JSON object")]
    NotAnObject,

    #[error("schema is missing a 'sections' array")]
    MissingSections,

    #[error("schema uses the legacy '{0}' layout and must be migrated first")]
    LegacySchema(String),

    #[error("section {section}: {reason}")]
    InvalidSection { section: String, reason: String },

    #[error(transparent)]
    Field(#[from] ClassificationError),

    #[error("{0}")]
    Schema(String),

    #[error("duplicate section id '{0}'")]
    DuplicateSectionId(String),

    #[error("duplicate field id '{0}'")]
    DuplicateFieldId(String),

    #[error("table field '{id}' {reason}")]
    InvalidTable { id: String, reason: String },

    #[error("computed field '{id}' references '{reference}', expected '<tableId>.<columnId>'")]
    InvalidFieldRef { id: String, reference: String },

    #[error("formulation field '{id}' {reason}")]
    InvalidFormulation { id: String, reason: String },
}

/// Serialisable outcome of validation: `{"valid": true}` or `{"valid": false, "error": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationReport {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: &ValidationError) -> Self {
        Self {
            valid: false,
            error: Some(error.to_string()),
        }
    }
}

impl<T> From<&Result<T, ValidationError>> for ValidationReport {
    fn from(result: &Result<T, ValidationError>) -> Self {
        match result {
            Ok(_) => Self::valid(),
            Err(err) => Self::invalid(err),
        }
    }
}

/// Validates a raw candidate schema and returns its typed form.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, in the order described in the module docs.
pub fn validate(raw: &Value) -> Result<WorksheetSchema, ValidationError> {
    let object = raw.as_object().ok_or(ValidationError::NotAnObject)?;
    let sections = object
        .get("sections")
        .and_then(Value::as_array)
        .ok_or(ValidationError::MissingSections)?;

    if let Some(legacy) = object
        .get("layout")
        .and_then(Value::as_str)
        .and_then(LegacyLayout::parse)
    {
        return Err(ValidationError::LegacySchema(legacy.to_string()));
    }

    for (index, section) in sections.iter().enumerate() {
        check_section_shape(index, section)?;
    }

    for section in sections {
        if let Some(fields) = section.get("fields").and_then(Value::as_array) {
            for field in fields {
                classify(field)?;
            }
        }
    }

    let schema = WorksheetSchema::from_json_value(raw)
        .map_err(|err| ValidationError::Schema(err.to_string()))?;

    check_structure(&schema)?;
    Ok(schema)
}

/// Convenience wrapper returning the serialisable report.
pub fn validation_report(raw: &Value) -> ValidationReport {
    ValidationReport::from(&validate(raw))
}

/// Runs checks 3 to 6 on an already typed schema.
///
/// Used on schemas produced in-process (for example by migration) that never existed as raw
/// JSON.
pub fn check_structure(schema: &WorksheetSchema) -> Result<(), ValidationError> {
    let mut sections = HashSet::new();
    for section in &schema.sections {
        if !sections.insert(section.id()) {
            return Err(ValidationError::DuplicateSectionId(section.id().to_string()));
        }
    }

    let mut seen = HashSet::new();
    for field in schema.fields() {
        if !seen.insert(field.id()) {
            return Err(ValidationError::DuplicateFieldId(field.id().to_string()));
        }
    }

    for field in schema.fields() {
        if let Field::Table(table) = field {
            check_table(table)?;
        }
    }

    for field in schema.fields() {
        if let Field::Computed(computed) = field {
            check_references(computed)?;
        }
    }

    for field in schema.fields() {
        if let Field::Formulation(formulation) = field {
            check_formulation(formulation)?;
        }
    }

    Ok(())
}

fn check_section_shape(index: usize, raw: &Value) -> Result<(), ValidationError> {
    let invalid = |section: String, reason: &str| ValidationError::InvalidSection {
        section,
        reason: reason.to_string(),
    };
    let position = format!("#{index}");

    let object = raw
        .as_object()
        .ok_or_else(|| invalid(position.clone(), "must be an object"))?;

    let id = match object.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => format!("'{id}'"),
        _ => return Err(invalid(position, "is missing a non-empty 'id'")),
    };

    let is_branch = object.get("type").and_then(Value::as_str) == Some("branch");
    match object.get("fields") {
        Some(Value::Array(_)) => Ok(()),
        Some(_) => Err(invalid(id, "'fields' must be an array")),
        None if is_branch => Ok(()),
        None => Err(invalid(id, "is missing a 'fields' array")),
    }
}

fn check_table(table: &TableField) -> Result<(), ValidationError> {
    if table.min_rows > table.max_rows {
        return Err(ValidationError::InvalidTable {
            id: table.id.clone(),
            reason: format!(
                "has min_rows ({}) greater than max_rows ({})",
                table.min_rows, table.max_rows
            ),
        });
    }
    if table.columns.is_empty() {
        return Err(ValidationError::InvalidTable {
            id: table.id.clone(),
            reason: "must have at least one column".into(),
        });
    }
    Ok(())
}

fn check_references(computed: &ComputedField) -> Result<(), ValidationError> {
    for reference in computed.computation.references() {
        if reference.parts().is_err() {
            return Err(ValidationError::InvalidFieldRef {
                id: computed.id.clone(),
                reference: reference.to_string(),
            });
        }
    }
    Ok(())
}

fn check_formulation(formulation: &FormulationField) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidFormulation {
        id: formulation.id.clone(),
        reason,
    };

    let mut node_ids = HashSet::new();
    let mut slots = HashSet::new();
    for node in &formulation.nodes {
        if node.id.trim().is_empty() {
            return Err(invalid("has a node without an id".into()));
        }
        if !node_ids.insert(node.id.as_str()) {
            return Err(invalid(format!("has duplicate node id '{}'", node.id)));
        }
        if !formulation.layout.accepts_slot(&node.slot) {
            return Err(invalid(format!(
                "node '{}' uses slot '{}' which is not valid for the {} layout",
                node.id, node.slot, formulation.layout
            )));
        }
        if !slots.insert(node.slot.as_str()) {
            return Err(invalid(format!(
                "has more than one node in slot '{}'",
                node.slot
            )));
        }

        let mut field_ids = HashSet::new();
        for field in &node.fields {
            if !field.kind().is_simple_input() {
                return Err(invalid(format!(
                    "node '{}' contains a {} field, only simple inputs are allowed",
                    node.id,
                    field.kind()
                )));
            }
            if !field_ids.insert(field.id()) {
                return Err(invalid(format!(
                    "node '{}' has duplicate field id '{}'",
                    node.id,
                    field.id()
                )));
            }
        }
    }

    for connection in &formulation.connections {
        for endpoint in [&connection.from, &connection.to] {
            if !node_ids.contains(endpoint.as_str()) {
                return Err(invalid(format!(
                    "has a connection to unknown node '{endpoint}'"
                )));
            }
        }
    }

    Ok(())
}
