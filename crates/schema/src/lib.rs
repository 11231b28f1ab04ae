//! Worksheet schema model.
//!
//! This crate defines the structure of clinical worksheets and the structural checks applied
//! to them:
//! - the field type system ([`field`]) and its classifier,
//! - the table data model and response values ([`table`]),
//! - the data contract of computed fields ([`computation`]),
//! - the formulation diagram model ([`formulation`]),
//! - sections and the top-level schema ([`section`], [`worksheet`]),
//! - the schema validator ([`validation`]).
//!
//! Evaluation of computed fields and migration of legacy formulations live in `worksheet-core`.
//! This crate handles the model and its JSON/YAML representation only.

pub mod computation;
pub mod field;
pub mod formulation;
pub mod section;
pub mod table;
pub mod validation;
pub mod worksheet;

pub use computation::{Computation, ComputeFormat, ComputedField, FieldRef, Operation};
pub use field::{classify, ClassificationError, Field, FieldKind};
pub use formulation::{
    ConnectionDirection, ConnectionStyle, Domain, FormulationConfig, FormulationConnection,
    FormulationField, FormulationLayout, FormulationNode,
};
pub use section::{BranchSection, DefaultItem, Highlight, PlainSection, Section, SectionLayout};
pub use table::{CellValue, FieldValue, Responses, RowData, TableColumn, TableField};
pub use validation::{check_structure, validate, validation_report, ValidationError, ValidationReport};
pub use worksheet::{LegacyLayout, WorksheetSchema};

// Re-export validated primitives so callers need only this crate.
pub use worksheet_types::{HexColour, NonEmptyText};

/// Errors returned when reading or writing schema documents.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`SchemaError`].
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Parse a response document (field id to value) from JSON text.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidJson`] if the text is not a JSON object.
pub fn parse_responses(json_text: &str) -> SchemaResult<Responses> {
    Ok(serde_json::from_str(json_text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_response_document() {
        let responses = parse_responses(r#"{"diary": [{"n": 1}], "name": "Sam"}"#)
            .expect("parse responses");
        assert_eq!(responses.len(), 2);
        assert!(responses["diary"].as_rows().is_some());
    }

    #[test]
    fn rejects_non_object_responses() {
        let err = parse_responses("[1, 2]").expect_err("responses must be an object");
        assert!(matches!(err, SchemaError::InvalidJson(_)));
    }
}
