//! Data contract of `computed` fields.
//!
//! A computed field names an [`Operation`] and the table columns it reads, each written as a
//! [`FieldRef`] of the form `"<tableId>.<columnId>"`. Evaluation lives in `worksheet-core`;
//! this module only describes the shape.

use serde::{Deserialize, Serialize};
use std::fmt;
use worksheet_types::NonEmptyText;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedField {
    pub id: String,
    pub label: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    pub computation: Computation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Sum,
    Average,
    Count,
    Min,
    Max,
    Difference,
    PercentageChange,
}

impl Operation {
    /// Pairwise operations compare `field_a` against `field_b`.
    pub fn is_pairwise(&self) -> bool {
        matches!(self, Self::Difference | Self::PercentageChange)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Average => "average",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Difference => "difference",
            Self::PercentageChange => "percentage_change",
        }
    }
}

/// Rendering hint for a computed value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeFormat {
    Integer,
    Decimal,
    PercentageChange,
}

/// A reference to a table column, `"<tableId>.<columnId>"`.
///
/// The raw text is kept as authored so a malformed reference survives deserialisation and can
/// be reported by the validator, or degrade to "no value" during evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRef(String);

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("field reference '{0}' must have the form '<tableId>.<columnId>'")]
pub struct FieldRefError(pub String);

impl FieldRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the reference into `(table_id, column_id)`.
    ///
    /// Both parts must be non-empty and free of whitespace, and there must be exactly one `.`.
    pub fn parts(&self) -> Result<(&str, &str), FieldRefError> {
        let malformed = || FieldRefError(self.0.clone());
        let (table, column) = self.0.split_once('.').ok_or_else(malformed)?;

        let well_formed = |part: &str| {
            !part.is_empty() && !part.contains('.') && !part.chars().any(char::is_whitespace)
        };

        if !well_formed(table) || !well_formed(column) {
            return Err(malformed());
        }

        Ok((table, column))
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Computation {
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_a: Option<FieldRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_b: Option<FieldRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ComputeFormat>,
}

impl Computation {
    /// Column operands of an aggregate operation: `field` first, then `fields`, without repeats.
    pub fn column_refs(&self) -> Vec<&FieldRef> {
        let mut refs: Vec<&FieldRef> = Vec::new();
        for field_ref in self.field.iter().chain(self.fields.iter()) {
            if !refs.contains(&field_ref) {
                refs.push(field_ref);
            }
        }
        refs
    }

    /// The `(field_a, field_b)` pair of a pairwise operation, when both are set.
    pub fn pair(&self) -> Option<(&FieldRef, &FieldRef)> {
        Some((self.field_a.as_ref()?, self.field_b.as_ref()?))
    }

    /// Every reference written anywhere in the computation.
    pub fn references(&self) -> impl Iterator<Item = &FieldRef> {
        self.field
            .iter()
            .chain(self.fields.iter())
            .chain(self.field_a.iter())
            .chain(self.field_b.iter())
    }

    /// Checks that the operands present match the operation.
    pub fn check_operands(&self) -> Result<(), String> {
        if self.operation.is_pairwise() {
            if self.pair().is_none() {
                return Err(format!(
                    "operation '{}' requires both 'field_a' and 'field_b'",
                    self.operation.as_str()
                ));
            }
        } else if self.field.is_none() && self.fields.is_empty() {
            return Err(format!(
                "operation '{}' requires 'field' or a non-empty 'fields'",
                self.operation.as_str()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_well_formed_reference() {
        let field_ref = FieldRef::new("diary.hours");
        assert_eq!(field_ref.parts(), Ok(("diary", "hours")));
    }

    #[test]
    fn rejects_malformed_references() {
        for raw in ["diary", ".hours", "diary.", "a.b.c", "diary .hours", ""] {
            assert!(
                FieldRef::new(raw).parts().is_err(),
                "'{raw}' should be rejected"
            );
        }
    }

    #[test]
    fn column_refs_deduplicate_in_order() {
        let computation: Computation = serde_json::from_value(json!({
            "operation": "sum",
            "field": "t.a",
            "fields": ["t.b", "t.a", "t.c"]
        }))
        .expect("parse computation");

        let refs: Vec<&str> = computation
            .column_refs()
            .into_iter()
            .map(FieldRef::as_str)
            .collect();
        assert_eq!(refs, ["t.a", "t.b", "t.c"]);
    }

    #[test]
    fn operand_shape_follows_operation() {
        let aggregate: Computation =
            serde_json::from_value(json!({"operation": "average", "fields": []}))
                .expect("parse computation");
        assert!(aggregate.check_operands().is_err());

        let pairwise: Computation = serde_json::from_value(json!({
            "operation": "percentage_change",
            "field_a": "t.before",
            "field_b": "t.after"
        }))
        .expect("parse computation");
        assert!(pairwise.check_operands().is_ok());
        assert_eq!(pairwise.references().count(), 2);
    }

    #[test]
    fn malformed_reference_survives_deserialisation() {
        let computation: Computation =
            serde_json::from_value(json!({"operation": "sum", "field": "nodot"}))
                .expect("references are checked later");
        assert_eq!(computation.field.as_ref().map(FieldRef::as_str), Some("nodot"));
    }
}
