//! Field type system.
//!
//! A worksheet field is one of a closed set of eleven variants, selected by the `type` tag of
//! its JSON object. This module defines the typed variants and [`classify`], the function that
//! turns a raw candidate field into a [`Field`] or explains why it cannot be one.
//!
//! Unknown tags are rejected, never coerced to a nearby variant.

use crate::computation::ComputedField;
use crate::formulation::FormulationField;
use crate::table::TableField;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use worksheet_types::NonEmptyText;

/// The eleven recognised field type tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Textarea,
    Number,
    Likert,
    Checklist,
    Date,
    Time,
    Select,
    Table,
    Computed,
    Formulation,
}

impl FieldKind {
    pub const ALL: [FieldKind; 11] = [
        FieldKind::Text,
        FieldKind::Textarea,
        FieldKind::Number,
        FieldKind::Likert,
        FieldKind::Checklist,
        FieldKind::Date,
        FieldKind::Time,
        FieldKind::Select,
        FieldKind::Table,
        FieldKind::Computed,
        FieldKind::Formulation,
    ];

    /// Parses a `type` tag. Matching is exact and case-sensitive.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Likert => "likert",
            Self::Checklist => "checklist",
            Self::Date => "date",
            Self::Time => "time",
            Self::Select => "select",
            Self::Table => "table",
            Self::Computed => "computed",
            Self::Formulation => "formulation",
        }
    }

    /// Returns `true` for kinds a client answers directly with a single value.
    ///
    /// Only these kinds may appear inside a formulation node.
    pub fn is_simple_input(&self) -> bool {
        !matches!(self, Self::Table | Self::Computed | Self::Formulation)
    }

    /// Comma-separated list of every recognised tag, for error messages.
    pub fn expected_list() -> String {
        Self::ALL
            .iter()
            .map(FieldKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A worksheet field, discriminated by its `type` tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Field {
    Text(TextField),
    Textarea(TextField),
    Number(NumberField),
    Likert(LikertField),
    Checklist(ChoiceField),
    Date(BasicField),
    Time(BasicField),
    Select(ChoiceField),
    Table(TableField),
    Computed(ComputedField),
    Formulation(FormulationField),
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Textarea(_) => FieldKind::Textarea,
            Self::Number(_) => FieldKind::Number,
            Self::Likert(_) => FieldKind::Likert,
            Self::Checklist(_) => FieldKind::Checklist,
            Self::Date(_) => FieldKind::Date,
            Self::Time(_) => FieldKind::Time,
            Self::Select(_) => FieldKind::Select,
            Self::Table(_) => FieldKind::Table,
            Self::Computed(_) => FieldKind::Computed,
            Self::Formulation(_) => FieldKind::Formulation,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Text(f) | Self::Textarea(f) => &f.id,
            Self::Number(f) => &f.id,
            Self::Likert(f) => &f.id,
            Self::Checklist(f) | Self::Select(f) => &f.id,
            Self::Date(f) | Self::Time(f) => &f.id,
            Self::Table(f) => &f.id,
            Self::Computed(f) => &f.id,
            Self::Formulation(f) => &f.id,
        }
    }

    pub fn label(&self) -> &NonEmptyText {
        match self {
            Self::Text(f) | Self::Textarea(f) => &f.label,
            Self::Number(f) => &f.label,
            Self::Likert(f) => &f.label,
            Self::Checklist(f) | Self::Select(f) => &f.label,
            Self::Date(f) | Self::Time(f) => &f.label,
            Self::Table(f) => &f.label,
            Self::Computed(f) => &f.label,
            Self::Formulation(f) => &f.label,
        }
    }

    /// Builds a plain `textarea` field, used for generated formulation node inputs.
    pub fn textarea(id: impl Into<String>, label: NonEmptyText) -> Self {
        Self::Textarea(TextField {
            id: id.into(),
            label,
            required: None,
            placeholder: None,
        })
    }
}

/// `text` and `textarea` fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextField {
    pub id: String,
    pub label: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// `date` and `time` fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicField {
    pub id: String,
    pub label: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumberField {
    pub id: String,
    pub label: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// A rating scale between `min` and `max`.
///
/// `anchors` maps a boundary value (as written in the schema, e.g. `"0"`) to the text shown
/// beside it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LikertField {
    pub id: String,
    pub label: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub anchors: BTreeMap<String, String>,
}

/// `checklist` and `select` fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceField {
    pub id: String,
    pub label: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    pub options: Vec<ChoiceOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

/// Reasons a raw candidate cannot be classified as a [`Field`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    #[error("field must be a JSON object")]
    NotAnObject,

    #[error("field is missing a non-empty 'id'")]
    MissingId,

    #[error("field '{id}' is missing a 'type' tag")]
    MissingType { id: String },

    #[error("field '{id}' has unsupported type '{tag}' (expected one of: {expected})", expected = FieldKind::expected_list())]
    UnsupportedType { id: String, tag: String },

    #[error("field '{id}' is missing a non-empty 'label'")]
    MissingLabel { id: String },

    #[error("field '{id}' has an invalid attribute at {path}: {reason}")]
    InvalidAttribute {
        id: String,
        path: String,
        reason: String,
    },

    #[error("field '{id}' has duplicate option id '{option}'")]
    DuplicateOption { id: String, option: String },

    #[error("computed field '{id}' {reason}")]
    InvalidComputation { id: String, reason: String },
}

/// Classifies a raw candidate field.
///
/// Checks, in order: the value is an object, it has a non-empty `id`, its `type` is one of the
/// eleven recognised tags, it has a non-empty `label`, its variant attributes deserialise, its
/// option ids are unique, and computed operands match the operation.
///
/// # Errors
///
/// Returns the first [`ClassificationError`] found.
pub fn classify(raw: &Value) -> Result<Field, ClassificationError> {
    let object = raw.as_object().ok_or(ClassificationError::NotAnObject)?;

    let id = match object.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        _ => return Err(ClassificationError::MissingId),
    };

    let tag = match object.get("type") {
        Some(Value::String(tag)) => tag,
        _ => return Err(ClassificationError::MissingType { id }),
    };

    if FieldKind::parse(tag).is_none() {
        return Err(ClassificationError::UnsupportedType {
            id,
            tag: tag.clone(),
        });
    }

    match object.get("label") {
        Some(Value::String(label)) if !label.trim().is_empty() => {}
        _ => return Err(ClassificationError::MissingLabel { id }),
    }

    let field = serde_path_to_error::deserialize::<_, Field>(raw).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        ClassificationError::InvalidAttribute {
            id: id.clone(),
            path,
            reason: err.into_inner().to_string(),
        }
    })?;

    match &field {
        Field::Checklist(choice) | Field::Select(choice) => {
            let mut seen = HashSet::new();
            for option in &choice.options {
                if !seen.insert(option.id.as_str()) {
                    return Err(ClassificationError::DuplicateOption {
                        id,
                        option: option.id.clone(),
                    });
                }
            }
        }
        Field::Computed(computed) => {
            computed
                .computation
                .check_operands()
                .map_err(|reason| ClassificationError::InvalidComputation { id, reason })?;
        }
        _ => {}
    }

    Ok(field)
}
