//! Table data model.
//!
//! A `table` field declares its columns; its runtime value is an ordered sequence of
//! [`RowData`]. Row order matters for display only.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use worksheet_types::NonEmptyText;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableField {
    pub id: String,
    pub label: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    pub columns: Vec<TableColumn>,
    pub min_rows: u32,
    pub max_rows: u32,
}

impl TableField {
    pub fn column(&self, id: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|column| column.id == id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Textarea,
    Number,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub id: String,
    pub header: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// A single table cell as stored in a response.
///
/// Cells are strings or numbers; blank text means "unset". Anything else is kept verbatim:
/// `null` and empty arrays or objects are unset, while booleans and non-empty containers
/// count as content but never as numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Other(Value),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(text) => text.trim().is_empty(),
            Self::Other(Value::Null) => true,
            Self::Other(Value::Array(items)) => items.is_empty(),
            Self::Other(Value::Object(entries)) => entries.is_empty(),
            Self::Other(_) => false,
        }
    }

    /// Numeric reading of the cell, if it has one.
    ///
    /// Text is trimmed and parsed; non-finite results (`"NaN"`, `"inf"`) are not numbers for
    /// worksheet purposes.
    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            Self::Number(number) => *number,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
            Self::Other(_) => return None,
        };
        number.is_finite().then_some(number)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One table row: column id to cell.
pub type RowData = BTreeMap<String, CellValue>;

/// Returns `true` when at least one cell of the row holds a value.
pub fn row_has_content(row: &RowData) -> bool {
    row.values().any(|cell| !cell.is_blank())
}

/// The runtime value of one field in a response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Rows(Vec<RowData>),
    Text(String),
    Number(f64),
    Boolean(bool),
    List(Vec<String>),
    Other(Value),
}

impl FieldValue {
    /// Table rows, when this value is a sequence of rows.
    pub fn as_rows(&self) -> Option<&[RowData]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

/// Answers for one completion of a worksheet, keyed by field id.
pub type Responses = BTreeMap<String, FieldValue>;
