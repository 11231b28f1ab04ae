//! Computed field evaluation.
//!
//! A computed field derives its displayed value from table columns in the current responses.
//! Evaluation is lenient: missing tables, malformed references and cells that are
//! empty or not numeric never fail a worksheet. The offending input is left out and, when
//! nothing usable remains, the field has no value (`None`).
//!
//! What was left out is reported through [`Diagnostics`] by
//! [`evaluate_with_diagnostics`]; [`evaluate`] returns the value alone.
//!
//! All functions here are pure: they only read the response snapshot they are given, so any
//! number of evaluations may run concurrently over the same snapshot.

use serde::Serialize;
use std::collections::BTreeSet;
use worksheet_schema::table::row_has_content;
use worksheet_schema::{
    CellValue, ComputeFormat, ComputedField, Field, FieldRef, Operation, Responses, RowData,
    WorksheetSchema,
};

/// Why a cell was left out of an aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SkipReason {
    /// The row has no entry for the column.
    Missing,
    /// The cell is blank text, null or an empty array or object.
    Empty,
    /// The cell holds something that does not read as a finite number.
    NotNumeric(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedCell {
    pub table: String,
    pub row: usize,
    pub column: String,
    pub reason: SkipReason,
}

/// Why a reference produced no rows at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    Malformed,
    MissingTable,
    NotATable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnresolvedRef {
    pub reference: String,
    pub reason: UnresolvedReason,
}

/// Inputs that were excluded while evaluating one computed field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub skipped_cells: Vec<SkippedCell>,
    pub unresolved: Vec<UnresolvedRef>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.skipped_cells.is_empty() && self.unresolved.is_empty()
    }

    fn unresolved(&mut self, reference: &FieldRef, reason: UnresolvedReason) {
        self.unresolved.push(UnresolvedRef {
            reference: reference.to_string(),
            reason,
        });
    }
}

/// Result of evaluating a computed field with diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub value: Option<String>,
    pub diagnostics: Diagnostics,
}

/// Value of one computed field of a schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComputedValue {
    pub field_id: String,
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Diagnostics::is_empty")]
    pub diagnostics: Diagnostics,
}

/// Evaluates a computed field against the current responses.
///
/// Returns `None` when the referenced data is absent or has no usable values.
pub fn evaluate(field: &ComputedField, values: &Responses) -> Option<String> {
    evaluate_with_diagnostics(field, values).value
}

/// Evaluates a computed field and reports every excluded cell and reference.
pub fn evaluate_with_diagnostics(field: &ComputedField, values: &Responses) -> Evaluation {
    let mut evaluator = Evaluator {
        values,
        diagnostics: Diagnostics::default(),
    };
    let computation = &field.computation;

    let value = match computation.operation {
        Operation::Sum | Operation::Min | Operation::Max | Operation::Average => {
            let numbers = evaluator.numbers_for(&computation.column_refs());
            aggregate(computation.operation, &numbers, computation.format)
        }
        Operation::Count => {
            let count = evaluator.count_rows(&computation.column_refs());
            (count > 0).then(|| format!("{count} items"))
        }
        Operation::Difference | Operation::PercentageChange => {
            computation.pair().and_then(|(field_a, field_b)| {
                let mean_a = mean(&evaluator.numbers_for(&[field_a]))?;
                let mean_b = mean(&evaluator.numbers_for(&[field_b]))?;
                let as_percentage = computation.operation == Operation::PercentageChange
                    || computation.format == Some(ComputeFormat::PercentageChange);
                render_difference(mean_a, mean_b, as_percentage)
            })
        }
    };

    if !evaluator.diagnostics.is_empty() {
        tracing::debug!(
            field = %field.id,
            skipped_cells = evaluator.diagnostics.skipped_cells.len(),
            unresolved = evaluator.diagnostics.unresolved.len(),
            "computed field excluded inputs"
        );
    }

    Evaluation {
        value,
        diagnostics: evaluator.diagnostics,
    }
}

/// Evaluates every section-level computed field of `schema`, in schema order.
pub fn evaluate_all(schema: &WorksheetSchema, values: &Responses) -> Vec<ComputedValue> {
    schema
        .fields()
        .filter_map(|field| match field {
            Field::Computed(computed) => Some(computed),
            _ => None,
        })
        .map(|computed| {
            let Evaluation { value, diagnostics } = evaluate_with_diagnostics(computed, values);
            ComputedValue {
                field_id: computed.id.clone(),
                value,
                diagnostics,
            }
        })
        .collect()
}

struct Evaluator<'v> {
    values: &'v Responses,
    diagnostics: Diagnostics,
}

impl<'v> Evaluator<'v> {
    /// Rows of the table named by `table_id`, or `None` (recorded) if there is no such table.
    fn rows(&mut self, reference: &FieldRef, table_id: &str) -> Option<&'v [RowData]> {
        let Some(value) = self.values.get(table_id) else {
            self.diagnostics
                .unresolved(reference, UnresolvedReason::MissingTable);
            return None;
        };
        let rows = value.as_rows();
        if rows.is_none() {
            self.diagnostics
                .unresolved(reference, UnresolvedReason::NotATable);
        }
        rows
    }

    /// Numeric cells of every referenced column, in reference then row order.
    fn numbers_for(&mut self, references: &[&FieldRef]) -> Vec<f64> {
        let mut numbers = Vec::new();
        for reference in references {
            let Ok((table_id, column_id)) = reference.parts() else {
                self.diagnostics
                    .unresolved(reference, UnresolvedReason::Malformed);
                continue;
            };
            let Some(rows) = self.rows(reference, table_id) else {
                continue;
            };

            for (index, row) in rows.iter().enumerate() {
                let reason = match row.get(column_id) {
                    None => SkipReason::Missing,
                    Some(cell) if cell.is_blank() => SkipReason::Empty,
                    Some(cell) => match cell.as_number() {
                        Some(number) => {
                            numbers.push(number);
                            continue;
                        }
                        None => SkipReason::NotNumeric(describe_cell(cell)),
                    },
                };
                self.diagnostics.skipped_cells.push(SkippedCell {
                    table: table_id.to_string(),
                    row: index,
                    column: column_id.to_string(),
                    reason,
                });
            }
        }
        numbers
    }

    /// Rows with any non-empty cell, summed over the distinct referenced tables.
    fn count_rows(&mut self, references: &[&FieldRef]) -> usize {
        let mut tables = BTreeSet::new();
        let mut count = 0;
        for reference in references {
            let Ok((table_id, _)) = reference.parts() else {
                self.diagnostics
                    .unresolved(reference, UnresolvedReason::Malformed);
                continue;
            };
            if !tables.insert(table_id) {
                continue;
            }
            if let Some(rows) = self.rows(reference, table_id) {
                count += rows.iter().filter(|row| row_has_content(row)).count();
            }
        }
        count
    }
}

fn describe_cell(cell: &CellValue) -> String {
    match cell {
        CellValue::Text(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn mean(numbers: &[f64]) -> Option<f64> {
    if numbers.is_empty() {
        return None;
    }
    Some(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

fn aggregate(operation: Operation, numbers: &[f64], format: Option<ComputeFormat>) -> Option<String> {
    if numbers.is_empty() {
        return None;
    }

    let result = match operation {
        Operation::Average => return mean(numbers).and_then(one_decimal),
        Operation::Sum => numbers.iter().sum::<f64>(),
        Operation::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
        Operation::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        _ => return None,
    };

    match format {
        Some(ComputeFormat::Integer) => integer(result),
        _ => one_decimal(result),
    }
}

fn render_difference(mean_a: f64, mean_b: f64, as_percentage: bool) -> Option<String> {
    let diff = mean_b - mean_a;
    if !as_percentage {
        return one_decimal(diff);
    }

    let rounded_diff = round_to_tenth(diff)?;
    let sign = if rounded_diff > 0.0 { "+" } else { "" };
    Some(format!(
        "{sign}{}% ({}% → {}%)",
        compact(diff)?,
        compact(mean_a)?,
        compact(mean_b)?
    ))
}

/// Rounds half away from zero to one decimal place, folding `-0.0` into `0.0`.
///
/// Returns `None` when the value, or its scaled form, is not finite.
fn round_to_tenth(value: f64) -> Option<f64> {
    let scaled = value * 10.0;
    if !scaled.is_finite() {
        return None;
    }
    let rounded = scaled.round() / 10.0;
    Some(if rounded == 0.0 { 0.0 } else { rounded })
}

fn one_decimal(value: f64) -> Option<String> {
    round_to_tenth(value).map(|rounded| format!("{rounded:.1}"))
}

fn integer(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round();
    Some(format!("{:.0}", if rounded == 0.0 { 0.0 } else { rounded }))
}

/// One decimal place, without a trailing `.0` for whole numbers.
fn compact(value: f64) -> Option<String> {
    let rounded = round_to_tenth(value)?;
    Some(if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    })
}
