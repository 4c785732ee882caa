//! Row → [`Point`] transformation.
//!
//! Each row walks `dedup check → tags → fields → timestamp → emit`. Any column can end the walk
//! early: a dropped row only skips itself, an aborted row stops the whole file.

use std::collections::HashSet;
use std::fmt;

use crate::schema::{ColumnSpec, Schema};
use crate::sheet::Sheet;
use crate::types::{Cell, FieldValue, NullAction, Point};

use super::coerce::coerce;
use super::timestamp::{TimestampOutcome, normalize, wall_clock_ns};

/// Outcome of resolving one tag or field column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOutcome {
    /// Use this value.
    Value(FieldValue),
    /// Leave the column out of the point.
    Skip,
    /// Drop the whole row.
    DropRow(DropReason),
    /// Stop processing the file.
    AbortSheet,
}

/// Why a row produced no point.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// The primary key was already seen in this sheet.
    Duplicate { key: String },
    /// A `drop` column was empty.
    EmptyColumn { column: String },
    /// A cell could not be coerced to its column type.
    Coercion {
        column: String,
        raw: String,
        message: String,
    },
    /// Every field was skipped.
    NoFields,
    /// The timestamp cell was empty or unparseable.
    Timestamp { message: String },
}

impl DropReason {
    /// Duplicates are expected; everything else is a data error.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DropReason::Duplicate { .. })
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Duplicate { key } => write!(f, "duplicate primary key '{key}'"),
            DropReason::EmptyColumn { column } => write!(f, "column '{column}' is empty"),
            DropReason::Coercion {
                column,
                raw,
                message,
            } => write!(f, "column '{column}': cannot convert '{raw}': {message}"),
            DropReason::NoFields => write!(f, "row has no fields"),
            DropReason::Timestamp { message } => write!(f, "timestamp: {message}"),
        }
    }
}

/// Terminal state of one row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// The row produced a point.
    Emit(Point),
    /// The row was skipped; processing continues.
    Dropped(DropReason),
    /// An `abort` column was empty; no further rows of the file may be processed.
    Aborted { column: String },
}

/// Resolve a column cell against its null action and type.
pub fn resolve_column(spec: &ColumnSpec, cell: &Cell) -> ColumnOutcome {
    if cell.is_empty() {
        return match spec.null_action {
            NullAction::Ignore => ColumnOutcome::Skip,
            NullAction::Drop => ColumnOutcome::DropRow(DropReason::EmptyColumn {
                column: spec.column.clone(),
            }),
            NullAction::Abort => ColumnOutcome::AbortSheet,
            NullAction::Fill => match &spec.fill {
                Some(v) => ColumnOutcome::Value(v.clone()),
                // Schema::build guarantees a fill value; treat a hand-built spec like `ignore`.
                None => ColumnOutcome::Skip,
            },
        };
    }

    match coerce(cell, spec.cell_type) {
        Ok(v) => ColumnOutcome::Value(v),
        Err(message) => ColumnOutcome::DropRow(DropReason::Coercion {
            column: spec.column.clone(),
            raw: cell.to_text(),
            message,
        }),
    }
}

/// Per-sheet row processing context.
///
/// Holds the set of primary keys seen so far; create a new transformer for every sheet.
pub struct RowTransformer<'a> {
    schema: &'a Schema,
    seen: HashSet<String>,
    clock: fn() -> i64,
}

impl<'a> RowTransformer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            seen: HashSet::new(),
            clock: wall_clock_ns,
        }
    }

    /// Replace the wall clock used when no timestamp column is configured.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Transform row `row` of `sheet`.
    pub fn transform(&mut self, sheet: &Sheet, row: usize) -> RowOutcome {
        if let Some(pk) = self.schema.primary_key {
            let key = sheet.resolve(row, pk).to_text();
            if !key.is_empty() && !self.seen.insert(key.clone()) {
                return RowOutcome::Dropped(DropReason::Duplicate { key });
            }
        }

        let mut tags = Vec::with_capacity(self.schema.tags.len());
        for spec in &self.schema.tags {
            match resolve_column(spec, sheet.resolve(row, spec.index)) {
                ColumnOutcome::Value(v) => tags.push((spec.name.clone(), tag_text(v))),
                ColumnOutcome::Skip => {}
                ColumnOutcome::DropRow(reason) => return RowOutcome::Dropped(reason),
                ColumnOutcome::AbortSheet => {
                    return RowOutcome::Aborted {
                        column: spec.column.clone(),
                    };
                }
            }
        }

        let mut fields = Vec::with_capacity(self.schema.fields.len());
        for spec in &self.schema.fields {
            match resolve_column(spec, sheet.resolve(row, spec.index)) {
                ColumnOutcome::Value(v) => fields.push((spec.name.clone(), v)),
                ColumnOutcome::Skip => {}
                ColumnOutcome::DropRow(reason) => return RowOutcome::Dropped(reason),
                ColumnOutcome::AbortSheet => {
                    return RowOutcome::Aborted {
                        column: spec.column.clone(),
                    };
                }
            }
        }
        if fields.is_empty() {
            return RowOutcome::Dropped(DropReason::NoFields);
        }

        let outcome = match &self.schema.timestamp {
            Some(ts) => normalize(sheet.resolve(row, ts.index), Some(ts), self.clock),
            None => normalize(&Cell::Empty, None, self.clock),
        };
        let timestamp = match outcome {
            TimestampOutcome::Nanos(ns) => ns,
            TimestampOutcome::Drop(message) => {
                return RowOutcome::Dropped(DropReason::Timestamp { message });
            }
        };

        RowOutcome::Emit(Point {
            measurement: self.schema.measurement.clone(),
            tags,
            fields,
            timestamp: Some(timestamp),
        })
    }
}

fn tag_text(v: FieldValue) -> String {
    match v {
        FieldValue::Str(s) => s,
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) => f.to_string(),
        FieldValue::Bool(b) => b.to_string(),
    }
}
