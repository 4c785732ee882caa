//! Core data model types shared by the schema, the row transformer and the encoders.
//!
//! A [`crate::sheet::Sheet`] holds raw [`Cell`]s. The row transformer turns one row into a
//! [`Point`] whose fields are typed [`FieldValue`]s matching the configured [`CellType`].

use std::fmt;

use serde::Deserialize;

/// Logical type a column is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    /// 64-bit signed integer.
    Int,
    /// UTF-8 string.
    #[default]
    Str,
    /// Boolean.
    Bool,
    /// 64-bit floating point number.
    Float,
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CellType::Int => "int",
            CellType::Str => "str",
            CellType::Bool => "bool",
            CellType::Float => "float",
        };
        f.write_str(s)
    }
}

/// Policy applied when a tag or field cell is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullAction {
    /// Skip the column; the rest of the row is still built.
    #[default]
    Ignore,
    /// Stop processing the whole file.
    Abort,
    /// Drop the row.
    Drop,
    /// Substitute the configured fill value.
    Fill,
}

/// Unit of a numeric epoch timestamp cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Nanoseconds.
    Ns,
    /// Microseconds.
    Us,
    /// Milliseconds.
    Ms,
    /// Seconds.
    S,
}

impl TimeUnit {
    /// Multiplier converting one unit into nanoseconds.
    pub fn nanos_per_unit(self) -> i64 {
        match self {
            TimeUnit::Ns => 1,
            TimeUnit::Us => 1_000,
            TimeUnit::Ms => 1_000_000,
            TimeUnit::S => 1_000_000_000,
        }
    }
}

/// What a file's points are encoded as before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Line protocol text, posted to the metrics endpoint.
    #[default]
    Metrics,
    /// JSON objects, posted to the objects endpoint as one array per batch.
    Objects,
}

/// A raw spreadsheet cell, as read from a workbook or a CSV record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Native empty cell. Distinct from `String("")`.
    #[default]
    Empty,
    /// Text cell.
    String(String),
    /// Integer cell.
    Int(i64),
    /// Floating point cell (spreadsheets store most numbers this way).
    Float(f64),
    /// Boolean cell.
    Bool(bool),
    /// Native date/time cell holding the spreadsheet date serial.
    DateTime(f64),
    /// Formula error such as `#N/A`.
    Error(String),
}

impl Cell {
    /// Whether this cell is the native empty marker.
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Render the cell as text the way it appears in a header or a tag value.
    ///
    /// Whole floats lose their trailing `.0` so that `1.0` read from a workbook matches `1`.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::String(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) | Cell::DateTime(f) => {
                if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Cell::Bool(b) => b.to_string(),
            Cell::Error(e) => e.clone(),
        }
    }
}

/// A typed field value in a [`Point`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Str(String),
}

impl FieldValue {
    /// Convert into a JSON value for the object encoder.
    ///
    /// Non-finite floats have no JSON representation and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Int(i) => serde_json::Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// One fully resolved record: measurement, tags, fields and timestamp.
///
/// Tags and fields keep schema declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Measurement (or object class) name.
    pub measurement: String,
    /// Tag key/value pairs.
    pub tags: Vec<(String, String)>,
    /// Field key/value pairs; never empty for an emitted point.
    pub fields: Vec<(String, FieldValue)>,
    /// Nanoseconds since the Unix epoch, or `None` to let the receiver assign one.
    pub timestamp: Option<i64>,
}

impl Point {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Look up a tag by name.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
