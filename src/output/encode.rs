//! Point encoders.
//!
//! Line protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! Tags and fields are written in schema order, so encoding is deterministic.
//!
//! Objects are JSON maps of the form `{"__name": ..., "__tags": {...}, "<field>": value, ...}`.

use serde_json::{Map, Value};

use crate::types::{FieldValue, OutputKind, Point};

/// One encoded point, ready to be buffered by the uploader.
#[derive(Debug, Clone, PartialEq)]
pub enum Encoded {
    /// A line protocol line, without trailing newline.
    Line(String),
    /// A JSON object.
    Object(Value),
}

/// Encode `point` for the given output kind.
pub fn encode(point: &Point, kind: OutputKind) -> Encoded {
    match kind {
        OutputKind::Metrics => Encoded::Line(to_line_protocol(point)),
        OutputKind::Objects => Encoded::Object(to_object(point)),
    }
}

/// Format a field value for line protocol.
///
/// - Float: written as-is (e.g., `3.14`)
/// - Int: suffixed with `i` (e.g., `42i`)
/// - Str: quoted with double quotes, inner quotes, backslashes and newlines escaped
/// - Bool: `true` or `false`
pub fn field_to_line_protocol(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{v}"),
        FieldValue::Int(v) => format!("{v}i"),
        FieldValue::Str(v) => {
            let escaped = v
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n");
            format!("\"{escaped}\"")
        }
        FieldValue::Bool(v) => v.to_string(),
    }
}

/// Render a point as one line protocol line.
///
/// The timestamp is omitted when the point has none.
pub fn to_line_protocol(point: &Point) -> String {
    let mut line = escape_measurement(&point.measurement);

    // An empty tag value is not valid line protocol.
    for (key, value) in point.tags.iter().filter(|(_, v)| !v.is_empty()) {
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    line.push(' ');
    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&field_to_line_protocol(value));
    }

    if let Some(ts) = point.timestamp {
        line.push(' ');
        line.push_str(&ts.to_string());
    }
    line
}

/// Render a point as a JSON object.
pub fn to_object(point: &Point) -> Value {
    let mut obj = Map::new();
    obj.insert("__name".to_string(), Value::String(point.measurement.clone()));
    let tags: Map<String, Value> = point
        .tags
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    obj.insert("__tags".to_string(), Value::Object(tags));
    for (key, value) in &point.fields {
        obj.insert(key.clone(), value.to_json());
    }
    Value::Object(obj)
}

/// Spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Tag keys, tag values and field keys: commas, equals signs and spaces must be escaped.
/// Newlines would end the line, so they are written as `\n`.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
        .replace('\n', "\\n")
}
