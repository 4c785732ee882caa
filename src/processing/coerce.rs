//! Cell → typed value coercion, shared by row processing and fill-value validation.

use crate::types::{Cell, CellType, FieldValue};

/// Coerce a non-empty cell to `cell_type`.
///
/// Returns a human-readable message on failure. Empty cells are rejected; null handling
/// happens before coercion.
pub fn coerce(cell: &Cell, cell_type: CellType) -> Result<FieldValue, String> {
    if cell.is_empty() {
        return Err("empty cell".to_string());
    }

    match cell_type {
        CellType::Str => Ok(FieldValue::Str(cell.to_text())),
        CellType::Bool => parse_bool_cell(cell).map(FieldValue::Bool),
        CellType::Int => parse_i64_cell(cell).map(FieldValue::Int),
        CellType::Float => parse_f64_cell(cell).map(FieldValue::Float),
    }
}

fn parse_bool_cell(c: &Cell) -> Result<bool, String> {
    match c {
        Cell::Bool(b) => Ok(*b),
        Cell::Int(i) => Ok(*i != 0),
        Cell::Float(f) => Ok(*f != 0.0),
        Cell::String(s) => parse_bool_str(s),
        _ => Err("expected bool".to_string()),
    }
}

fn parse_bool_str(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}

fn parse_i64_cell(c: &Cell) -> Result<i64, String> {
    match c {
        Cell::Int(i) => Ok(*i),
        Cell::Bool(b) => Ok(i64::from(*b)),
        Cell::Float(f) => float_to_i64(*f),
        Cell::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Ok(i),
                // "42.0" is a whole number written by a float-minded exporter.
                Err(e) => match s.parse::<f64>() {
                    Ok(f) => float_to_i64(f),
                    Err(_) => Err(e.to_string()),
                },
            }
        }
        _ => Err("expected integer".to_string()),
    }
}

fn float_to_i64(f: f64) -> Result<i64, String> {
    if f.fract() == 0.0 && f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err("expected integer (got non-integer float)".to_string())
    }
}

fn parse_f64_cell(c: &Cell) -> Result<f64, String> {
    let f = match c {
        Cell::Float(f) => *f,
        Cell::Int(i) => *i as f64,
        Cell::String(s) => s.trim().parse::<f64>().map_err(|e| e.to_string())?,
        _ => return Err("expected number".to_string()),
    };
    // NaN and infinities have no line protocol representation.
    if f.is_finite() {
        Ok(f)
    } else {
        Err(format!("expected finite number (got {f})"))
    }
}
