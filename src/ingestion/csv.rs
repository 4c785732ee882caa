//! CSV loading into the sheet model.

use std::path::Path;

use crate::error::IngestionResult;
use crate::sheet::Sheet;
use crate::types::Cell;

/// Load a CSV file into a single [`Sheet`] named `name`.
///
/// Rules:
///
/// - No row is treated specially; the header row is chosen later by the file mapping.
/// - Records may have different lengths.
/// - Empty (or whitespace-only) values become [`Cell::Empty`]; everything else is kept as
///   trimmed text and typed later by the row transformer.
pub fn load_csv_from_path(path: impl AsRef<Path>, name: &str) -> IngestionResult<Sheet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    load_csv_from_reader(&mut rdr, name)
}

/// Load CSV data from an existing CSV reader.
///
/// If the reader was built with `has_headers(true)`, the header record is kept as the first
/// sheet row so header-row indices stay the same for both cases.
pub fn load_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    name: &str,
) -> IngestionResult<Sheet> {
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    if rdr.has_headers() {
        let headers = rdr.headers()?.clone();
        rows.push(headers.iter().map(to_cell).collect());
    }
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(to_cell).collect());
    }
    Ok(Sheet::new(name, rows))
}

fn to_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Cell::Empty
    } else {
        Cell::String(trimmed.to_owned())
    }
}
