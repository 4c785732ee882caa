use std::path::Path;

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};

use crate::error::{IngestionError, IngestionResult};
use crate::sheet::{MergeRegion, Sheet};
use crate::types::Cell;

use super::unified::SheetSelection;

/// Load the selected sheets of an Excel document (`.xlsx`, `.xls`, `.ods`, etc.).
///
/// Behavior:
/// - Cells keep their absolute sheet coordinates, so row 0 is the first sheet row even when the
///   used range starts lower
/// - Native dates are kept as date serials ([`Cell::DateTime`])
/// - Merge regions are loaded for `.xlsx`/`.xlsm` workbooks; other formats report none
pub fn load_workbook_from_path(
    path: impl AsRef<Path>,
    selection: &SheetSelection,
) -> IngestionResult<Vec<Sheet>> {
    let mut workbook = open_workbook_auto(path)?;
    if let Sheets::Xlsx(xlsx) = &mut workbook {
        xlsx.load_merged_regions().map_err(calamine::Error::from)?;
    }

    let available = workbook.sheet_names().to_vec();
    let names: Vec<String> = match selection {
        SheetSelection::First => available.into_iter().take(1).collect(),
        SheetSelection::Sheet(name) => vec![name.clone()],
        SheetSelection::AllSheets => available,
        SheetSelection::Sheets(names) => names.clone(),
    };
    if names.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "workbook has no sheets".to_string(),
        });
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let merges = match &workbook {
            Sheets::Xlsx(xlsx) => xlsx
                .merged_regions_by_sheet(&name)
                .into_iter()
                .map(|(_, _, dims)| {
                    MergeRegion::new(
                        (dims.start.0 as usize, dims.start.1 as usize),
                        (dims.end.0 as usize, dims.end.1 as usize),
                    )
                })
                .collect(),
            _ => Vec::new(),
        };
        sheets.push(Sheet::new(name, range_to_rows(&range)).with_merges(merges));
    }
    Ok(sheets)
}

fn range_to_rows(range: &Range<Data>) -> Vec<Vec<Cell>> {
    let Some((end_row, end_col)) = range.end() else {
        return Vec::new();
    };
    (0..=end_row)
        .map(|r| {
            (0..=end_col)
                .map(|c| range.get_value((r, c)).map(to_cell).unwrap_or_default())
                .collect()
        })
        .collect()
}

fn to_cell(c: &Data) -> Cell {
    match c {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::String(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::String(s.clone()),
        Data::DurationIso(s) => Cell::String(s.clone()),
        Data::Error(e) => Cell::Error(format!("{e:?}")),
    }
}
