//! Unified loading entrypoint.
//!
//! Most callers should use [`load_sheets`], which loads a local file into one or more
//! [`Sheet`]s. The input format is inferred from the file extension unless given explicitly.

use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::sheet::Sheet;

use super::{csv, excel};

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Comma-separated values. Loaded as a single sheet.
    Csv,
    /// Spreadsheet/workbook formats.
    Excel,
}

impl InputFormat {
    /// Parse an input format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// How to choose sheet(s) from a workbook. CSV input always yields its single sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SheetSelection {
    /// The first sheet (default).
    #[default]
    First,
    /// A single named sheet.
    Sheet(String),
    /// All sheets, in workbook order.
    AllSheets,
    /// The listed sheets, in the given order.
    Sheets(Vec<String>),
}

/// Load `path` into sheets.
///
/// - If `format` is `None`, the format is inferred from the file extension.
/// - A CSV file becomes one sheet named after the file stem.
pub fn load_sheets(
    path: impl AsRef<Path>,
    format: Option<InputFormat>,
    selection: &SheetSelection,
) -> IngestionResult<Vec<Sheet>> {
    let path = path.as_ref();
    let format = match format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    match format {
        InputFormat::Csv => {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("csv");
            Ok(vec![csv::load_csv_from_path(path, name)?])
        }
        InputFormat::Excel => excel::load_workbook_from_path(path, selection),
    }
}

/// Infer the input format from a path (or URL) extension.
pub fn infer_format_from_path(path: &Path) -> IngestionResult<InputFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    InputFormat::from_extension(ext).ok_or_else(|| IngestionError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(InputFormat::from_extension("CSV"), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_extension("xlsx"), Some(InputFormat::Excel));
        assert_eq!(InputFormat::from_extension("ods"), Some(InputFormat::Excel));
        assert_eq!(InputFormat::from_extension("json"), None);
    }

    #[test]
    fn infer_rejects_unknown_or_missing_extension() {
        let err = infer_format_from_path(Path::new("data.parquet")).unwrap_err();
        assert!(err.to_string().contains("cannot infer format from extension 'parquet'"));
        let err = infer_format_from_path(Path::new("data")).unwrap_err();
        assert!(err.to_string().contains("path has no extension"));
    }
}
