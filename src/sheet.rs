//! In-memory sheet model and merged-cell resolution.
//!
//! Spreadsheets store the value of a merged block only in its top-left (anchor) cell; every
//! other cell of the block reads as empty. [`Sheet::resolve`] hides that by redirecting empty
//! cells inside a merge region to the region's anchor.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Cell;

static EMPTY: Cell = Cell::Empty;

/// An inclusive rectangular merge region, in zero-based sheet coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRegion {
    /// `(row, col)` of the anchor cell.
    pub start: (usize, usize),
    /// `(row, col)` of the bottom-right cell.
    pub end: (usize, usize),
}

impl MergeRegion {
    pub fn new(start: (usize, usize), end: (usize, usize)) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.start.0..=self.end.0).contains(&row) && (self.start.1..=self.end.1).contains(&col)
    }
}

/// One sheet of a workbook (or a whole CSV file), row-major, with its merge regions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<Cell>>,
    merges: Vec<MergeRegion>,
}

impl Sheet {
    /// Create a sheet without merge regions. Rows may have different lengths.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
            merges: Vec::new(),
        }
    }

    /// Attach merge regions.
    pub fn with_merges(mut self, merges: Vec<MergeRegion>) -> Self {
        self.merges = merges;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn merges(&self) -> &[MergeRegion] {
        &self.merges
    }

    /// The stored cell at `(row, col)`, without merge resolution.
    ///
    /// Coordinates outside the stored grid read as [`Cell::Empty`].
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// The effective value at `(row, col)`.
    ///
    /// A non-empty stored cell is returned as is. An empty one is replaced by the anchor of the
    /// first merge region containing it; with no such region the result is [`Cell::Empty`].
    pub fn resolve(&self, row: usize, col: usize) -> &Cell {
        let direct = self.cell(row, col);
        if !direct.is_empty() {
            return direct;
        }
        match self.merges.iter().find(|m| m.contains(row, col)) {
            Some(region) => self.cell(region.start.0, region.start.1),
            None => direct,
        }
    }

    /// Header names of `header_row`, with merged header cells resolved.
    pub fn header(&self, header_row: usize) -> ConfigResult<Vec<String>> {
        let row = self
            .rows
            .get(header_row)
            .ok_or(ConfigError::HeaderRowOutOfRange {
                header_row,
                rows: self.rows.len(),
            })?;
        Ok((0..row.len())
            .map(|col| self.resolve(header_row, col).to_text())
            .collect())
    }
}
