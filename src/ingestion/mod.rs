//! Input retrieval and loading into the in-memory sheet model.
//!
//! Most callers should use [`load_sheets`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can force one via [`InputFormat`])
//! - loads CSV files as a single sheet and workbooks as the selected sheets
//! - keeps merge regions of `.xlsx` workbooks for merged-cell resolution
//!
//! Remote inputs are downloaded first with [`fetch::fetch`].

pub mod csv;
pub mod excel;
pub mod fetch;
pub mod unified;

pub use fetch::{LocalFile, fetch, is_remote};
pub use unified::{InputFormat, SheetSelection, infer_format_from_path, load_sheets};
