//! `sheet-metrics` turns spreadsheet rows (CSV and Excel workbooks) into time-series points and
//! uploads them in batches to a metrics/objects HTTP endpoint.
//!
//! A [`config::Config`] maps each input file to one measurement: which columns become tags,
//! which become typed fields, which column carries the timestamp and what happens when a cell is
//! empty. The primary entrypoint is [`execution::run`], which validates the configuration and
//! processes every file on its own worker.
//!
//! ## Per-row pipeline
//!
//! - merged cells resolve to the value of their anchor cell ([`sheet::Sheet::resolve`])
//! - each tag/field cell is coerced to its declared [`types::CellType`]
//! - empty cells follow their [`types::NullAction`]: ignore, drop the row, abort the file or
//!   substitute a fill value
//! - timestamps are normalized to nanoseconds since the Unix epoch
//! - rows repeating an earlier primary key within the same sheet are skipped
//!
//! Emitted points are encoded as line protocol (or JSON objects) and flushed every
//! `batch_size` points, plus once more for the remainder when a file ends.
//!
//! ## Quick example
//!
//! ```no_run
//! use sheet_metrics::config::Config;
//!
//! # fn main() -> Result<(), sheet_metrics::ConfigError> {
//! let config = Config::from_file("metrics.yaml")?;
//! let report = sheet_metrics::execution::run(&config)?;
//! println!("rows={}", report.rows_emitted());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: configuration documents (YAML/TOML) and static validation
//! - [`schema`]: a file configuration resolved against a sheet's header row
//! - [`sheet`]: in-memory sheet model with merged-cell resolution
//! - [`ingestion`]: fetching remote inputs and loading CSV/Excel files into sheets
//! - [`processing`]: type coercion, timestamp normalization and the row transformer
//! - [`output`]: encoders, the batching uploader and the HTTP sink
//! - [`execution`]: the per-file worker pool, run reports and processing events
//! - [`types`]: shared value types
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod output;
pub mod processing;
pub mod schema;
pub mod sheet;
pub mod types;

pub use error::{ConfigError, ConfigResult, DeliveryError, IngestionError, IngestionResult};
