//! Row-level transformation: cells → typed values → [`crate::types::Point`]s.
//!
//! - [`coerce`]: cell → typed value conversion for a [`crate::types::CellType`]
//! - [`timestamp`]: timestamp normalization to nanoseconds
//! - [`row`]: the per-row state machine ([`RowTransformer`]) with null-action handling and
//!   primary-key deduplication
//!
//! ## Example
//!
//! ```rust
//! use sheet_metrics::config::{FieldConfig, FileConfig, TagConfig};
//! use sheet_metrics::processing::{RowOutcome, RowTransformer};
//! use sheet_metrics::schema::Schema;
//! use sheet_metrics::sheet::Sheet;
//! use sheet_metrics::types::{Cell, CellType, FieldValue};
//!
//! let sheet = Sheet::new(
//!     "weather",
//!     vec![
//!         vec![Cell::String("city".into()), Cell::String("temp".into())],
//!         vec![Cell::String("NY".into()), Cell::Float(21.5)],
//!     ],
//! );
//! let config = FileConfig {
//!     measurement: Some("weather".into()),
//!     tags: vec![TagConfig::new("city")],
//!     fields: Some(vec![FieldConfig::new("temp", CellType::Float)]),
//!     ..Default::default()
//! };
//! let schema = Schema::build(&config, &sheet.header(0).unwrap()).unwrap();
//!
//! let mut transformer = RowTransformer::new(&schema).with_clock(|| 0);
//! let RowOutcome::Emit(point) = transformer.transform(&sheet, 1) else { unreachable!() };
//! assert_eq!(point.field("temp"), Some(&FieldValue::Float(21.5)));
//! ```

pub mod coerce;
pub mod row;
pub mod timestamp;

pub use coerce::coerce;
pub use row::{ColumnOutcome, DropReason, RowOutcome, RowTransformer, resolve_column};
pub use timestamp::{TimestampOutcome, normalize, wall_clock_ns};
