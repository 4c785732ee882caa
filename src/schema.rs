//! Validated, index-resolved column mapping for one sheet.
//!
//! A [`Schema`] is built once per sheet from a [`FileConfig`] and the sheet's header row, before
//! any data row is read. Every later row operation works on column indices only.

use crate::config::{DEFAULT_MEASUREMENT, FileConfig, Literal};
use crate::error::{ConfigError, ConfigResult};
use crate::processing::coerce::coerce;
use crate::types::{Cell, CellType, FieldValue, NullAction, TimeUnit};

/// A tag or field column resolved against the header row.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    /// Output key (tag key or field key).
    pub name: String,
    /// Header text of the source column.
    pub column: String,
    /// Zero-based source column index.
    pub index: usize,
    /// Target type; always [`CellType::Str`] for tags.
    pub cell_type: CellType,
    pub null_action: NullAction,
    /// Pre-converted fill value, present iff `null_action == Fill`.
    pub fill: Option<FieldValue>,
}

/// Resolved timestamp column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampColumn {
    pub column: String,
    pub index: usize,
    pub unit: Option<TimeUnit>,
    pub format: Option<String>,
    /// Seconds east of UTC applied to naive dates and date serials.
    pub utc_offset_secs: i64,
}

/// Immutable, validated mapping from sheet columns to point components.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub header_row: usize,
    pub measurement: String,
    pub tags: Vec<ColumnSpec>,
    /// Never empty.
    pub fields: Vec<ColumnSpec>,
    pub timestamp: Option<TimestampColumn>,
    pub primary_key: Option<usize>,
}

impl Schema {
    /// Validate `config` against `header` and resolve every column name to its index.
    ///
    /// Fails with [`ConfigError::ColumnNotFound`] for unknown columns,
    /// [`ConfigError::InvalidFillValue`] / [`ConfigError::MissingFillValue`] for bad fill
    /// settings, [`ConfigError::RoleConflict`] when a tag or field claims the timestamp column,
    /// and [`ConfigError::NoValidFields`] when nothing is left to emit.
    pub fn build(config: &FileConfig, header: &[String]) -> ConfigResult<Schema> {
        let timestamp = match &config.timestamp {
            Some(ts) => {
                if ts.unit.is_none() && ts.format.is_none() {
                    return Err(ConfigError::IncompleteTimestamp {
                        column: ts.column.clone(),
                    });
                }
                Some(TimestampColumn {
                    column: ts.column.clone(),
                    index: index_of(header, &ts.column)?,
                    unit: ts.unit,
                    format: ts.format.clone(),
                    utc_offset_secs: ts.utc_offset_secs,
                })
            }
            None => None,
        };
        let ts_index = timestamp.as_ref().map(|t| t.index);

        let primary_key = config
            .primary_key
            .as_deref()
            .map(|column| index_of(header, column))
            .transpose()?;

        let mut tags = Vec::with_capacity(config.tags.len());
        for tag in &config.tags {
            tags.push(resolve_column(
                header,
                ts_index,
                tag.output_name(),
                &tag.column,
                CellType::Str,
                tag.null_action,
                tag.fill_value.as_ref(),
            )?);
        }

        let fields = match &config.fields {
            Some(declared) => {
                let mut fields = Vec::with_capacity(declared.len());
                for field in declared {
                    fields.push(resolve_column(
                        header,
                        ts_index,
                        field.output_name(),
                        &field.column,
                        field.cell_type,
                        field.null_action,
                        field.fill_value.as_ref(),
                    )?);
                }
                fields
            }
            None => derive_fields(header, &tags, ts_index),
        };

        if fields.is_empty() {
            return Err(ConfigError::NoValidFields);
        }

        Ok(Schema {
            header_row: config.header_row,
            measurement: config
                .measurement
                .clone()
                .unwrap_or_else(|| DEFAULT_MEASUREMENT.to_string()),
            tags,
            fields,
            timestamp,
            primary_key,
        })
    }
}

/// Convert a fill literal into a typed value at configuration time.
///
/// Returns `Ok(None)` unless `null_action` is [`NullAction::Fill`].
pub fn precompute_fill(
    column: &str,
    cell_type: CellType,
    null_action: NullAction,
    literal: Option<&Literal>,
) -> ConfigResult<Option<FieldValue>> {
    if null_action != NullAction::Fill {
        return Ok(None);
    }
    let literal = literal.ok_or_else(|| ConfigError::MissingFillValue {
        column: column.to_string(),
    })?;
    let cell = match literal {
        Literal::Bool(b) => Cell::Bool(*b),
        Literal::Int(i) => Cell::Int(*i),
        Literal::Float(f) => Cell::Float(*f),
        Literal::Str(s) => Cell::String(s.clone()),
    };
    coerce(&cell, cell_type)
        .map(Some)
        .map_err(|message| ConfigError::InvalidFillValue {
            column: column.to_string(),
            raw: cell.to_text(),
            message,
        })
}

fn resolve_column(
    header: &[String],
    ts_index: Option<usize>,
    name: &str,
    column: &str,
    cell_type: CellType,
    null_action: NullAction,
    fill_literal: Option<&Literal>,
) -> ConfigResult<ColumnSpec> {
    let index = index_of(header, column)?;
    if ts_index == Some(index) {
        return Err(ConfigError::RoleConflict {
            column: column.to_string(),
        });
    }
    let fill = precompute_fill(column, cell_type, null_action, fill_literal)?;
    Ok(ColumnSpec {
        name: name.to_string(),
        column: column.to_string(),
        index,
        cell_type,
        null_action,
        fill,
    })
}

fn derive_fields(header: &[String], tags: &[ColumnSpec], ts_index: Option<usize>) -> Vec<ColumnSpec> {
    header
        .iter()
        .enumerate()
        .filter(|(idx, h)| {
            !h.trim().is_empty()
                && ts_index != Some(*idx)
                && !tags.iter().any(|t| t.index == *idx)
        })
        .map(|(index, h)| ColumnSpec {
            name: h.trim().to_string(),
            column: h.trim().to_string(),
            index,
            cell_type: CellType::Str,
            null_action: NullAction::Ignore,
            fill: None,
        })
        .collect()
}

fn index_of(header: &[String], column: &str) -> ConfigResult<usize> {
    header
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| ConfigError::ColumnNotFound {
            column: column.to_string(),
            headers: header.to_vec(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldConfig, TagConfig, TimestampConfig};

    fn header() -> Vec<String> {
        ["id", "city", "temp", "ts", " "]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn weather_config() -> FileConfig {
        FileConfig {
            source: "weather.csv".to_string(),
            measurement: Some("weather".to_string()),
            tags: vec![TagConfig::new("city")],
            fields: Some(vec![FieldConfig::new("temp", CellType::Float)]),
            timestamp: Some(TimestampConfig {
                column: "ts".to_string(),
                unit: Some(TimeUnit::S),
                ..Default::default()
            }),
            primary_key: Some("id".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_indices_and_defaults() {
        let schema = Schema::build(&weather_config(), &header()).expect("build");
        assert_eq!(schema.measurement, "weather");
        assert_eq!(schema.tags[0].index, 1);
        assert_eq!(schema.tags[0].cell_type, CellType::Str);
        assert_eq!(schema.tags[0].null_action, NullAction::Ignore);
        assert_eq!(schema.fields[0].index, 2);
        assert_eq!(schema.timestamp.as_ref().map(|t| t.index), Some(3));
        assert_eq!(schema.primary_key, Some(0));
    }

    #[test]
    fn unknown_column_fails() {
        let mut cfg = weather_config();
        cfg.tags = vec![TagConfig::new("country")];
        let err = Schema::build(&cfg, &header()).unwrap_err();
        assert!(matches!(err, ConfigError::ColumnNotFound { ref column, .. } if column == "country"));
    }

    #[test]
    fn measurement_defaults_to_constant() {
        let mut cfg = weather_config();
        cfg.measurement = None;
        let schema = Schema::build(&cfg, &header()).expect("build");
        assert_eq!(schema.measurement, DEFAULT_MEASUREMENT);
    }

    #[test]
    fn derives_fields_from_unclaimed_headers() {
        let mut cfg = weather_config();
        cfg.fields = None;
        let schema = Schema::build(&cfg, &header()).expect("build");
        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        // city is a tag, ts is the timestamp, the blank header is skipped.
        assert_eq!(names, vec!["id", "temp"]);
        assert!(schema.fields.iter().all(|f| f.cell_type == CellType::Str));
    }

    #[test]
    fn no_fields_left_fails() {
        let cfg = FileConfig {
            tags: vec![TagConfig::new("id"), TagConfig::new("city"), TagConfig::new("temp")],
            timestamp: Some(TimestampConfig {
                column: "ts".to_string(),
                unit: Some(TimeUnit::Ms),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = Schema::build(&cfg, &header()).unwrap_err();
        assert!(matches!(err, ConfigError::NoValidFields));

        let mut cfg = weather_config();
        cfg.fields = Some(Vec::new());
        assert!(matches!(Schema::build(&cfg, &header()), Err(ConfigError::NoValidFields)));
    }

    #[test]
    fn fill_value_is_converted_eagerly() {
        let mut cfg = weather_config();
        cfg.fields = Some(vec![FieldConfig {
            null_action: NullAction::Fill,
            fill_value: Some(Literal::Str("7".to_string())),
            ..FieldConfig::new("temp", CellType::Int)
        }]);
        let schema = Schema::build(&cfg, &header()).expect("build");
        assert_eq!(schema.fields[0].fill, Some(FieldValue::Int(7)));

        cfg.fields = Some(vec![FieldConfig {
            null_action: NullAction::Fill,
            fill_value: Some(Literal::Str("warm".to_string())),
            ..FieldConfig::new("temp", CellType::Float)
        }]);
        let err = Schema::build(&cfg, &header()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFillValue { ref raw, .. } if raw == "warm"));

        cfg.fields = Some(vec![FieldConfig {
            null_action: NullAction::Fill,
            ..FieldConfig::new("temp", CellType::Float)
        }]);
        assert!(matches!(
            Schema::build(&cfg, &header()),
            Err(ConfigError::MissingFillValue { .. })
        ));
    }

    #[test]
    fn tag_fill_is_stringified() {
        let mut cfg = weather_config();
        cfg.tags = vec![TagConfig {
            null_action: NullAction::Fill,
            fill_value: Some(Literal::Int(0)),
            ..TagConfig::new("city")
        }];
        let schema = Schema::build(&cfg, &header()).expect("build");
        assert_eq!(schema.tags[0].fill, Some(FieldValue::Str("0".to_string())));
    }

    #[test]
    fn tag_cannot_claim_timestamp_column() {
        let mut cfg = weather_config();
        cfg.tags = vec![TagConfig::new("ts")];
        let err = Schema::build(&cfg, &header()).unwrap_err();
        assert!(matches!(err, ConfigError::RoleConflict { ref column } if column == "ts"));
    }
}
