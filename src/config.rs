//! Configuration document: sink settings plus one mapping entry per input file.
//!
//! Documents are YAML (`.yaml`, `.yml`) or TOML (`.toml`). Token-valued settings (cell types,
//! null actions, time units, output kinds) deserialize into closed enums, so an unsupported token
//! fails while the document is parsed.
//!
//! ```yaml
//! sink:
//!   url: "http://localhost:9529"
//!   batch_size: 100
//! files:
//!   - source: "data/weather.xlsx"
//!     header_row: 0
//!     measurement: weather
//!     tags:
//!       - column: city
//!     fields:
//!       - column: temp
//!         type: float
//!         null_action: fill
//!         fill_value: 0.0
//!     timestamp:
//!       column: ts
//!       unit: s
//!     primary_key: id
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::ingestion::SheetSelection;
use crate::schema::precompute_fill;
use crate::types::{CellType, NullAction, OutputKind, TimeUnit};

/// Measurement name used when a file entry does not set one.
pub const DEFAULT_MEASUREMENT: &str = "sheet_metrics";

/// Number of encoded points per upload batch when the sink section does not set one.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default HTTP request timeout for the sink.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Upload endpoint settings.
    pub sink: SinkConfig,
    /// Input files and their column mappings.
    #[serde(default)]
    pub files: Vec<FileConfig>,
}

/// Where and how batches are delivered.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Base URL of the collector (e.g. `http://localhost:9529`).
    pub url: String,
    /// Path of the "write metrics" endpoint.
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    /// Path of the "write objects" endpoint.
    #[serde(default = "default_objects_path")]
    pub objects_path: String,
    /// Number of encoded points per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SinkConfig {
    /// Sink settings for `url` with every other option at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            metrics_path: default_metrics_path(),
            objects_path: default_objects_path(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_metrics_path() -> String {
    "/v1/write/metrics".to_string()
}

fn default_objects_path() -> String {
    "/v1/write/object".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Mapping of one input file (local path or URL) to points.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    /// Local path or `http(s)://` URL of the spreadsheet.
    #[serde(alias = "path", alias = "url")]
    pub source: String,
    /// Sheets to process; absent means the first sheet, `"*"` means all sheets.
    #[serde(default)]
    pub sheets: Option<SheetsSpec>,
    /// Zero-based index of the header row.
    #[serde(default)]
    pub header_row: usize,
    /// Output encoding for this file.
    #[serde(default)]
    pub kind: OutputKind,
    /// Measurement name; defaults to [`DEFAULT_MEASUREMENT`].
    #[serde(default)]
    pub measurement: Option<String>,
    /// Tag columns, in output order.
    #[serde(default)]
    pub tags: Vec<TagConfig>,
    /// Field columns, in output order. `None` derives fields from the header row.
    #[serde(default)]
    pub fields: Option<Vec<FieldConfig>>,
    /// Timestamp column; absent means wall-clock time at processing.
    #[serde(default)]
    pub timestamp: Option<TimestampConfig>,
    /// Column whose value identifies duplicate rows within a sheet.
    #[serde(default)]
    pub primary_key: Option<String>,
}

impl FileConfig {
    /// Resolve the configured sheet selection.
    pub fn sheet_selection(&self) -> SheetSelection {
        match &self.sheets {
            None => SheetSelection::First,
            Some(SheetsSpec::One(name)) if name == "*" => SheetSelection::AllSheets,
            Some(SheetsSpec::One(name)) => SheetSelection::Sheet(name.clone()),
            Some(SheetsSpec::Many(names)) => SheetSelection::Sheets(names.clone()),
        }
    }
}

/// Raw `sheets` setting: a single name (or `"*"`) or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SheetsSpec {
    One(String),
    Many(Vec<String>),
}

/// A tag column. Tag values are always strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagConfig {
    /// Header name of the source column.
    pub column: String,
    /// Output tag key; defaults to the column name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub null_action: NullAction,
    #[serde(default)]
    pub fill_value: Option<Literal>,
}

impl TagConfig {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ..Default::default()
        }
    }

    pub fn output_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.column)
    }
}

/// A field column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldConfig {
    /// Header name of the source column.
    pub column: String,
    /// Output field key; defaults to the column name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub cell_type: CellType,
    #[serde(default)]
    pub null_action: NullAction,
    #[serde(default)]
    pub fill_value: Option<Literal>,
}

impl FieldConfig {
    pub fn new(column: impl Into<String>, cell_type: CellType) -> Self {
        Self {
            column: column.into(),
            cell_type,
            ..Default::default()
        }
    }

    pub fn output_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.column)
    }
}

/// Timestamp column settings. At least one of `unit` / `format` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimestampConfig {
    /// Header name of the source column.
    pub column: String,
    /// Unit of numeric epoch values.
    #[serde(default)]
    pub unit: Option<TimeUnit>,
    /// `strftime`-style format for text timestamps.
    #[serde(default)]
    pub format: Option<String>,
    /// Offset of naive (zone-less) times from UTC, in seconds east of UTC.
    #[serde(default)]
    pub utc_offset_secs: i64,
}

/// A scalar literal as written in the configuration document (used for fill values).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Config {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(text)?;
        Ok(config)
    }

    /// Parse configuration from a file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let content = std::fs::read_to_string(path)?;
        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml(&content),
            "toml" => Self::from_toml(&content),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }

    /// Run every check that does not need a header row.
    ///
    /// Column names are resolved later, per sheet, by [`crate::schema::Schema::build`].
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sink.url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "sink url must not be empty".to_string(),
            });
        }
        if self.sink.batch_size == 0 {
            return Err(ConfigError::Invalid {
                message: "sink batch_size must be > 0".to_string(),
            });
        }
        for file in &self.files {
            file.validate()?;
        }
        Ok(())
    }
}

impl FileConfig {
    /// Static checks for one file entry: timestamp settings and fill literals.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "file source must not be empty".to_string(),
            });
        }
        if let Some(ts) = &self.timestamp {
            if ts.unit.is_none() && ts.format.is_none() {
                return Err(ConfigError::IncompleteTimestamp {
                    column: ts.column.clone(),
                });
            }
        }
        for tag in &self.tags {
            precompute_fill(
                &tag.column,
                CellType::Str,
                tag.null_action,
                tag.fill_value.as_ref(),
            )?;
        }
        for field in self.fields.iter().flatten() {
            precompute_fill(
                &field.column,
                field.cell_type,
                field.null_action,
                field.fill_value.as_ref(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_YAML: &str = r#"
sink:
  url: "http://localhost:9529"
  batch_size: 10
files:
  - source: "weather.xlsx"
    sheets: "*"
    header_row: 1
    measurement: weather
    tags:
      - column: city
        null_action: drop
    fields:
      - column: temp
        type: float
        null_action: fill
        fill_value: 0.5
      - column: ok
        name: healthy
        type: bool
    timestamp:
      column: ts
      unit: s
    primary_key: id
  - url: "https://example.com/load.csv"
    kind: objects
"#;

    #[test]
    fn parses_full_yaml_document() {
        let config = Config::from_yaml(FULL_YAML).expect("parse yaml");
        config.validate().expect("valid config");

        assert_eq!(config.sink.url, "http://localhost:9529");
        assert_eq!(config.sink.batch_size, 10);
        assert_eq!(config.sink.metrics_path, "/v1/write/metrics");
        assert_eq!(config.sink.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.files.len(), 2);

        let weather = &config.files[0];
        assert_eq!(weather.sheet_selection(), SheetSelection::AllSheets);
        assert_eq!(weather.header_row, 1);
        assert_eq!(weather.tags[0].null_action, NullAction::Drop);
        let fields = weather.fields.as_ref().expect("fields");
        assert_eq!(fields[0].cell_type, CellType::Float);
        assert_eq!(fields[0].fill_value, Some(Literal::Float(0.5)));
        assert_eq!(fields[1].output_name(), "healthy");
        assert_eq!(weather.timestamp.as_ref().and_then(|t| t.unit), Some(TimeUnit::S));
        assert_eq!(weather.primary_key.as_deref(), Some("id"));

        let load = &config.files[1];
        assert_eq!(load.source, "https://example.com/load.csv");
        assert_eq!(load.kind, OutputKind::Objects);
        assert_eq!(load.sheet_selection(), SheetSelection::First);
        assert!(load.fields.is_none());
    }

    #[test]
    fn parses_toml_document() {
        let text = r#"
[sink]
url = "http://collector:9529"

[[files]]
source = "a.csv"
sheets = ["one", "two"]

[[files.fields]]
column = "v"
type = "int"
null_action = "abort"
"#;
        let config = Config::from_toml(text).expect("parse toml");
        config.validate().expect("valid");
        assert_eq!(config.sink.batch_size, DEFAULT_BATCH_SIZE);
        let file = &config.files[0];
        assert_eq!(
            file.sheet_selection(),
            SheetSelection::Sheets(vec!["one".to_string(), "two".to_string()])
        );
        let fields = file.fields.as_ref().expect("fields");
        assert_eq!(fields[0].null_action, NullAction::Abort);
    }

    #[test]
    fn rejects_unsupported_tokens_at_parse_time() {
        let yaml = r#"
sink: { url: "http://x" }
files:
  - source: a.csv
    fields:
      - { column: v, type: decimal }
"#;
        assert!(matches!(Config::from_yaml(yaml), Err(ConfigError::Yaml(_))));

        let yaml = r#"
sink: { url: "http://x" }
files:
  - source: a.csv
    timestamp: { column: ts, unit: minutes }
"#;
        assert!(matches!(Config::from_yaml(yaml), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn validate_rejects_timestamp_without_unit_or_format() {
        let yaml = r#"
sink: { url: "http://x" }
files:
  - source: a.csv
    timestamp: { column: ts }
"#;
        let config = Config::from_yaml(yaml).expect("parse");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteTimestamp { ref column } if column == "ts"));
    }

    #[test]
    fn validate_rejects_bad_fill_literal_before_any_row() {
        let yaml = r#"
sink: { url: "http://x" }
files:
  - source: a.csv
    fields:
      - { column: v, type: int, null_action: fill, fill_value: "abc" }
"#;
        let config = Config::from_yaml(yaml).expect("parse");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFillValue { .. }));
        assert!(err.to_string().contains("invalid fill value 'abc'"));
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let yaml = "sink: { url: \"http://x\", batch_size: 0 }\n";
        let config = Config::from_yaml(yaml).expect("parse");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn from_file_rejects_unknown_extension() {
        let path = std::env::temp_dir().join(format!(
            "sheet-metrics-config-{}.ini",
            std::process::id()
        ));
        std::fs::write(&path, "x=1").expect("write");
        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { ref extension } if extension == "ini"));
        let _ = std::fs::remove_file(&path);
    }
}
