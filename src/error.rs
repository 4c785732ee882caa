use thiserror::Error;

/// Convenience result type for configuration and schema validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience result type for loading and processing input files.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Errors raised while loading a configuration document or validating it against a header row.
///
/// All of these are fatal: they are reported before any data row is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration document failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML document could not be parsed (also covers unsupported type/action/unit tokens).
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The TOML document could not be parsed (also covers unsupported type/action/unit tokens).
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration document extension is neither YAML nor TOML.
    #[error("unsupported configuration format '{extension}'")]
    UnsupportedFormat { extension: String },

    /// A tag, field, timestamp or primary-key column is not present in the header row.
    #[error("column '{column}' not found in header row. headers={headers:?}")]
    ColumnNotFound { column: String, headers: Vec<String> },

    /// `null_action = fill` was configured without a `fill_value`.
    #[error("column '{column}': null action 'fill' requires a fill_value")]
    MissingFillValue { column: String },

    /// The fill literal cannot be converted to the column's cell type.
    #[error("column '{column}': invalid fill value '{raw}': {message}")]
    InvalidFillValue {
        column: String,
        raw: String,
        message: String,
    },

    /// After resolving tags, fields and timestamp there is no field left to emit.
    #[error("no valid fields: at least one field column is required")]
    NoValidFields,

    /// A timestamp column was configured without a unit or a format.
    #[error("timestamp column '{column}' needs a unit, a format, or both")]
    IncompleteTimestamp { column: String },

    /// A tag or field tried to claim the timestamp column.
    #[error("column '{column}' is already used as the timestamp column")]
    RoleConflict { column: String },

    /// The configured header row is beyond the last row of the sheet.
    #[error("header row {header_row} is out of range (sheet has {rows} rows)")]
    HeaderRowOutOfRange { header_row: usize, rows: usize },

    /// Any other invalid setting (empty sink url, zero batch size, ...).
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Error type returned while retrieving, opening or processing an input file.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Spreadsheet could not be opened or read.
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV input could not be read.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Downloading a remote input failed.
    #[error("download of '{url}' failed: {message}")]
    Download { url: String, message: String },

    /// The schema for a sheet failed validation against its header row.
    #[error("sheet '{sheet}': {source}")]
    Config {
        sheet: String,
        #[source]
        source: ConfigError,
    },

    /// The input does not have the expected shape (unknown sheet, unknown format, ...).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },
}

impl IngestionError {
    /// Returns the configuration error if this failure was caused by schema validation.
    pub fn as_config_error(&self) -> Option<&ConfigError> {
        match self {
            IngestionError::Config { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A batch could not be delivered to the sink.
///
/// Delivery failures are logged and counted; they never abort row processing.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Transport-level failure (connection refused, timeout, TLS, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The sink answered with a non-2xx status.
    #[error("sink rejected batch with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The batch could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
