//! Execution engine: one worker per input file, sheets processed in order within a file.
//!
//! This module sits "above" [`crate::processing`] and [`crate::output`] and provides:
//!
//! - per-file tasks: fetch → load sheets → build schema → transform rows → upload
//! - fan-out over files on a rayon pool with a join barrier
//! - real-time metrics + observer hooks for monitoring
//!
//! Workers share nothing mutable: every file owns its uploader, and every sheet its own
//! primary-key set. An `abort` null action stops only the file it happened in.

mod observer;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::config::{Config, DEFAULT_BATCH_SIZE, DEFAULT_TIMEOUT_SECS, FileConfig};
use crate::error::{ConfigError, ConfigResult, IngestionError, IngestionResult};
use crate::ingestion::{fetch, load_sheets};
use crate::output::{HttpSink, Sink, UploadStats, Uploader, encode};
use crate::processing::{RowOutcome, RowTransformer};
use crate::schema::Schema;
use crate::sheet::Sheet;

pub use observer::{
    ProcessingEvent, ProcessingMetrics, ProcessingMetricsSnapshot, ProcessingObserver, Reporter,
};

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Upper bound on concurrently processed files.
    ///
    /// If `None`, every file gets its own worker.
    pub max_workers: Option<usize>,
    /// Number of encoded points per upload batch.
    pub batch_size: usize,
    /// Timeout for downloading remote inputs.
    pub fetch_timeout: Duration,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_workers: None,
            batch_size: DEFAULT_BATCH_SIZE,
            fetch_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Where an `abort` null action stopped a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortInfo {
    pub sheet: String,
    /// 1-based row number (spreadsheet-like).
    pub row: usize,
    pub column: String,
}

/// Row counters for one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SheetReport {
    pub sheet: String,
    pub rows_emitted: usize,
    /// All dropped rows, duplicates included.
    pub rows_dropped: usize,
    pub duplicates: usize,
    pub aborted: Option<AbortInfo>,
}

/// Outcome of one file task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileReport {
    pub source: String,
    pub sheets: Vec<SheetReport>,
    pub upload: UploadStats,
}

impl FileReport {
    pub fn rows_emitted(&self) -> usize {
        self.sheets.iter().map(|s| s.rows_emitted).sum()
    }

    pub fn rows_dropped(&self) -> usize {
        self.sheets.iter().map(|s| s.rows_dropped).sum()
    }

    pub fn duplicates(&self) -> usize {
        self.sheets.iter().map(|s| s.duplicates).sum()
    }

    pub fn aborted(&self) -> Option<&AbortInfo> {
        self.sheets.iter().find_map(|s| s.aborted.as_ref())
    }
}

/// Result of one file within a run.
#[derive(Debug)]
pub struct FileOutcome {
    pub source: String,
    pub result: IngestionResult<FileReport>,
}

/// Results of all files of a run, in input order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub files: Vec<FileOutcome>,
}

impl RunReport {
    pub fn rows_emitted(&self) -> usize {
        self.files
            .iter()
            .filter_map(|f| f.result.as_ref().ok())
            .map(FileReport::rows_emitted)
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.result.is_err())
    }

    /// The first schema validation failure, if any file had one.
    pub fn config_error(&self) -> Option<&ConfigError> {
        self.files
            .iter()
            .find_map(|f| f.result.as_ref().err().and_then(IngestionError::as_config_error))
    }
}

/// Runs file tasks against one sink.
pub struct ExecutionEngine {
    sink: Arc<dyn Sink>,
    opts: ExecutionOptions,
    reporter: Reporter,
}

impl ExecutionEngine {
    pub fn new(sink: Arc<dyn Sink>, opts: ExecutionOptions) -> Self {
        Self {
            sink,
            opts,
            reporter: Reporter::default(),
        }
    }

    /// Attach an observer for processing events.
    ///
    /// This resets the metrics handle; call [`Self::metrics`] afterwards.
    pub fn with_observer(mut self, observer: Arc<dyn ProcessingObserver>) -> Self {
        self.reporter = Reporter::new(Some(observer));
        self
    }

    /// Get a handle to real-time processing metrics.
    pub fn metrics(&self) -> Arc<ProcessingMetrics> {
        self.reporter.metrics()
    }

    /// Process every file, one worker per file, and wait for all of them.
    pub fn run(&self, files: &[FileConfig]) -> RunReport {
        let workers = self
            .opts
            .max_workers
            .unwrap_or(files.len())
            .clamp(1, files.len().max(1));

        let results: Vec<IngestionResult<FileReport>> =
            match ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(|| files.par_iter().map(|f| self.process_file(f)).collect()),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot build worker pool, processing files sequentially");
                    files.iter().map(|f| self.process_file(f)).collect()
                }
            };

        RunReport {
            files: files
                .iter()
                .zip(results)
                .map(|(f, result)| FileOutcome {
                    source: f.source.clone(),
                    result,
                })
                .collect(),
        }
    }

    /// Process one file: fetch, load its sheets and upload every emitted point.
    ///
    /// Already-buffered points are flushed even when the file is aborted or a later sheet fails
    /// schema validation.
    pub fn process_file(&self, file: &FileConfig) -> IngestionResult<FileReport> {
        let label = file.source.as_str();
        let start = Instant::now();
        self.reporter.emit(ProcessingEvent::FileStarted { file: label });

        let result = self.process_file_impl(file);
        match &result {
            Ok(report) => {
                if let Some(abort) = report.aborted() {
                    tracing::warn!(file = label, sheet = %abort.sheet, row = abort.row, "file stopped early");
                }
                self.reporter.emit(ProcessingEvent::FileFinished {
                    file: label,
                    elapsed: start.elapsed(),
                });
            }
            Err(error) => self.reporter.emit(ProcessingEvent::FileFailed { file: label, error }),
        }
        result
    }

    fn process_file_impl(&self, file: &FileConfig) -> IngestionResult<FileReport> {
        let local = fetch(&file.source, self.opts.fetch_timeout)?;
        let sheets = load_sheets(local.path(), None, &file.sheet_selection())?;

        let mut uploader = Uploader::new(self.sink.as_ref(), self.opts.batch_size)
            .with_label(file.source.as_str())
            .with_reporter(self.reporter.clone());
        let mut report = FileReport {
            source: file.source.clone(),
            ..Default::default()
        };

        let mut failure = None;
        for sheet in &sheets {
            match process_sheet(sheet, file, &mut uploader, &self.reporter) {
                Ok(sheet_report) => {
                    let aborted = sheet_report.aborted.is_some();
                    report.sheets.push(sheet_report);
                    if aborted {
                        break;
                    }
                }
                Err(source) => {
                    failure = Some(IngestionError::Config {
                        sheet: sheet.name().to_string(),
                        source,
                    });
                    break;
                }
            }
        }

        report.upload = uploader.flush_final();
        match failure {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}

/// Transform every data row of `sheet` and hand emitted points to `uploader`.
///
/// The schema is validated against the sheet's header row before any data row is read. Every
/// data row goes through the row transformer, including rows with no values at all.
pub fn process_sheet(
    sheet: &Sheet,
    file: &FileConfig,
    uploader: &mut Uploader<'_>,
    reporter: &Reporter,
) -> ConfigResult<SheetReport> {
    let label = file.source.as_str();
    reporter.emit(ProcessingEvent::SheetStarted {
        file: label,
        sheet: sheet.name(),
    });

    let header = sheet.header(file.header_row)?;
    let schema = Schema::build(file, &header)?;
    let mut transformer = RowTransformer::new(&schema);
    let mut report = SheetReport {
        sheet: sheet.name().to_string(),
        ..Default::default()
    };

    for row in (schema.header_row + 1)..sheet.row_count() {
        // Report 1-based row number (Excel-like).
        let user_row = row + 1;

        match transformer.transform(sheet, row) {
            RowOutcome::Emit(point) => {
                uploader.accumulate(encode(&point, file.kind));
                report.rows_emitted += 1;
                reporter.emit(ProcessingEvent::RowEmitted {
                    file: label,
                    sheet: sheet.name(),
                    row: user_row,
                });
            }
            RowOutcome::Dropped(reason) => {
                report.rows_dropped += 1;
                if reason.is_duplicate() {
                    report.duplicates += 1;
                }
                reporter.emit(ProcessingEvent::RowDropped {
                    file: label,
                    sheet: sheet.name(),
                    row: user_row,
                    reason: &reason,
                });
            }
            RowOutcome::Aborted { column } => {
                reporter.emit(ProcessingEvent::FileAborted {
                    file: label,
                    sheet: sheet.name(),
                    row: user_row,
                    column: &column,
                });
                report.aborted = Some(AbortInfo {
                    sheet: sheet.name().to_string(),
                    row: user_row,
                    column,
                });
                break;
            }
        }
    }

    Ok(report)
}

/// Validate `config`, then process all of its files against an [`HttpSink`].
///
/// Configuration errors terminate the run: static ones before any file is opened, header-row
/// ones after all workers have joined.
pub fn run(config: &Config) -> ConfigResult<RunReport> {
    config.validate()?;
    let sink = Arc::new(HttpSink::new(&config.sink)?);
    let engine = ExecutionEngine::new(
        sink,
        ExecutionOptions {
            batch_size: config.sink.batch_size,
            fetch_timeout: Duration::from_secs(config.sink.timeout_secs),
            ..Default::default()
        },
    );
    let mut report = engine.run(&config.files);

    if let Some(pos) = report
        .files
        .iter()
        .position(|f| matches!(f.result, Err(IngestionError::Config { .. })))
    {
        if let Err(IngestionError::Config { source, .. }) = report.files.swap_remove(pos).result {
            return Err(source);
        }
    }
    tracing::info!(files = report.files.len(), rows = report.rows_emitted(), "run finished");
    Ok(report)
}
