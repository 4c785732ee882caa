use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{DeliveryError, IngestionError};
use crate::processing::DropReason;
use crate::types::OutputKind;

/// Processing events emitted while files are transformed and uploaded.
#[derive(Debug, Clone, Copy)]
pub enum ProcessingEvent<'a> {
    FileStarted {
        file: &'a str,
    },
    SheetStarted {
        file: &'a str,
        sheet: &'a str,
    },
    RowEmitted {
        file: &'a str,
        sheet: &'a str,
        row: usize,
    },
    RowDropped {
        file: &'a str,
        sheet: &'a str,
        row: usize,
        reason: &'a DropReason,
    },
    /// An `abort` column was empty; the rest of the file is skipped.
    FileAborted {
        file: &'a str,
        sheet: &'a str,
        row: usize,
        column: &'a str,
    },
    BatchDelivered {
        file: &'a str,
        kind: OutputKind,
        points: usize,
    },
    DeliveryFailed {
        file: &'a str,
        kind: OutputKind,
        points: usize,
        error: &'a DeliveryError,
    },
    FileFinished {
        file: &'a str,
        elapsed: Duration,
    },
    FileFailed {
        file: &'a str,
        error: &'a IngestionError,
    },
}

/// Observer hook for processing events.
pub trait ProcessingObserver: Send + Sync {
    fn on_event(&self, event: &ProcessingEvent<'_>);
}

/// Real-time counters for all files of a run.
///
/// Counters are updated as events are reported; callers can snapshot them at any time.
#[derive(Debug, Default)]
pub struct ProcessingMetrics {
    files_started: AtomicU64,
    files_finished: AtomicU64,
    files_failed: AtomicU64,
    files_aborted: AtomicU64,
    rows_emitted: AtomicU64,
    rows_dropped: AtomicU64,
    duplicates: AtomicU64,
    batches_delivered: AtomicU64,
    batches_failed: AtomicU64,
    points_delivered: AtomicU64,
}

impl ProcessingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: &ProcessingEvent<'_>) {
        match event {
            ProcessingEvent::FileStarted { .. } => bump(&self.files_started, 1),
            ProcessingEvent::SheetStarted { .. } => {}
            ProcessingEvent::RowEmitted { .. } => bump(&self.rows_emitted, 1),
            ProcessingEvent::RowDropped { reason, .. } => {
                bump(&self.rows_dropped, 1);
                if reason.is_duplicate() {
                    bump(&self.duplicates, 1);
                }
            }
            ProcessingEvent::FileAborted { .. } => bump(&self.files_aborted, 1),
            ProcessingEvent::BatchDelivered { points, .. } => {
                bump(&self.batches_delivered, 1);
                bump(&self.points_delivered, *points as u64);
            }
            ProcessingEvent::DeliveryFailed { .. } => bump(&self.batches_failed, 1),
            ProcessingEvent::FileFinished { .. } => bump(&self.files_finished, 1),
            ProcessingEvent::FileFailed { .. } => bump(&self.files_failed, 1),
        }
    }

    pub fn snapshot(&self) -> ProcessingMetricsSnapshot {
        ProcessingMetricsSnapshot {
            files_started: self.files_started.load(Ordering::SeqCst),
            files_finished: self.files_finished.load(Ordering::SeqCst),
            files_failed: self.files_failed.load(Ordering::SeqCst),
            files_aborted: self.files_aborted.load(Ordering::SeqCst),
            rows_emitted: self.rows_emitted.load(Ordering::SeqCst),
            rows_dropped: self.rows_dropped.load(Ordering::SeqCst),
            duplicates: self.duplicates.load(Ordering::SeqCst),
            batches_delivered: self.batches_delivered.load(Ordering::SeqCst),
            batches_failed: self.batches_failed.load(Ordering::SeqCst),
            points_delivered: self.points_delivered.load(Ordering::SeqCst),
        }
    }
}

fn bump(counter: &AtomicU64, by: u64) {
    let _ = counter.fetch_add(by, Ordering::SeqCst);
}

/// Immutable snapshot of [`ProcessingMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessingMetricsSnapshot {
    pub files_started: u64,
    pub files_finished: u64,
    pub files_failed: u64,
    pub files_aborted: u64,
    pub rows_emitted: u64,
    pub rows_dropped: u64,
    pub duplicates: u64,
    pub batches_delivered: u64,
    pub batches_failed: u64,
    pub points_delivered: u64,
}

impl fmt::Display for ProcessingMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "files={}/{} (failed={}, aborted={}), rows emitted={} dropped={} (duplicates={}), batches={} (failed={}), points_delivered={}",
            self.files_finished,
            self.files_started,
            self.files_failed,
            self.files_aborted,
            self.rows_emitted,
            self.rows_dropped,
            self.duplicates,
            self.batches_delivered,
            self.batches_failed,
            self.points_delivered
        )
    }
}

/// Fans one event out to the log, the metrics and the optional observer.
#[derive(Clone, Default)]
pub struct Reporter {
    observer: Option<Arc<dyn ProcessingObserver>>,
    metrics: Arc<ProcessingMetrics>,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("observer_set", &self.observer.is_some())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

impl Reporter {
    pub fn new(observer: Option<Arc<dyn ProcessingObserver>>) -> Self {
        Self {
            observer,
            metrics: Arc::new(ProcessingMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<ProcessingMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn emit(&self, event: ProcessingEvent<'_>) {
        log_event(&event);
        self.metrics.record(&event);
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn log_event(event: &ProcessingEvent<'_>) {
    match *event {
        ProcessingEvent::FileStarted { file } => tracing::info!(file, "processing file"),
        ProcessingEvent::SheetStarted { file, sheet } => {
            tracing::debug!(file, sheet, "processing sheet")
        }
        ProcessingEvent::RowEmitted { .. } => {}
        ProcessingEvent::RowDropped {
            file,
            sheet,
            row,
            reason,
        } => {
            if reason.is_duplicate() {
                tracing::info!(file, sheet, row, %reason, "skipping duplicate row");
            } else {
                tracing::error!(file, sheet, row, %reason, "dropping row");
            }
        }
        ProcessingEvent::FileAborted {
            file,
            sheet,
            row,
            column,
        } => tracing::error!(file, sheet, row, column, "empty abort column, stopping file"),
        ProcessingEvent::BatchDelivered { file, kind, points } => {
            tracing::debug!(file, ?kind, points, "batch delivered")
        }
        ProcessingEvent::DeliveryFailed {
            file,
            kind,
            points,
            error,
        } => tracing::error!(file, ?kind, points, %error, "batch delivery failed"),
        ProcessingEvent::FileFinished { file, elapsed } => {
            tracing::info!(file, ?elapsed, "file finished")
        }
        ProcessingEvent::FileFailed { file, error } => {
            tracing::error!(file, %error, "file failed")
        }
    }
}
