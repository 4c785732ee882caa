//! Batching uploader.
//!
//! Accumulates encoded points and hands them to a [`Sink`] whenever the buffer reaches the batch
//! size. [`Uploader::flush_final`] consumes the uploader, so the last partial batch is sent exactly
//! once.

use crate::error::DeliveryError;
use crate::execution::{ProcessingEvent, Reporter};
use crate::types::OutputKind;

use super::encode::Encoded;
use super::sink::{Batch, Sink};

/// Delivery counters for one uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadStats {
    /// Points handed to [`Uploader::accumulate`].
    pub points: usize,
    /// Batches the sink accepted.
    pub batches_delivered: usize,
    /// Batches the sink rejected or could not be reached for.
    pub batches_failed: usize,
    /// Points in accepted batches.
    pub points_delivered: usize,
}

/// Buffer of encoded points owned by one file-processing task.
pub struct Uploader<'a> {
    sink: &'a dyn Sink,
    batch_size: usize,
    buffer: Vec<Encoded>,
    stats: UploadStats,
    label: String,
    reporter: Reporter,
}

impl<'a> Uploader<'a> {
    /// Create an uploader. A `batch_size` of 0 is treated as 1.
    pub fn new(sink: &'a dyn Sink, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            sink,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            stats: UploadStats::default(),
            label: String::new(),
            reporter: Reporter::default(),
        }
    }

    /// Name used in logs and events (usually the input file).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Buffer one encoded point, flushing when the batch is full.
    pub fn accumulate(&mut self, unit: Encoded) {
        self.buffer.push(unit);
        self.stats.points += 1;
        if self.buffer.len() >= self.batch_size {
            self.flush();
        }
    }

    /// Send whatever is buffered. The buffer is cleared even if delivery fails.
    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let units = std::mem::take(&mut self.buffer);

        let mut lines = Vec::new();
        let mut objects = Vec::new();
        for unit in units {
            match unit {
                Encoded::Line(line) => lines.push(line),
                Encoded::Object(obj) => objects.push(obj),
            }
        }
        if !lines.is_empty() {
            let len = lines.len();
            let mut body = lines.join("\n");
            body.push('\n');
            self.deliver(Ok(Batch {
                kind: OutputKind::Metrics,
                body,
                len,
            }));
        }
        if !objects.is_empty() {
            let len = objects.len();
            let batch = serde_json::to_string(&objects)
                .map(|body| Batch {
                    kind: OutputKind::Objects,
                    body,
                    len,
                })
                .map_err(|e| (len, DeliveryError::from(e)));
            self.deliver(batch);
        }
    }

    /// Flush the final partial batch and return the counters.
    pub fn flush_final(mut self) -> UploadStats {
        self.flush();
        self.stats
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> UploadStats {
        self.stats
    }

    fn deliver(&mut self, batch: Result<Batch, (usize, DeliveryError)>) {
        let result = match batch {
            Ok(batch) => match self.sink.deliver(&batch) {
                Ok(()) => Ok((batch.kind, batch.len)),
                Err(e) => Err((batch.kind, batch.len, e)),
            },
            Err((len, e)) => Err((OutputKind::Objects, len, e)),
        };
        match result {
            Ok((kind, points)) => {
                self.stats.batches_delivered += 1;
                self.stats.points_delivered += points;
                self.reporter.emit(ProcessingEvent::BatchDelivered {
                    file: &self.label,
                    kind,
                    points,
                });
            }
            Err((kind, points, error)) => {
                self.stats.batches_failed += 1;
                self.reporter.emit(ProcessingEvent::DeliveryFailed {
                    file: &self.label,
                    kind,
                    points,
                    error: &error,
                });
            }
        }
    }
}
