//! Delivery of encoded batches to the collector.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::config::SinkConfig;
use crate::error::{ConfigError, ConfigResult, DeliveryError};
use crate::types::OutputKind;

/// A serialized batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Which endpoint the batch belongs to.
    pub kind: OutputKind,
    /// Request body: newline-terminated line protocol, or a JSON array.
    pub body: String,
    /// Number of points in the batch.
    pub len: usize,
}

impl Batch {
    pub fn content_type(&self) -> &'static str {
        match self.kind {
            OutputKind::Metrics => "text/plain; charset=utf-8",
            OutputKind::Objects => "application/json",
        }
    }
}

/// Destination for batches. Implementations must tolerate concurrent callers.
pub trait Sink: Send + Sync {
    /// Deliver one batch. A returned error is logged by the caller and never retried.
    fn deliver(&self, batch: &Batch) -> Result<(), DeliveryError>;
}

/// Blocking HTTP sink posting to the "write metrics" and "write objects" endpoints.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::blocking::Client,
    metrics_url: String,
    objects_url: String,
}

impl HttpSink {
    pub fn new(config: &SinkConfig) -> ConfigResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid {
                message: format!("cannot build http client: {e}"),
            })?;
        Ok(Self {
            client,
            metrics_url: join_url(&config.url, &config.metrics_path),
            objects_url: join_url(&config.url, &config.objects_path),
        })
    }

    pub fn url_for(&self, kind: OutputKind) -> &str {
        match kind {
            OutputKind::Metrics => &self.metrics_url,
            OutputKind::Objects => &self.objects_url,
        }
    }
}

impl Sink for HttpSink {
    fn deliver(&self, batch: &Batch) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.url_for(batch.kind))
            .header(CONTENT_TYPE, batch.content_type())
            .body(batch.body.clone())
            .send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(DeliveryError::Status {
            status: status.as_u16(),
            body: response.text().unwrap_or_default(),
        })
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
