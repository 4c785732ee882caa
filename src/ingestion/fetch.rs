//! Input retrieval: local paths are used as is, `http(s)://` URLs are downloaded to a
//! temporary file that is removed when the [`LocalFile`] is dropped.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{IngestionError, IngestionResult};

/// A readable local copy of an input.
#[derive(Debug)]
pub struct LocalFile {
    path: PathBuf,
    temporary: bool,
}

impl LocalFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }
}

impl Drop for LocalFile {
    fn drop(&mut self) {
        if self.temporary {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Whether `source` names a remote input.
pub fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Produce a local readable file for `source` (a path or an `http(s)://` URL).
pub fn fetch(source: &str, timeout: Duration) -> IngestionResult<LocalFile> {
    if !is_remote(source) {
        return Ok(LocalFile {
            path: PathBuf::from(source),
            temporary: false,
        });
    }

    let download_err = |message: String| IngestionError::Download {
        url: source.to_string(),
        message,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| download_err(e.to_string()))?;
    let response = client
        .get(source)
        .send()
        .map_err(|e| download_err(e.to_string()))?;
    if !response.status().is_success() {
        return Err(download_err(format!("status {}", response.status())));
    }
    let bytes = response.bytes().map_err(|e| download_err(e.to_string()))?;

    let path = std::env::temp_dir().join(temp_name(source));
    std::fs::write(&path, &bytes)?;
    tracing::debug!(url = source, path = %path.display(), bytes = bytes.len(), "downloaded input");
    Ok(LocalFile {
        path,
        temporary: true,
    })
}

/// Temp file name that keeps the URL's file name (and so its extension).
fn temp_name(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = without_query
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("download");
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("sheet-metrics-{}-{nanos}-{file_name}", std::process::id())
}
