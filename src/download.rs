use futures::StreamExt;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::DownloadError;

/// A save of `url` under `filename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAction {
    pub url: String,
    pub filename: String,
}

/// Trailing path segment of an image reference.
pub fn suggested_filename(image_url: &str) -> &str {
    image_url.rsplit('/').next().unwrap_or(image_url)
}

/// Holds the last successful image reference for the download control.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct DownloadBridge {
    reference: Arc<Mutex<Option<String>>>,
}

impl DownloadBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, image_url: &str) {
        *self.reference.lock() = Some(image_url.to_string());
    }

    pub fn clear(&self) {
        *self.reference.lock() = None;
    }

    pub fn reference(&self) -> Option<String> {
        self.reference.lock().clone()
    }

    /// `None` when nothing has been generated yet; that is not an error.
    pub fn trigger(&self) -> Option<SaveAction> {
        let url = self.reference()?;
        let filename = suggested_filename(&url).to_string();
        tracing::debug!(%url, %filename, "download triggered");
        Some(SaveAction { url, filename })
    }
}

/// Saves images into a local directory, resolving relative references
/// against the generator's base URL.
#[derive(Debug, Clone)]
pub struct FileSaver {
    http: reqwest::Client,
    base_url: Url,
    dir: PathBuf,
}

impl FileSaver {
    pub fn new(base_url: Url, dir: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save(&self, action: &SaveAction) -> Result<PathBuf, DownloadError> {
        if action.filename.is_empty() {
            return Err(DownloadError::MissingFilename(action.url.clone()));
        }
        let url = self
            .base_url
            .join(&action.url)
            .map_err(|source| DownloadError::InvalidReference {
                reference: action.url.clone(),
                source,
            })?;

        let response = self.http.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(DownloadError::Status(url.to_string(), response.status()));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let target = self.dir.join(&action.filename);
        // streamed beside the target, renamed into place once complete
        let partial = self.dir.join(format!(".{}.part", action.filename));

        let written = match write_body(response, &partial, &action.filename).await {
            Ok(written) => written,
            Err(err) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    tracing::debug!(path = %partial.display(), error = %cleanup, "no partial download to remove");
                }
                return Err(err);
            }
        };
        tokio::fs::rename(&partial, &target).await?;

        tracing::info!(path = %target.display(), bytes = written, "image saved");
        Ok(target)
    }
}

async fn write_body(
    response: reqwest::Response,
    path: &Path,
    filename: &str,
) -> Result<u64, DownloadError> {
    let mut file = tokio::fs::File::create(path).await?;
    let total_size = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        downloaded += chunk.len() as u64;
        file.write_all(&chunk).await?;

        // -1 when the server sent no length
        let progress = if total_size > 0 {
            (downloaded as f64 / total_size as f64) * 100.0
        } else {
            -1.0
        };
        tracing::debug!(file = %filename, downloaded, total_size, progress, "download progress");
    }
    file.flush().await?;
    Ok(downloaded)
}
