//! Logo encoding for JSON transport.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

use crate::error::EncodeError;

/// A logo picked in the upload field.
///
/// Browsers hand files over as `data:<mime>;base64,<payload>` URLs, while
/// headless callers point at a file on disk. Both end up as the bare payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LogoFile {
    Path(PathBuf),
    DataUrl(String),
}

impl From<String> for LogoFile {
    fn from(value: String) -> Self {
        if value.starts_with("data:") {
            LogoFile::DataUrl(value)
        } else {
            LogoFile::Path(PathBuf::from(value))
        }
    }
}

impl From<PathBuf> for LogoFile {
    fn from(path: PathBuf) -> Self {
        LogoFile::Path(path)
    }
}

/// Reads an optional logo field, treating an empty string as no selection.
pub fn deserialize_optional_logo<'de, D>(deserializer: D) -> Result<Option<LogoFile>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|value| !value.is_empty()).map(LogoFile::from))
}

/// `None` when no file was selected, otherwise the base64 payload.
pub async fn encode_logo(file: Option<&LogoFile>) -> Result<Option<String>, EncodeError> {
    match file {
        Some(file) => encode_file(file).await.map(Some),
        None => Ok(None),
    }
}

pub async fn encode_file(file: &LogoFile) -> Result<String, EncodeError> {
    match file {
        LogoFile::Path(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| EncodeError::Read {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "encoded logo");
            Ok(STANDARD.encode(bytes))
        }
        LogoFile::DataUrl(url) => strip_data_url_prefix(url).map(str::to_string),
    }
}

/// Drops the `data:<mime>;base64,` scheme prefix.
///
/// Only base64 data URLs whose payload actually decodes are accepted.
pub fn strip_data_url_prefix(data_url: &str) -> Result<&str, EncodeError> {
    match data_url.split_once(',') {
        Some((prefix, payload))
            if prefix.starts_with("data:")
                && prefix.ends_with(";base64")
                && STANDARD.decode(payload).is_ok() =>
        {
            Ok(payload)
        }
        _ => Err(EncodeError::MalformedDataUrl),
    }
}
