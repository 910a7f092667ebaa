use std::path::PathBuf;
use thiserror::Error;

/// Message used when the generator fails without saying why.
pub const GENERIC_SERVER_ERROR: &str = "Something went wrong on the server.";

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to read logo file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Logo is not a base64 data URL")]
    MalformedDataUrl,
}

/// Client-side checks that must stop a submission before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A logo is required to generate a menu.")]
    MissingLogo,
    #[error("Please add at least one menu item.")]
    NoMenuItems,
}

/// Every transport or server failure collapses into one readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GenerationError {
    message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            Self {
                message: GENERIC_SERVER_ERROR.to_string(),
            }
        } else {
            Self { message }
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Image reference {0:?} has no file name")]
    MissingFilename(String),
    #[error("Invalid image reference {reference:?}: {source}")]
    InvalidReference {
        reference: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to download image from {0}: HTTP {1}")]
    Status(String, reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unknown key: {0}")]
    UnknownKey(String),
    #[error("Invalid server URL {value:?}: {source}")]
    InvalidServer {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
