use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::SettingsError;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000/";
pub const SERVER_ENV: &str = "POSTERGEN_SERVER";

/// Choices remembered between runs.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub download_dir: Option<String>,
}

impl Settings {
    /// `<temp>/postergen/postergen.json`
    pub fn default_path() -> PathBuf {
        env::temp_dir().join("postergen").join("postergen.json")
    }

    /// A missing file yields empty settings.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Updates one key. `""`, `"null"` and `"none"` clear it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let value = match value {
            "" | "null" | "none" => None,
            _ => Some(value.to_string()),
        };
        match key {
            "server" => {
                if let Some(server) = &value {
                    normalize_server(server)?;
                }
                self.server = value;
            }
            "download_dir" => self.download_dir = value,
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        match key {
            "server" => Ok(self.server.clone()),
            "download_dir" => Ok(self.download_dir.clone()),
            _ => Err(SettingsError::UnknownKey(key.to_string())),
        }
    }

    /// Flag, then `POSTERGEN_SERVER`, then the stored value, then the default.
    pub fn server_url(&self, flag: Option<&str>) -> Result<Url, SettingsError> {
        let from_env = env::var(SERVER_ENV).ok().filter(|value| !value.is_empty());
        let server = flag
            .map(str::to_string)
            .or(from_env)
            .or_else(|| self.server.clone())
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        normalize_server(&server)
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Parses a base URL, adding the trailing `/` that endpoint joins rely on.
pub fn normalize_server(value: &str) -> Result<Url, SettingsError> {
    let with_slash = if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{}/", value)
    };
    Url::parse(&with_slash).map_err(|source| SettingsError::InvalidServer {
        value: value.to_string(),
        source,
    })
}
