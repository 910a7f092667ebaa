use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GenerationError;
use crate::forms::GenerationRequest;

const MISSING_IMAGE_URL: &str = "The generator response did not include an image URL.";

/// Remote generation endpoints, one per workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Poster,
    FestivalPoster,
    Menu,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Poster => "/api/generate_poster",
            Endpoint::FestivalPoster => "/api/generate_festival_poster",
            Endpoint::Menu => "/api/generate_menu",
        }
    }

    /// Resolves the endpoint beneath `base`, keeping any path prefix it has.
    pub fn url(self, base: &Url) -> Result<Url, url::ParseError> {
        base.join(self.path().trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub image_url: String,
}

#[derive(Deserialize)]
struct SuccessBody {
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Sends exactly one request. No retries.
    async fn generate(
        &self,
        endpoint: Endpoint,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError>;
}

/// Turns a non-success body into the message shown to the user.
///
/// JSON `{"error": ...}` wins, then the raw text, then the generic fallback.
pub fn failure_message(body: &str) -> String {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.unwrap_or_default(),
        Err(_) => body.to_string(),
    };
    GenerationError::new(message).message().to_string()
}

pub fn parse_success(body: &str) -> Result<GenerationResult, GenerationError> {
    let parsed: SuccessBody = serde_json::from_str(body)
        .map_err(|e| GenerationError::new(format!("Invalid generator response: {}", e)))?;
    match parsed.image_url {
        Some(image_url) if !image_url.is_empty() => Ok(GenerationResult { image_url }),
        _ => Err(GenerationError::new(MISSING_IMAGE_URL)),
    }
}

/// JSON-over-HTTP client for the generation service.
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpGenerationClient {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(
        &self,
        endpoint: Endpoint,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let url = endpoint
            .url(&self.base_url)
            .map_err(|e| GenerationError::new(e.to_string()))?;
        tracing::info!(%url, "dispatching generation request");

        let response = self.http.post(url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = failure_message(&body);
            tracing::debug!(%status, %message, "generator rejected request");
            return Err(GenerationError::new(message));
        }

        let result = parse_success(&body)?;
        tracing::info!(image_url = %result.image_url, "generation complete");
        Ok(result)
    }
}
