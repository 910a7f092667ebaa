//! In-process stand-in for the generation service.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::body::{Body, Bytes};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower_http::services::ServeDir;
use url::Url;

use postergen_lib::view::RecordingView;
use postergen_lib::{DownloadBridge, HttpGenerationClient, Workflow, WorkflowController};

#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    Text(u16, String),
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    reply: Arc<Mutex<Reply>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub struct MockGenerator {
    pub base_url: Url,
    state: MockState,
    site: TempDir,
}

impl MockGenerator {
    pub async fn start(reply: Reply) -> Self {
        let site = tempfile::tempdir().unwrap();
        let state = MockState {
            reply: Arc::new(Mutex::new(reply)),
            requests: Arc::default(),
        };

        let app = Router::new()
            .route("/api/generate_poster", post(generate))
            .route("/api/generate_festival_poster", post(generate))
            .route("/api/generate_menu", post(generate))
            .route("/broken/42.png", get(broken_image))
            .fallback_service(ServeDir::new(site.path()))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: Url::parse(&format!("http://{}/", addr)).unwrap(),
            state,
            site,
        }
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.state.reply.lock() = reply;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().clone()
    }

    /// Places a file on the mock site so it can be downloaded.
    pub fn publish(&self, relative: &str, bytes: &[u8]) {
        let path = self.site.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, bytes).unwrap();
    }

    pub fn client(&self) -> HttpGenerationClient {
        HttpGenerationClient::new(self.base_url.clone())
    }

    pub fn controller<W: Workflow>(
        &self,
        view: &RecordingView,
    ) -> WorkflowController<W, RecordingView, HttpGenerationClient> {
        WorkflowController::new(view.clone(), self.client(), DownloadBridge::new())
    }
}

async fn generate(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.requests.lock().push(Recorded {
        path: uri.path().to_string(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    let reply = state.reply.lock().clone();
    match reply {
        Reply::Json(status, value) => (status_code(status), Json(value)).into_response(),
        Reply::Text(status, text) => (status_code(status), text).into_response(),
    }
}

/// Sends part of an image, then aborts the body.
async fn broken_image() -> Response {
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"half-an-image")),
        Err(std::io::Error::other("connection lost")),
    ];
    Body::from_stream(futures::stream::iter(chunks)).into_response()
}

fn status_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

pub fn write_logo(dir: &Path, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join("logo.png");
    std::fs::write(&path, bytes).unwrap();
    path
}
