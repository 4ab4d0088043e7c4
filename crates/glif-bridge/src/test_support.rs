//! In-process stand-in for the glif API and its image host.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use glif_core::config::{DownloadConfig, GlifConfig};
use serde_json::{json, Value};

use crate::image_client::ImageClient;
use crate::storage::ImageStore;

pub(crate) const IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image";

#[derive(Debug, Clone)]
pub(crate) enum ApiMode {
    Output,
    Error(String),
    Status(u16),
    NullOutput,
    Garbage,
}

pub(crate) struct MockGlif {
    base_url: String,
    api_mode: Mutex<ApiMode>,
    image_status: Mutex<u16>,
    requests: Mutex<Vec<(Option<String>, Value)>>,
    image_hits: AtomicUsize,
}

impl MockGlif {
    pub(crate) fn endpoint(&self) -> String {
        format!("{}/run", self.base_url)
    }

    pub(crate) fn image_url(&self) -> String {
        format!("{}/image.png", self.base_url)
    }

    pub(crate) fn set_api_mode(&self, mode: ApiMode) {
        *self.api_mode.lock().unwrap() = mode;
    }

    pub(crate) fn set_image_status(&self, status: u16) {
        *self.image_status.lock().unwrap() = status;
    }

    pub(crate) fn requests(&self) -> Vec<(Option<String>, Value)> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn image_hits(&self) -> usize {
        self.image_hits.load(Ordering::SeqCst)
    }
}

pub(crate) async fn spawn_mock() -> Arc<MockGlif> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mock = Arc::new(MockGlif {
        base_url: format!("http://{addr}"),
        api_mode: Mutex::new(ApiMode::Output),
        image_status: Mutex::new(200),
        requests: Mutex::new(Vec::new()),
        image_hits: AtomicUsize::new(0),
    });
    let app = Router::new()
        .route("/run", post(run))
        .route("/image.png", get(image))
        .with_state(mock.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    mock
}

async fn run(
    State(mock): State<Arc<MockGlif>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.requests.lock().unwrap().push((auth, body));
    let mode = mock.api_mode.lock().unwrap().clone();
    match mode {
        ApiMode::Output => Json(json!({ "output": mock.image_url() })).into_response(),
        ApiMode::Error(msg) => Json(json!({ "error": msg })).into_response(),
        ApiMode::Status(code) => {
            (StatusCode::from_u16(code).unwrap(), "upstream unavailable").into_response()
        }
        ApiMode::NullOutput => Json(json!({ "output": null })).into_response(),
        ApiMode::Garbage => (StatusCode::OK, "<html>oops</html>").into_response(),
    }
}

async fn image(State(mock): State<Arc<MockGlif>>) -> Response {
    mock.image_hits.fetch_add(1, Ordering::SeqCst);
    let status = *mock.image_status.lock().unwrap();
    if status == 200 {
        (StatusCode::OK, IMAGE_BYTES.to_vec()).into_response()
    } else {
        (StatusCode::from_u16(status).unwrap(), "gone").into_response()
    }
}

pub(crate) fn glif_config(mock: &MockGlif) -> GlifConfig {
    GlifConfig {
        api_token: "test-token".to_string(),
        endpoint: mock.endpoint(),
        timeout_seconds: Some(5),
    }
}

pub(crate) fn download_config() -> DownloadConfig {
    DownloadConfig {
        retry_delay_seconds: 0,
        timeout_seconds: 5,
        accept_invalid_certs: false,
        ..DownloadConfig::default()
    }
}

pub(crate) fn client_for(mock: &MockGlif, dir: &Path) -> ImageClient {
    // keep loopback traffic away from any proxy configured in the environment
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    std::env::set_var("no_proxy", "127.0.0.1,localhost");
    ImageClient::from_config(
        &glif_config(mock),
        &download_config(),
        ImageStore::new(dir, "png"),
    )
    .unwrap()
}
