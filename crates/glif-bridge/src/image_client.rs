use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use glif_core::config::{DownloadConfig, GlifConfig};
use glif_core::error::BridgeError;
use glif_core::types::GenerationRequest;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::storage::ImageStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed wait after a transport failure; no growth between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(cfg: &DownloadConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            delay: Duration::from_secs(cfg.retry_delay_seconds),
        }
    }
}

#[derive(Debug)]
pub(crate) enum FetchError {
    Transport(String),
    Status(u16),
}

/// Talks to the glif simple API and fetches the images it points at.
#[derive(Clone)]
pub struct ImageClient {
    api: Client,
    downloader: Client,
    endpoint: String,
    api_token: String,
    retry: RetryPolicy,
    store: ImageStore,
}

impl ImageClient {
    pub fn from_config(
        glif: &GlifConfig,
        download: &DownloadConfig,
        store: ImageStore,
    ) -> Result<Self, BridgeError> {
        let mut api = Client::builder();
        if let Some(secs) = glif.timeout_seconds {
            api = api.timeout(Duration::from_secs(secs));
        }
        let api = api
            .build()
            .map_err(|err| BridgeError::InvalidConfig(format!("build glif client failed: {err}")))?;

        if download.accept_invalid_certs {
            warn!("image downloads skip TLS certificate verification (download.accept_invalid_certs=true)");
        }
        let downloader = Client::builder()
            .timeout(Duration::from_secs(download.timeout_seconds))
            .danger_accept_invalid_certs(download.accept_invalid_certs)
            .build()
            .map_err(|err| {
                BridgeError::InvalidConfig(format!("build download client failed: {err}"))
            })?;

        Ok(Self {
            api,
            downloader,
            endpoint: glif.endpoint.trim().to_string(),
            api_token: glif.api_token.trim().to_string(),
            retry: RetryPolicy::from_config(download),
            store,
        })
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    /// Runs one glif and returns the image URL from its `output` field.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, BridgeError> {
        let body = json!({
            "id": request.model_id,
            "inputs": [request.prompt, request.aspect_ratio],
        });
        debug!("generate_image: endpoint={} body={}", self.endpoint, body);

        let result = self.post_run(&body).await;
        match &result {
            Ok(url) => debug!("generate_image: ok model_id={} url={}", request.model_id, url),
            Err(err) => error!("generate_image: failed model_id={} err={}", request.model_id, err),
        }
        result
    }

    async fn post_run(&self, body: &Value) -> Result<String, BridgeError> {
        let resp = self
            .api
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await
            .map_err(|err| BridgeError::Generation(format!("glif request failed: {err}")))?;
        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|err| BridgeError::Generation(format!("read glif response failed: {err}")))?;
        if !status.is_success() {
            return Err(BridgeError::Generation(format!(
                "glif error status={}: {}",
                status.as_u16(),
                truncate(&raw, 400)
            )));
        }
        let v: Value = serde_json::from_str(&raw)
            .map_err(|err| BridgeError::Generation(format!("parse glif response failed: {err}")))?;
        output_url(&v)
    }

    pub async fn download(&self, url: &str) -> Result<Vec<u8>, BridgeError> {
        debug!("download_image: url={url}");
        fetch_with_retry(self.retry, url, || {
            let request = self.downloader.get(url);
            async move {
                let resp = request
                    .send()
                    .await
                    .map_err(|err| FetchError::Transport(err.to_string()))?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(FetchError::Status(status.as_u16()));
                }
                let bytes = resp
                    .bytes()
                    .await
                    .map_err(|err| FetchError::Transport(format!("read body: {err}")))?;
                Ok(bytes.to_vec())
            }
        })
        .await
    }

    pub async fn download_and_save(&self, url: &str) -> Result<PathBuf, BridgeError> {
        let bytes = self.download(url).await?;
        self.store.save(&bytes).await
    }
}

fn output_url(v: &Value) -> Result<String, BridgeError> {
    if let Some(err) = v.get("error") {
        let msg = match err {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(BridgeError::Generation(msg));
    }
    match v.get("output") {
        Some(Value::String(url)) if !url.trim().is_empty() => Ok(url.trim().to_string()),
        Some(_) => Err(BridgeError::Generation("glif returned an empty output".to_string())),
        None => Err(BridgeError::Generation(format!(
            "glif response missing output: {}",
            truncate(&v.to_string(), 400)
        ))),
    }
}

/// Transport failures sleep `policy.delay` before the next attempt; a bad
/// status is retried straight away.
pub(crate) async fn fetch_with_retry<F, Fut>(
    policy: RetryPolicy,
    url: &str,
    mut fetch: F,
) -> Result<Vec<u8>, BridgeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<u8>, FetchError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_err = String::new();
    for attempt in 1..=attempts {
        match fetch().await {
            Ok(bytes) => {
                info!(
                    "download_image: ok attempt={attempt}/{attempts} bytes={}",
                    bytes.len()
                );
                return Ok(bytes);
            }
            Err(FetchError::Status(status)) => {
                error!("download_image: http status={status} attempt={attempt}/{attempts} url={url}");
                last_err = format!("http status {status}");
            }
            Err(FetchError::Transport(err)) => {
                warn!("download_image: transport error attempt={attempt}/{attempts} url={url} err={err}");
                last_err = err;
                if attempt < attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
    Err(BridgeError::Download(format!(
        "{last_err} (after {attempts} attempts)"
    )))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect::<String>() + "..."
}
