//! REST client for the Image Store Service.
//!
//! Thin calls only: list, upload and search are attempted once and their
//! failures surface to the caller. The one place that retries with backoff
//! is [`HttpImageStore::wait_until_healthy`], used before a long-running
//! watch so a service that is still starting does not abort it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{ImageStore, ServiceHealth, UploadFile};
use crate::config::GalleryConfig;
use crate::error::{GalleryError, Result};
use crate::record::ImageRecord;

/// Initial retry interval while waiting for the service.
const INITIAL_INTERVAL: Duration = Duration::from_millis(200);

/// Maximum retry interval while waiting for the service.
const MAX_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

/// HTTP-backed [`ImageStore`].
#[derive(Debug, Clone)]
pub struct HttpImageStore {
    client: Client,
    base_url: Url,
}

impl HttpImageStore {
    /// Create a client for the service rooted at `base_url`.
    #[instrument(level = "debug", skip_all, fields(base_url = %base_url, timeout_ms = timeout.as_millis() as u64))]
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| GalleryError::Config(format!("Invalid API URL {base_url:?}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(GalleryError::Config(format!(
                "Unsupported API URL scheme: {}",
                base_url.scheme()
            )));
        }
        // Endpoints are joined relative to the base path
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            warn!(error = %e, "Failed to create HTTP client");
            GalleryError::Config(format!("Failed to create HTTP client: {e}"))
        })?;

        debug!("Image store client created");
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &GalleryConfig) -> Result<Self> {
        Self::new(&config.api_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| GalleryError::Config(format!("Invalid endpoint {path}: {e}")))
    }

    /// Send a request once and decode its JSON body.
    async fn send_json<T>(&self, endpoint: &'static str, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let start = Instant::now();

        let response = request.send().await.map_err(|e| {
            warn!(
                endpoint,
                error = %e,
                latency_ms = start.elapsed().as_millis() as u64,
                "Request failed"
            );
            GalleryError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                endpoint,
                status = %status,
                latency_ms = start.elapsed().as_millis() as u64,
                "Service returned error status"
            );
            return Err(GalleryError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response.json::<T>().await.map_err(|e| {
            warn!(endpoint, error = %e, "Failed to parse JSON response");
            GalleryError::Decode {
                endpoint,
                reason: e.to_string(),
            }
        })?;

        debug!(
            endpoint,
            latency_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        Ok(body)
    }

    /// Poll the health endpoint until it answers `ok`, retrying transient
    /// failures with exponential backoff for at most `max_elapsed`.
    #[instrument(level = "info", skip(self), fields(base_url = %self.base_url, max_elapsed_ms = max_elapsed.as_millis() as u64))]
    pub async fn wait_until_healthy(&self, max_elapsed: Duration) -> Result<ServiceHealth> {
        let backoff = ExponentialBackoff {
            initial_interval: INITIAL_INTERVAL,
            max_interval: MAX_INTERVAL,
            max_elapsed_time: Some(max_elapsed),
            ..Default::default()
        };

        let health = retry_notify(
            backoff,
            || async {
                match self.health().await {
                    Ok(health) if health.is_ok() => Ok(health),
                    Ok(health) => Err(backoff::Error::transient(GalleryError::Transport(format!(
                        "service reports status {:?}",
                        health.status
                    )))),
                    Err(e) if is_retryable(&e) => Err(backoff::Error::transient(e)),
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            },
            |err: GalleryError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Service not ready, retry scheduled"
                );
            },
        )
        .await?;

        info!("Image store service is healthy");
        Ok(health)
    }
}

/// Whether waiting and asking again could plausibly succeed.
pub fn is_retryable(error: &GalleryError) -> bool {
    match error {
        GalleryError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        GalleryError::Status { status, .. } => StatusCode::from_u16(*status)
            .map(is_transient_status)
            .unwrap_or(false),
        GalleryError::Transport(_) => true,
        _ => false,
    }
}

/// Check if an HTTP status code indicates a transient error.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}

#[async_trait]
impl ImageStore for HttpImageStore {
    #[instrument(level = "debug", skip(self))]
    async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let url = self.endpoint("api/images")?;
        let images: Vec<ImageRecord> = self.send_json("list", self.client.get(url)).await?;
        debug!(count = images.len(), "Fetched image snapshot");
        Ok(images)
    }

    #[instrument(level = "info", skip(self, file), fields(filename = %file.filename, bytes = file.bytes.len()))]
    async fn upload_image(&self, file: UploadFile) -> Result<ImageRecord> {
        let url = self.endpoint("api/upload")?;
        let part = Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(&file.content_type)?;
        let form = Form::new().part("file", part);

        let record: ImageRecord = self
            .send_json("upload", self.client.post(url).multipart(form))
            .await?;
        info!(id = %record.id, processing = record.is_processing(), "Image uploaded");
        Ok(record)
    }

    #[instrument(level = "debug", skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<ImageRecord>> {
        let url = self.endpoint("api/search")?;
        let hits: Vec<ImageRecord> = self
            .send_json("search", self.client.post(url).json(&SearchRequest { query }))
            .await?;
        debug!(count = hits.len(), "Search completed");
        Ok(hits)
    }

    async fn health(&self) -> Result<ServiceHealth> {
        let url = self.endpoint("api/health")?;
        self.send_json("health", self.client.get(url)).await
    }
}
