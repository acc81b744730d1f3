//! HTTP client for the booth capture service.

use super::{CaptureBackend, CaptureMode};
use crate::config::BoothConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A booth command failure. Mode/filter failures are logged and
/// swallowed by the caller; capture failures feed the workflow's error
/// path. Nothing here is retried.
#[derive(Debug, Error)]
pub enum BoothError {
    #[error("booth request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("booth returned {0}")]
    Status(reqwest::StatusCode),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("capture produced no images")]
    NoImages,
}

/// Capture response body: which files the service just produced,
/// newest last (a burst lists all three, a GIF lists the one animation).
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureOutcome {
    pub status: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Service health snapshot (`GET /health`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoothHealth {
    pub status: String,
    pub mode: String,
    pub filter: String,
    #[serde(default)]
    pub event_mode: bool,
}

#[derive(Clone)]
pub struct BoothClient {
    http: reqwest::Client,
    base_url: String,
}

impl BoothClient {
    pub fn new(config: &BoothConfig) -> Self {
        // A GIF capture holds the camera for a few seconds before the
        // upload even starts; give the service room.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http,
            base_url: config.booth_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn set_mode(&self, mode: CaptureMode) -> Result<(), BoothError> {
        self.post_ack("/set_mode", &serde_json::json!({ "mode": mode.as_str() }))
            .await
    }

    pub async fn set_filter(&self, filter: &str) -> Result<(), BoothError> {
        self.post_ack("/set_filter", &serde_json::json!({ "filter": filter }))
            .await
    }

    /// Queue a print job for an uploaded photo. Completion is
    /// asynchronous on the spooler side and never confirmed here.
    pub async fn print(&self, image_url: &str) -> Result<(), BoothError> {
        self.post_ack("/print", &serde_json::json!({ "imageUrl": image_url }))
            .await
    }

    pub async fn health(&self) -> Result<BoothHealth, BoothError> {
        let resp = self.http.get(self.url("/health")).send().await?;
        if !resp.status().is_success() {
            return Err(BoothError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }

    async fn post_ack(&self, path: &str, body: &serde_json::Value) -> Result<(), BoothError> {
        let resp = self.http.post(self.url(path)).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(BoothError::Status(resp.status()));
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl CaptureBackend for BoothClient {
    /// Fire the capture sequence. Success needs a 2xx ack, a `success`
    /// status, and at least one produced image.
    async fn capture(&self) -> Result<CaptureOutcome, BoothError> {
        let resp = self.http.post(self.url("/capture")).send().await?;
        if !resp.status().is_success() {
            return Err(BoothError::Status(resp.status()));
        }
        let outcome: CaptureOutcome = resp.json().await?;
        if outcome.status != "success" {
            return Err(BoothError::CaptureFailed(outcome.status));
        }
        if outcome.images.is_empty() {
            return Err(BoothError::NoImages);
        }
        log::info!("[BOOTH] capture produced {} image(s)", outcome.images.len());
        Ok(outcome)
    }
}
