//! REST client for the photo store.

use super::feed::{self, FeedSubscription};
use crate::config::BoothConfig;
use crate::gallery::{Photo, GALLERY_CAP};
use thiserror::Error;

/// Snapshot or command failure against the store. Transport and parse
/// failures both land in `Fetch`; the caller keeps its previous state and
/// nothing is retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("store returned {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Clone)]
pub struct PhotoStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PhotoStore {
    pub fn new(config: &BoothConfig) -> Self {
        Self {
            // No client-wide timeout: the feed response stays open for
            // the life of the subscription.
            http: reqwest::Client::new(),
            base_url: config.store_url.trim_end_matches('/').to_string(),
            api_key: config.store_key.clone(),
        }
    }

    /// Fetch the most recent photos, newest first, capped at the gallery
    /// size. On failure the caller's state is untouched.
    pub async fn load_snapshot(&self) -> Result<Vec<Photo>, StoreError> {
        let url = format!(
            "{}/rest/v1/photos?select=id,url,filename,created_at&order=created_at.desc&limit={}",
            self.base_url, GALLERY_CAP
        );
        let resp = self.authed(self.http.get(&url)).send().await?;
        if !resp.status().is_success() {
            return Err(StoreError::Status(resp.status()));
        }
        let photos: Vec<Photo> = resp.json().await?;
        log::info!("[STORE] snapshot: {} photos", photos.len());
        Ok(photos)
    }

    /// Delete one photo row. The server is the real authority on whether
    /// this is allowed; the client-side admin gate is convenience only.
    pub async fn delete_photo(&self, id: &str) -> Result<(), StoreError> {
        let url = format!("{}/rest/v1/photos?id=eq.{}", self.base_url, id);
        let resp = self.authed(self.http.delete(&url)).send().await?;
        if !resp.status().is_success() {
            return Err(StoreError::Status(resp.status()));
        }
        log::info!("[STORE] deleted photo {}", id);
        Ok(())
    }

    /// Open the change feed and pump it into a typed channel. The
    /// returned subscription is the channel's disposer: drop it and the
    /// connection is released.
    pub fn subscribe(&self) -> FeedSubscription {
        feed::subscribe(self.clone())
    }

    /// The long-lived feed request; held open by the server and streamed
    /// as server-sent events.
    pub(super) fn feed_request(&self) -> reqwest::RequestBuilder {
        let url = format!("{}/realtime/v1/photos", self.base_url);
        self.authed(self.http.get(url)).header("Accept", "text/event-stream")
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }
}
