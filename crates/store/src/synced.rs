//! Synchronized cross-device store: a remote key-value service over HTTP.

use std::time::Duration;

use async_trait::async_trait;

use crate::backend::KeyValueBackend;
use crate::error::StoreError;

/// Remote KV client. Availability is probed per call by the facade, never
/// cached, so the service appearing or vanishing mid-session is tolerated.
pub struct SyncedStore {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for SyncedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncedStore").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl SyncedStore {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: String) -> Result<Self, StoreError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, base_url })
    }

    /// Whether the remote service currently answers.
    pub async fn probe(&self) -> bool {
        match self.client.get(format!("{}/v1/health", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl KeyValueBackend for SyncedStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let response =
            self.client.get(format!("{}/v1/kv/{key}", self.base_url)).send().await?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::RemoteStatus { code: status.as_u16(), body });
        }
        Ok(Some(body))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .put(format!("{}/v1/kv/{key}", self.base_url))
            .body(value.to_owned())
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        // 507 Insufficient Storage / 413 Payload Too Large are how the
        // remote signals capacity pressure.
        if matches!(status.as_u16(), 507 | 413) {
            return Err(StoreError::QuotaExceeded(body));
        }
        Err(StoreError::RemoteStatus { code: status.as_u16(), body })
    }
}
