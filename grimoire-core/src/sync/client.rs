//! HTTP client for the sync backend.
//!
//! The backend is an external collaborator speaking a three-endpoint REST
//! contract:
//!
//! - `GET  {base}/recipes?deviceId=...`: full remote collection
//! - `POST {base}/recipes/sync`: full local snapshot plus pending changes
//! - `GET  {base}/recipes/changes?deviceId=...&since=...`: records written
//!   since a timestamp
//!
//! Every response is wrapped in a `{success, data?, error?}` envelope.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::SyncError;
use crate::models::{PendingChange, Recipe};

/// Timeout for any single backend request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Response envelope used by all backend endpoints.
#[derive(Debug, Deserialize)]
struct SyncEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Vec<Recipe>>,
    #[serde(default)]
    error: Option<String>,
}

/// Push request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushRequest<'a> {
    device_id: &'a str,
    recipes: &'a [Recipe],
    timestamp: i64,
    changes: &'a [PendingChange],
}

/// Client for the sync backend REST contract.
#[derive(Clone, Debug)]
pub struct SyncClient {
    base_url: String,
    http: reqwest::Client,
}

impl SyncClient {
    /// Creates a client for the given base URL (e.g.
    /// `http://localhost:3001/api`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the full remote collection for this device.
    pub async fn fetch_recipes(&self, device_id: &str) -> Result<Vec<Recipe>, SyncError> {
        let url = format!("{}/recipes", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("deviceId", device_id)])
            .send()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;

        Ok(Self::read_envelope(response).await?.unwrap_or_default())
    }

    /// Pushes the full local snapshot and the pending-change list.
    pub async fn push_snapshot(
        &self,
        device_id: &str,
        recipes: &[Recipe],
        changes: &[PendingChange],
        timestamp: i64,
    ) -> Result<(), SyncError> {
        let url = format!("{}/recipes/sync", self.base_url);
        let body = PushRequest {
            device_id,
            recipes,
            timestamp,
            changes,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;

        Self::read_envelope(response).await?;
        Ok(())
    }

    /// Fetches records written since `since` (epoch ms) by other devices.
    pub async fn fetch_changes(
        &self,
        device_id: &str,
        since: i64,
    ) -> Result<Vec<Recipe>, SyncError> {
        let url = format!("{}/recipes/changes", self.base_url);
        let since = since.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[("deviceId", device_id), ("since", since.as_str())])
            .send()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;

        Ok(Self::read_envelope(response).await?.unwrap_or_default())
    }

    async fn read_envelope(
        response: reqwest::Response,
    ) -> Result<Option<Vec<Recipe>>, SyncError> {
        if !response.status().is_success() {
            return Err(SyncError::Status(response.status().as_u16()));
        }

        let envelope: SyncEnvelope = response
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;

        if !envelope.success {
            return Err(SyncError::Rejected(envelope.error.unwrap_or_default()));
        }

        Ok(envelope.data)
    }
}
