//! Remote reconciliation contract
//!
//! The sync queue only ever sees an acknowledgement or an opaque failure;
//! every failure is retryable from the queue's point of view, so the error
//! carries a message and nothing else.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{SyncAction, SyncQueueItem};

const SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// Server acknowledgement of a reconciled mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAck {
    /// Server-assigned entity id
    pub server_id: String,
    /// Server version after applying the mutation
    pub version: i64,
    /// Server-side update timestamp (unix ms)
    pub server_updated_at: i64,
}

/// A failed reconciliation attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The remote store the queue reconciles against
#[async_trait]
pub trait SyncRemote: Send + Sync {
    /// Apply one queued mutation to the remote store
    async fn reconcile(&self, item: &SyncQueueItem) -> Result<RemoteAck, RemoteError>;
}

/// Remote adapter speaking JSON over HTTP
pub struct HttpRemote {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct SyncResponse {
    id: Option<String>,
    version: Option<i64>,
    updated_at: Option<i64>,
    error: Option<String>,
    message: Option<String>,
}

impl HttpRemote {
    /// Create a remote against the given base endpoint.
    ///
    /// The endpoint must include the scheme; a trailing slash is stripped.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RemoteError> {
        let endpoint = endpoint.into();
        let endpoint = endpoint.trim();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(RemoteError::new(
                "sync endpoint must include http:// or https://",
            ));
        }
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(SYNC_TIMEOUT)
                .build()
                .map_err(|e| RemoteError::new(e.to_string()))?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

fn error_text(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<SyncResponse>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[async_trait]
impl SyncRemote for HttpRemote {
    async fn reconcile(&self, item: &SyncQueueItem) -> Result<RemoteAck, RemoteError> {
        let payload: serde_json::Value = serde_json::from_str(&item.payload)
            .map_err(|e| RemoteError::new(format!("queued payload is not valid JSON: {e}")))?;

        let request = match item.action {
            SyncAction::Create => self
                .client
                .post(format!("{}/articles", self.endpoint))
                .json(&payload),
            SyncAction::Update => {
                // Prefer the server id once known; fall back to the stable
                // client id for entities created while offline.
                let id = item
                    .entity_id
                    .as_deref()
                    .unwrap_or(&item.entity_client_id);
                self.client
                    .put(format!("{}/articles/{id}", self.endpoint))
                    .json(&payload)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::new(format!("sync request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::new(error_text(status, &body)));
        }

        let body = response
            .json::<SyncResponse>()
            .await
            .map_err(|e| RemoteError::new(format!("invalid sync response: {e}")))?;

        match (body.id, body.version, body.updated_at) {
            (Some(server_id), Some(version), Some(server_updated_at)) => Ok(RemoteAck {
                server_id,
                version,
                server_updated_at,
            }),
            _ => Err(RemoteError::new(
                "sync response missing id, version or updated_at",
            )),
        }
    }
}
