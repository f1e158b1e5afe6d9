//! Offline sync queue item model

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::now_ms;

/// What the queued mutation does on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Create,
    Update,
}

impl SyncAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

impl FromStr for SyncAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            other => Err(format!("unknown sync action: {other}")),
        }
    }
}

/// A pending local mutation waiting to be reconciled with the server.
///
/// At most one item exists per `entity_client_id`: a newer local save
/// overwrites the payload in place rather than appending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncQueueItem {
    /// Row id, assigned by the local store
    pub id: i64,
    /// Entity kind ("article")
    pub entity_type: String,
    /// Client-generated stable id of the entity
    pub entity_client_id: String,
    /// Server id, once known
    pub entity_id: Option<String>,
    pub action: SyncAction,
    /// Serialized entity snapshot to send
    pub payload: String,
    pub retry_count: u32,
    pub last_error: Option<String>,
    /// Earliest instant (unix ms) at which a drain may pick this item up
    pub next_attempt_at: i64,
    /// Enqueue timestamp (unix ms); drain order is oldest first
    pub created_at: i64,
}

impl SyncQueueItem {
    /// Build a fresh, immediately-eligible item for an article mutation
    #[must_use]
    pub fn article(entity_client_id: impl Into<String>, action: SyncAction, payload: String) -> Self {
        let now = now_ms();
        Self {
            id: 0,
            entity_type: "article".to_string(),
            entity_client_id: entity_client_id.into(),
            entity_id: None,
            action,
            payload,
            retry_count: 0,
            last_error: None,
            next_attempt_at: now,
            created_at: now,
        }
    }

    /// Whether the item may be drained at the given instant
    #[must_use]
    pub const fn is_eligible(&self, now: i64) -> bool {
        self.next_attempt_at <= now
    }
}
