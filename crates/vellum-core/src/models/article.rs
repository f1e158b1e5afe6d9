//! Article model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::now_ms;
use crate::sync::fingerprint;

/// A unique identifier for an article, using UUID v7 (time-sortable).
///
/// Generated on the client, so it is stable across offline creation and
/// later reconciliation; the server assigns its own id separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleId(Uuid);

impl ArticleId {
    /// Create a new unique article ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ArticleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArticleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Whether the article is original writing or a reprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    Original,
    Reprint,
}

impl SourceType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Reprint => "reprint",
        }
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(Self::Original),
            "reprint" => Ok(Self::Reprint),
            other => Err(format!("unknown source type: {other}")),
        }
    }
}

/// Publication lifecycle of an article, mirrored from its scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    #[default]
    Draft,
    Scheduled,
    Published,
}

impl PublishState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
        }
    }
}

impl FromStr for PublishState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "published" => Ok(Self::Published),
            other => Err(format!("unknown publish state: {other}")),
        }
    }
}

/// Client-side sync state of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Synced,
    Pending,
    Syncing,
    Conflict,
    Error,
}

impl SyncStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Conflict => "conflict",
            Self::Error => "error",
        }
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synced" => Ok(Self::Synced),
            "pending" => Ok(Self::Pending),
            "syncing" => Ok(Self::Syncing),
            "conflict" => Ok(Self::Conflict),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown sync status: {other}")),
        }
    }
}

/// An article in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Client-generated identifier (stable across offline creation)
    pub id: ArticleId,
    /// Server-assigned id, known after the first successful reconciliation
    pub server_id: Option<String>,
    /// Owning user
    pub user_id: super::UserId,
    pub title: String,
    pub content: String,
    /// Explicit tag list shown on published platforms
    pub tags: Vec<String>,
    pub summary: String,
    pub source_type: SourceType,

    // Publication mirror (kept consistent with the article's scheduled task)
    pub publish_state: PublishState,
    /// Display mirror of the pending task's scheduled time (unix ms)
    pub scheduled_at: Option<i64>,
    pub published_url: Option<String>,

    // Sync bookkeeping
    /// Monotonic counter, bumped on every local save
    pub local_version: i64,
    /// Last server version acknowledged for this article
    pub remote_version: i64,
    /// Fingerprint of the local content
    pub content_hash: String,
    /// Fingerprint last seen from the server
    pub remote_content_hash: Option<String>,
    pub sync_status: SyncStatus,
    pub has_conflict: bool,
    /// Snapshot of the divergent remote body, retained until resolved
    pub conflict_remote_content: Option<String>,
    pub last_sync_error: Option<String>,

    /// Creation timestamp (unix ms)
    pub created_at: i64,
    /// Last local save (unix ms)
    pub local_updated_at: i64,
    /// Last acknowledged server-side update (unix ms)
    pub server_updated_at: Option<i64>,
}

impl Article {
    /// Create a new local draft with the given title and content
    #[must_use]
    pub fn new(user_id: super::UserId, title: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let now = now_ms();
        Self {
            id: ArticleId::new(),
            server_id: None,
            user_id,
            title: title.into(),
            content_hash: fingerprint::content_hash(&content),
            content,
            tags: Vec::new(),
            summary: String::new(),
            source_type: SourceType::default(),
            publish_state: PublishState::Draft,
            scheduled_at: None,
            published_url: None,
            local_version: 1,
            remote_version: 0,
            remote_content_hash: None,
            sync_status: SyncStatus::Pending,
            has_conflict: false,
            conflict_remote_content: None,
            last_sync_error: None,
            created_at: now,
            local_updated_at: now,
            server_updated_at: None,
        }
    }

    /// Mark the article as scheduled for the given time (unix ms)
    pub fn mark_scheduled(&mut self, scheduled_at: i64) {
        self.publish_state = PublishState::Scheduled;
        self.scheduled_at = Some(scheduled_at);
    }

    /// Reset the scheduled state, e.g. after the pending task is cancelled
    pub fn reset_schedule(&mut self) {
        self.publish_state = PublishState::Draft;
        self.scheduled_at = None;
    }

    /// Record a successful publication
    pub fn mark_published(&mut self, url: impl Into<String>) {
        self.publish_state = PublishState::Published;
        self.scheduled_at = None;
        self.published_url = Some(url.into());
    }

    /// Whether the article's local content diverges from the last known
    /// remote fingerprint
    #[must_use]
    pub fn diverges_from(&self, remote_hash: &str) -> bool {
        self.content_hash != remote_hash
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::UserId;

    #[test]
    fn new_article_starts_as_pending_draft() {
        let article = Article::new(UserId::from("u1"), "Title", "Body");
        assert_eq!(article.publish_state, PublishState::Draft);
        assert_eq!(article.sync_status, SyncStatus::Pending);
        assert_eq!(article.local_version, 1);
        assert!(!article.content_hash.is_empty());
        assert!(article.server_id.is_none());
    }

    #[test]
    fn schedule_mirror_round_trip() {
        let mut article = Article::new(UserId::from("u1"), "Title", "Body");
        article.mark_scheduled(1_700_000_000_000);
        assert_eq!(article.publish_state, PublishState::Scheduled);
        assert_eq!(article.scheduled_at, Some(1_700_000_000_000));

        article.reset_schedule();
        assert_eq!(article.publish_state, PublishState::Draft);
        assert_eq!(article.scheduled_at, None);
    }

    #[test]
    fn mark_published_clears_schedule() {
        let mut article = Article::new(UserId::from("u1"), "Title", "Body");
        article.mark_scheduled(1_700_000_000_000);
        article.mark_published("https://example.com/p/1");
        assert_eq!(article.publish_state, PublishState::Published);
        assert_eq!(article.scheduled_at, None);
        assert_eq!(
            article.published_url.as_deref(),
            Some("https://example.com/p/1")
        );
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            SyncStatus::Synced,
            SyncStatus::Pending,
            SyncStatus::Syncing,
            SyncStatus::Conflict,
            SyncStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<SyncStatus>().unwrap(), status);
        }
    }
}
