//! Scheduled publish task model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::now_ms;
use crate::error::{Error, Result};

/// A unique identifier for a scheduled task, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new unique task ID using UUID v7
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

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Owning user of an article or task.
///
/// Identity management is external; this is an opaque handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target publishing platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Juejin,
    Zhihu,
    Medium,
}

impl Platform {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Juejin => "juejin",
            Self::Zhihu => "zhihu",
            Self::Medium => "medium",
        }
    }

    /// All known platforms
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Juejin, Self::Zhihu, Self::Medium]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "juejin" => Ok(Self::Juejin),
            "zhihu" => Ok(Self::Zhihu),
            "medium" => Ok(Self::Medium),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Platform-specific publish options, validated against the target platform
/// at task creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum PlatformConfig {
    Juejin {
        tags: Vec<String>,
        category: String,
        summary: String,
        source_type: super::SourceType,
    },
    Zhihu {
        topics: Vec<String>,
        column: Option<String>,
    },
    Medium {
        tags: Vec<String>,
        /// Canonical source URL for reprints
        canonical_url: Option<String>,
    },
}

impl PlatformConfig {
    /// The platform this config belongs to
    #[must_use]
    pub const fn platform(&self) -> Platform {
        match self {
            Self::Juejin { .. } => Platform::Juejin,
            Self::Zhihu { .. } => Platform::Zhihu,
            Self::Medium { .. } => Platform::Medium,
        }
    }

    /// Tags carried by this config, if the platform has them
    #[must_use]
    pub fn tags(&self) -> &[String] {
        match self {
            Self::Juejin { tags, .. } | Self::Medium { tags, .. } => tags,
            Self::Zhihu { topics, .. } => topics,
        }
    }

    /// Summary text, if the platform has one
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        match self {
            Self::Juejin { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// Source type carried by this config, if the platform distinguishes one.
    /// Medium derives it from the presence of a canonical source URL.
    #[must_use]
    pub fn source_type(&self) -> Option<super::SourceType> {
        match self {
            Self::Juejin { source_type, .. } => Some(*source_type),
            Self::Medium { canonical_url, .. } => Some(if canonical_url.is_some() {
                super::SourceType::Reprint
            } else {
                super::SourceType::Original
            }),
            Self::Zhihu { .. } => None,
        }
    }

    /// Ensure this config targets the given platform
    pub fn ensure_platform(&self, platform: Platform) -> Result<()> {
        if self.platform() == platform {
            Ok(())
        } else {
            Err(Error::ConfigMismatch {
                expected: platform.as_str().to_string(),
                actual: self.platform().as_str().to_string(),
            })
        }
    }
}

/// Task lifecycle status.
///
/// Success, Failed and Cancelled are terminal: once reached, only the
/// `notified` flag may still change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl TaskStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further automatic transitions are allowed
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// Default ceiling on retryable-failure attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A durable record: publish this article to this platform at this time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub article_id: super::ArticleId,
    pub user_id: UserId,
    pub platform: Platform,
    pub config: PlatformConfig,
    /// When to publish (unix ms); pushed forward on retry
    pub scheduled_at: i64,
    pub status: TaskStatus,
    pub error_message: Option<String>,
    /// When execution last finished (unix ms)
    pub executed_at: Option<i64>,
    /// Artifact URL returned by the platform on success
    pub result_url: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Guards at-most-once outcome notification
    pub notified: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ScheduledTask {
    /// Create a new pending task
    #[must_use]
    pub fn new(
        article_id: super::ArticleId,
        user_id: UserId,
        config: PlatformConfig,
        scheduled_at: i64,
    ) -> Self {
        let now = now_ms();
        Self {
            id: TaskId::new(),
            article_id,
            user_id,
            platform: config.platform(),
            config,
            scheduled_at,
            status: TaskStatus::Pending,
            error_message: None,
            executed_at: None,
            result_url: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            notified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the retry budget is spent. Checked after the failed attempt's
    /// increment: a task whose count reaches the ceiling goes terminal.
    #[must_use]
    pub const fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    /// Whether the task is due at the given instant
    #[must_use]
    pub const fn is_due(&self, now: i64) -> bool {
        matches!(self.status, TaskStatus::Pending) && self.scheduled_at <= now
    }
}
