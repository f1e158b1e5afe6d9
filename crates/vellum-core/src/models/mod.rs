//! Data models for Vellum

mod article;
mod queue_item;
mod session;
mod task;

pub use article::{Article, ArticleId, PublishState, SourceType, SyncStatus};
pub use queue_item::{SyncAction, SyncQueueItem};
pub use session::PlatformSession;
pub use task::{Platform, PlatformConfig, ScheduledTask, TaskId, TaskStatus, UserId};

/// Current time as unix milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
