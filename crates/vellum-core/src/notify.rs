//! Outcome and expiry notifications
//!
//! Delivery is best-effort: the scheduler records outcome state durably
//! first, then notifies; a failed delivery is logged, never retried through
//! the task machinery.

use async_trait::async_trait;

use crate::models::{Platform, ScheduledTask, TaskStatus, UserId};

/// A task scheduled in the probe window whose session looks expired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingTask {
    pub title: String,
    /// When the task is due (unix ms)
    pub scheduled_at: i64,
}

/// Sink for user-facing notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Report a terminal task outcome (success or failure), once per task
    async fn notify_outcome(&self, task: &ScheduledTask, article_title: &str);

    /// Warn that upcoming tasks for a (user, platform) pair will fail unless
    /// the user logs in again. Advisory only.
    async fn notify_session_expiry(
        &self,
        user_id: &UserId,
        platform: Platform,
        upcoming: &[UpcomingTask],
    );
}

/// Notifier that writes to the tracing log, the default sink
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_outcome(&self, task: &ScheduledTask, article_title: &str) {
        match task.status {
            TaskStatus::Success => tracing::info!(
                "Published '{}' to {}: {}",
                article_title,
                task.platform,
                task.result_url.as_deref().unwrap_or("(no url)")
            ),
            TaskStatus::Failed => tracing::warn!(
                "Publishing '{}' to {} failed: {}",
                article_title,
                task.platform,
                task.error_message.as_deref().unwrap_or("(no detail)")
            ),
            _ => tracing::debug!(
                "Outcome notification for non-terminal task {} ignored",
                task.id
            ),
        }
    }

    async fn notify_session_expiry(
        &self,
        user_id: &UserId,
        platform: Platform,
        upcoming: &[UpcomingTask],
    ) {
        let titles: Vec<&str> = upcoming.iter().map(|t| t.title.as_str()).collect();
        tracing::warn!(
            "{} upcoming publish task(s) on {} for {} need a fresh login: {}",
            upcoming.len(),
            platform,
            user_id,
            titles.join(", ")
        );
    }
}
