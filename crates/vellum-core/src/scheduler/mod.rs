//! Publish scheduler
//!
//! Polls the task store for due publish jobs, executes them against the
//! platform publisher, and drives every task to a terminal state with
//! at-most-once outcome notification. One instance per store: two schedulers
//! polling the same database could both claim a task.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::SchedulerConfig;
use crate::credentials::CredentialStore;
use crate::error::Error;
use crate::models::{
    now_ms, ArticleId, Platform, PlatformConfig, ScheduledTask, TaskId, TaskStatus, UserId,
};
use crate::notify::{Notifier, UpcomingTask};
use crate::publish::Publisher;
use crate::services::DatabaseService;
use crate::Result;

/// The scheduler — owns the poll loop and the task lifecycle.
#[derive(Clone)]
pub struct Scheduler {
    db: DatabaseService,
    publisher: Arc<dyn Publisher>,
    notifier: Arc<dyn Notifier>,
    credentials: Arc<dyn CredentialStore>,
    config: SchedulerConfig,
    /// Cooperative tick guard: an overrunning tick makes the next one a no-op
    tick_in_flight: Arc<AtomicBool>,
}

/// Handles to the background loops spawned by [`Scheduler::start`]
pub struct SchedulerHandle {
    poll: JoinHandle<()>,
    probe: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop both loops. In-flight work is not interrupted mid-database-write;
    /// the loops simply stop being scheduled.
    pub fn stop(self) {
        self.poll.abort();
        self.probe.abort();
        tracing::info!("Scheduler stopped");
    }
}

impl Scheduler {
    pub fn new(
        db: DatabaseService,
        publisher: Arc<dyn Publisher>,
        notifier: Arc<dyn Notifier>,
        credentials: Arc<dyn CredentialStore>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            db,
            publisher,
            notifier,
            credentials,
            config,
            tick_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the poll and probe loops.
    pub fn start(&self) -> SchedulerHandle {
        tracing::info!(
            "Scheduler started (poll every {:?}, probe every {:?})",
            self.config.poll_interval,
            self.config.probe_interval
        );

        let poll = {
            let scheduler = self.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(scheduler.config.poll_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    if let Err(e) = scheduler.run_due_tasks(now_ms()).await {
                        tracing::error!("Poll tick failed: {e}");
                    }
                }
            })
        };

        let probe = {
            let scheduler = self.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(scheduler.config.probe_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    if let Err(e) = scheduler.probe_upcoming(now_ms()).await {
                        tracing::error!("Session probe failed: {e}");
                    }
                }
            })
        };

        SchedulerHandle { poll, probe }
    }

    /// Schedule a new publish task.
    ///
    /// Rejects unknown articles, non-future times, and duplicate active tasks
    /// for the same (article, platform) pair. On success the article is
    /// marked scheduled and mirrors the task's time for display.
    pub async fn create_task(
        &self,
        article_id: &ArticleId,
        config: PlatformConfig,
        scheduled_at: i64,
    ) -> Result<ScheduledTask> {
        let mut article = self
            .db
            .get_article(article_id)
            .await?
            .ok_or_else(|| Error::ArticleNotFound(article_id.to_string()))?;

        if scheduled_at <= now_ms() {
            return Err(Error::ScheduledTimeInPast);
        }

        let platform = config.platform();
        if self
            .db
            .find_active_task(article_id, platform)
            .await?
            .is_some()
        {
            return Err(Error::DuplicateTask(platform.as_str().to_string()));
        }

        let mut task = ScheduledTask::new(*article_id, article.user_id.clone(), config, scheduled_at);
        task.max_retries = self.config.default_max_retries;
        self.db.save_task(&task).await?;

        article.mark_scheduled(scheduled_at);
        self.db.save_article(&article).await?;

        tracing::info!(
            "Scheduled '{}' for {} at {}",
            article.title,
            platform,
            scheduled_at
        );
        Ok(task)
    }

    /// Cancel a pending task and reset the article's scheduled state.
    pub async fn cancel_task(&self, id: &TaskId) -> Result<ScheduledTask> {
        let mut task = self
            .db
            .get_task(id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        if task.status != TaskStatus::Pending {
            return Err(Error::TaskNotPending(
                id.to_string(),
                task.status.as_str().to_string(),
            ));
        }

        task.status = TaskStatus::Cancelled;
        task.updated_at = now_ms();
        self.db.save_task(&task).await?;

        if let Some(mut article) = self.db.get_article(&task.article_id).await? {
            article.reset_schedule();
            self.db.save_article(&article).await?;
        }

        Ok(task)
    }

    /// Move a pending task's time and/or replace its platform config.
    pub async fn update_task(
        &self,
        id: &TaskId,
        scheduled_at: Option<i64>,
        config: Option<PlatformConfig>,
    ) -> Result<ScheduledTask> {
        let mut task = self
            .db
            .get_task(id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        if task.status != TaskStatus::Pending {
            return Err(Error::TaskNotPending(
                id.to_string(),
                task.status.as_str().to_string(),
            ));
        }

        if let Some(at) = scheduled_at {
            if at <= now_ms() {
                return Err(Error::ScheduledTimeInPast);
            }
            task.scheduled_at = at;
        }
        if let Some(config) = config {
            config.ensure_platform(task.platform)?;
            task.config = config;
        }
        task.updated_at = now_ms();
        self.db.save_task(&task).await?;

        if let Some(mut article) = self.db.get_article(&task.article_id).await? {
            article.mark_scheduled(task.scheduled_at);
            self.db.save_article(&article).await?;
        }

        Ok(task)
    }

    /// List recent tasks, newest first.
    pub async fn list_tasks(&self, limit: usize) -> Result<Vec<ScheduledTask>> {
        self.db.list_tasks(limit).await
    }

    /// Get a single task.
    pub async fn get_task(&self, id: &TaskId) -> Result<Option<ScheduledTask>> {
        self.db.get_task(id).await
    }

    /// Remove every terminal task, returning how many were deleted.
    pub async fn clear_history(&self) -> Result<usize> {
        self.db.clear_task_history().await
    }

    /// One poll tick: claim and execute every due task, strictly in
    /// `scheduled_at` order. Returns how many tasks were executed.
    ///
    /// If a previous tick is still in flight the whole tick is skipped;
    /// nothing is queued.
    pub async fn run_due_tasks(&self, now: i64) -> Result<usize> {
        if self.tick_in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("Previous tick still running, skipping");
            return Ok(0);
        }

        let result = self.run_due_tasks_locked(now).await;
        self.tick_in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn run_due_tasks_locked(&self, now: i64) -> Result<usize> {
        let due = self.db.find_due_tasks(now).await?;
        let count = due.len();
        for task in due {
            // One publish round-trip at a time; a task fully settles before
            // the next is claimed.
            self.execute_task(task, now).await?;
        }
        Ok(count)
    }

    async fn execute_task(&self, mut task: ScheduledTask, now: i64) -> Result<()> {
        // Claim before executing, so the task is never picked up twice.
        task.status = TaskStatus::Running;
        task.updated_at = now;
        self.db.save_task(&task).await?;

        let Some(mut article) = self.db.get_article(&task.article_id).await? else {
            let message = format!("article {} no longer exists", task.article_id);
            return self.fail_task(task, &message, now, None).await;
        };

        // Cheap local precondition: an expired cached session reads as a
        // retryable failure, so a login refresh before the next attempt
        // rescues the task without burning a network call here.
        if !self
            .credentials
            .is_logged_in(&task.user_id, task.platform, now)
            .await
        {
            let message = format!("not logged in on {}", task.platform);
            return self.retry_or_fail(task, &message, now, Some(&article)).await;
        }

        // Re-apply the saved platform config onto the article so the
        // published metadata matches what this task was scheduled with,
        // regardless of edits made in the meantime.
        article.tags = task.config.tags().to_vec();
        if let Some(summary) = task.config.summary() {
            article.summary = summary.to_string();
        }
        if let Some(source_type) = task.config.source_type() {
            article.source_type = source_type;
        }
        self.db.save_article(&article).await?;

        match self.publisher.publish(&article, &task.config).await {
            Ok(receipt) => {
                task.status = TaskStatus::Success;
                task.result_url = Some(receipt.url.clone());
                task.executed_at = Some(now);
                task.error_message = None;
                task.updated_at = now;
                self.db.save_task(&task).await?;

                article.mark_published(receipt.url);
                self.db.save_article(&article).await?;

                self.notify_once(&mut task, &article.title).await
            }
            Err(e) if e.is_retryable() => {
                self.retry_or_fail(task, &e.message, now, Some(&article))
                    .await
            }
            Err(e) => self.fail_task(task, &e.message, now, Some(&article)).await,
        }
    }

    /// Transient failure: consume retry budget or go terminal.
    async fn retry_or_fail(
        &self,
        mut task: ScheduledTask,
        message: &str,
        now: i64,
        article: Option<&crate::models::Article>,
    ) -> Result<()> {
        task.retry_count += 1;
        if task.retries_exhausted() {
            return self.fail_task(task, message, now, article).await;
        }

        task.status = TaskStatus::Pending;
        task.scheduled_at = now + self.config.retry_delay_ms();
        task.error_message = Some(message.to_string());
        task.updated_at = now;
        self.db.save_task(&task).await?;
        tracing::warn!(
            "Publish attempt {}/{} for task {} failed, retrying at {}: {}",
            task.retry_count,
            task.max_retries,
            task.id,
            task.scheduled_at,
            message
        );
        Ok(())
    }

    /// Terminal failure: persist, reset the article's schedule, notify once.
    async fn fail_task(
        &self,
        mut task: ScheduledTask,
        message: &str,
        now: i64,
        article: Option<&crate::models::Article>,
    ) -> Result<()> {
        task.status = TaskStatus::Failed;
        task.error_message = Some(message.to_string());
        task.executed_at = Some(now);
        task.updated_at = now;
        self.db.save_task(&task).await?;
        tracing::warn!("Task {} failed: {}", task.id, message);

        let title = if let Some(article) = article {
            let mut article = article.clone();
            article.reset_schedule();
            self.db.save_article(&article).await?;
            article.title
        } else {
            String::new()
        };

        self.notify_once(&mut task, &title).await
    }

    async fn notify_once(&self, task: &mut ScheduledTask, article_title: &str) -> Result<()> {
        if task.notified {
            return Ok(());
        }
        self.notifier.notify_outcome(task, article_title).await;
        task.notified = true;
        self.db.save_task(task).await
    }

    /// Advisory sweep: warn about pending tasks inside the probe horizon
    /// whose cached platform session has already expired. One notification
    /// per (user, platform) group; task state is untouched. Returns the
    /// number of groups notified.
    pub async fn probe_upcoming(&self, now: i64) -> Result<usize> {
        let upcoming = self
            .db
            .find_upcoming_tasks(now, self.config.probe_horizon_ms())
            .await?;

        let mut groups: HashMap<(UserId, Platform), Vec<UpcomingTask>> = HashMap::new();
        for task in upcoming {
            let title = self
                .db
                .get_article(&task.article_id)
                .await?
                .map_or_else(String::new, |a| a.title);
            groups
                .entry((task.user_id.clone(), task.platform))
                .or_default()
                .push(UpcomingTask {
                    title,
                    scheduled_at: task.scheduled_at,
                });
        }

        let mut notified = 0;
        for ((user_id, platform), tasks) in groups {
            if self.credentials.is_logged_in(&user_id, platform, now).await {
                continue;
            }
            self.notifier
                .notify_session_expiry(&user_id, platform, &tasks)
                .await;
            notified += 1;
        }
        Ok(notified)
    }
}
