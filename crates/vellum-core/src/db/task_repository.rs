//! Scheduled task repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{ArticleId, Platform, ScheduledTask, TaskId, UserId};

/// Trait for scheduled task storage operations
pub trait TaskRepository {
    /// Persist the full current state of a task (insert or update)
    fn save(&self, task: &ScheduledTask) -> Result<()>;

    /// Get a task by ID
    fn get(&self, id: &TaskId) -> Result<Option<ScheduledTask>>;

    /// Tasks that are pending and due at `now`, earliest first
    fn find_due(&self, now: i64) -> Result<Vec<ScheduledTask>>;

    /// The pending/running task for an (article, platform) pair, if any
    fn find_active(&self, article_id: &ArticleId, platform: Platform)
        -> Result<Option<ScheduledTask>>;

    /// Pending tasks scheduled within `(now, now + horizon]`, earliest first
    fn find_upcoming(&self, now: i64, horizon: i64) -> Result<Vec<ScheduledTask>>;

    /// List tasks, most recently created first
    fn list(&self, limit: usize) -> Result<Vec<ScheduledTask>>;

    /// Delete the given tasks, returning how many rows were removed
    fn delete(&self, ids: &[TaskId]) -> Result<usize>;

    /// Delete every task in a terminal state (bulk history clear)
    fn clear_terminal(&self) -> Result<usize>;
}

/// `SQLite` implementation of `TaskRepository`
pub struct SqliteTaskRepository<'a> {
    conn: &'a Connection,
}

const COLUMNS: &str = "id, article_id, user_id, platform, config, scheduled_at, status,
    error_message, executed_at, result_url, retry_count, max_retries, notified,
    created_at, updated_at";

impl<'a> SqliteTaskRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a task from a database row
    fn parse_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduledTask> {
        let id: String = row.get("id")?;
        let article_id: String = row.get("article_id")?;
        let user_id: String = row.get("user_id")?;
        let platform: String = row.get("platform")?;
        let config: String = row.get("config")?;
        let status: String = row.get("status")?;
        Ok(ScheduledTask {
            id: id.parse().unwrap_or_default(),
            article_id: article_id.parse().unwrap_or_default(),
            user_id: UserId::from(user_id),
            platform: platform.parse().unwrap_or(Platform::Juejin),
            config: serde_json::from_str(&config).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            scheduled_at: row.get("scheduled_at")?,
            status: status.parse().unwrap_or(crate::models::TaskStatus::Failed),
            error_message: row.get("error_message")?,
            executed_at: row.get("executed_at")?,
            result_url: row.get("result_url")?,
            retry_count: row.get("retry_count")?,
            max_retries: row.get("max_retries")?,
            notified: row.get::<_, i32>("notified")? != 0,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn save(&self, task: &ScheduledTask) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO scheduled_tasks ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT(id) DO UPDATE SET
                    article_id = excluded.article_id,
                    user_id = excluded.user_id,
                    platform = excluded.platform,
                    config = excluded.config,
                    scheduled_at = excluded.scheduled_at,
                    status = excluded.status,
                    error_message = excluded.error_message,
                    executed_at = excluded.executed_at,
                    result_url = excluded.result_url,
                    retry_count = excluded.retry_count,
                    max_retries = excluded.max_retries,
                    notified = excluded.notified,
                    updated_at = excluded.updated_at"
            ),
            params![
                task.id.as_str(),
                task.article_id.as_str(),
                task.user_id.as_str(),
                task.platform.as_str(),
                serde_json::to_string(&task.config)?,
                task.scheduled_at,
                task.status.as_str(),
                task.error_message,
                task.executed_at,
                task.result_url,
                task.retry_count,
                task.max_retries,
                i32::from(task.notified),
                task.created_at,
                task.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &TaskId) -> Result<Option<ScheduledTask>> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM scheduled_tasks WHERE id = ?"),
                params![id.as_str()],
                Self::parse_task,
            )
            .optional()?;
        Ok(task)
    }

    fn find_due(&self, now: i64) -> Result<Vec<ScheduledTask>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM scheduled_tasks
             WHERE status = 'pending' AND scheduled_at <= ?
             ORDER BY scheduled_at ASC"
        ))?;

        let tasks = stmt
            .query_map(params![now], Self::parse_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tasks)
    }

    fn find_active(
        &self,
        article_id: &ArticleId,
        platform: Platform,
    ) -> Result<Option<ScheduledTask>> {
        let task = self
            .conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM scheduled_tasks
                     WHERE article_id = ? AND platform = ?
                       AND status IN ('pending', 'running')"
                ),
                params![article_id.as_str(), platform.as_str()],
                Self::parse_task,
            )
            .optional()?;
        Ok(task)
    }

    fn find_upcoming(&self, now: i64, horizon: i64) -> Result<Vec<ScheduledTask>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM scheduled_tasks
             WHERE status = 'pending' AND scheduled_at > ? AND scheduled_at <= ?
             ORDER BY scheduled_at ASC"
        ))?;

        let tasks = stmt
            .query_map(params![now, now + horizon], Self::parse_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tasks)
    }

    fn list(&self, limit: usize) -> Result<Vec<ScheduledTask>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM scheduled_tasks
             ORDER BY created_at DESC
             LIMIT ?"
        ))?;

        let tasks = stmt
            .query_map(params![limit as i64], Self::parse_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tasks)
    }

    fn delete(&self, ids: &[TaskId]) -> Result<usize> {
        let mut deleted = 0;
        for id in ids {
            deleted += self.conn.execute(
                "DELETE FROM scheduled_tasks WHERE id = ?",
                params![id.as_str()],
            )?;
        }
        Ok(deleted)
    }

    fn clear_terminal(&self) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM scheduled_tasks WHERE status IN ('success', 'failed', 'cancelled')",
            [],
        )?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{ArticleRepository, Database, SqliteArticleRepository};
    use crate::models::{Article, PlatformConfig, TaskStatus};

    fn setup() -> (Database, Article) {
        let db = Database::open_in_memory().unwrap();
        let article = Article::new(UserId::from("u1"), "Title", "Body");
        SqliteArticleRepository::new(db.connection())
            .insert(&article)
            .unwrap();
        (db, article)
    }

    fn task_at(article: &Article, at: i64) -> ScheduledTask {
        ScheduledTask::new(
            article.id,
            article.user_id.clone(),
            PlatformConfig::Juejin {
                tags: vec!["rust".into()],
                category: "backend".into(),
                summary: String::new(),
                source_type: crate::models::SourceType::Original,
            },
            at,
        )
    }

    #[test]
    fn test_save_and_get() {
        let (db, article) = setup();
        let repo = SqliteTaskRepository::new(db.connection());

        let task = task_at(&article, 500);
        repo.save(&task).unwrap();

        let fetched = repo.get(&task.id).unwrap().unwrap();
        assert_eq!(fetched, task);
    }

    #[test]
    fn test_save_rejects_second_active_task_for_pair() {
        let (db, article) = setup();
        let repo = SqliteTaskRepository::new(db.connection());

        let mut task = task_at(&article, 500);
        repo.save(&task).unwrap();

        // A distinct task for the same (article, platform) pair must not
        // displace the existing pending row
        let competing = task_at(&article, 900);
        assert!(repo.save(&competing).is_err());
        assert_eq!(repo.get(&task.id).unwrap().unwrap(), task);
        assert!(repo.get(&competing.id).unwrap().is_none());

        // Re-saving the same task is an update, not a collision
        task.status = TaskStatus::Running;
        repo.save(&task).unwrap();
        assert_eq!(
            repo.get(&task.id).unwrap().unwrap().status,
            TaskStatus::Running
        );

        // Once the first task is terminal a new pending task is legal
        task.status = TaskStatus::Success;
        repo.save(&task).unwrap();
        repo.save(&competing).unwrap();
        assert!(repo.get(&competing.id).unwrap().is_some());
    }

    #[test]
    fn test_find_due_orders_earliest_first() {
        let (db, article) = setup();
        let articles = SqliteArticleRepository::new(db.connection());
        let repo = SqliteTaskRepository::new(db.connection());

        let other = Article::new(UserId::from("u1"), "Other", "Body");
        articles.insert(&other).unwrap();

        let late = task_at(&article, 900);
        let early = task_at(&other, 100);
        let future = {
            let third = Article::new(UserId::from("u1"), "Third", "Body");
            articles.insert(&third).unwrap();
            task_at(&third, 5_000)
        };
        repo.save(&late).unwrap();
        repo.save(&early).unwrap();
        repo.save(&future).unwrap();

        let due = repo.find_due(1_000).unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].id, early.id);
        assert_eq!(due[1].id, late.id);
    }

    #[test]
    fn test_find_active_ignores_terminal() {
        let (db, article) = setup();
        let repo = SqliteTaskRepository::new(db.connection());

        let mut task = task_at(&article, 500);
        task.status = TaskStatus::Cancelled;
        repo.save(&task).unwrap();
        assert!(repo
            .find_active(&article.id, Platform::Juejin)
            .unwrap()
            .is_none());

        let pending = task_at(&article, 900);
        repo.save(&pending).unwrap();
        let active = repo
            .find_active(&article.id, Platform::Juejin)
            .unwrap()
            .unwrap();
        assert_eq!(active.id, pending.id);
        // Other platforms are unaffected
        assert!(repo
            .find_active(&article.id, Platform::Zhihu)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_find_upcoming_window() {
        let (db, article) = setup();
        let articles = SqliteArticleRepository::new(db.connection());
        let repo = SqliteTaskRepository::new(db.connection());

        let soon = task_at(&article, 1_500);
        repo.save(&soon).unwrap();

        let far_article = Article::new(UserId::from("u1"), "Far", "Body");
        articles.insert(&far_article).unwrap();
        let far = task_at(&far_article, 10_000);
        repo.save(&far).unwrap();

        let upcoming = repo.find_upcoming(1_000, 2_000).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, soon.id);
    }

    #[test]
    fn test_clear_terminal_keeps_pending() {
        let (db, article) = setup();
        let articles = SqliteArticleRepository::new(db.connection());
        let repo = SqliteTaskRepository::new(db.connection());

        let pending = task_at(&article, 500);
        repo.save(&pending).unwrap();

        let done_article = Article::new(UserId::from("u1"), "Done", "Body");
        articles.insert(&done_article).unwrap();
        let mut done = task_at(&done_article, 100);
        done.status = TaskStatus::Success;
        repo.save(&done).unwrap();

        assert_eq!(repo.clear_terminal().unwrap(), 1);
        assert!(repo.get(&pending.id).unwrap().is_some());
        assert!(repo.get(&done.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_by_ids() {
        let (db, article) = setup();
        let repo = SqliteTaskRepository::new(db.connection());

        let task = task_at(&article, 500);
        repo.save(&task).unwrap();

        assert_eq!(repo.delete(&[task.id]).unwrap(), 1);
        assert!(repo.get(&task.id).unwrap().is_none());
    }
}
