//! Shared database service wrapper used across clients.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    ArticleRepository, Database, SessionRepository, SqliteArticleRepository,
    SqliteSessionRepository, SqliteSyncQueueRepository, SqliteTaskRepository, SyncQueueRepository,
    TaskRepository,
};
use crate::models::{
    Article, ArticleId, Platform, PlatformSession, ScheduledTask, SyncQueueItem, TaskId, UserId,
};
use crate::Result;

/// Thread-safe service for DB and repository operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db = Database::open(db_path.into())?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            db: Arc::new(Mutex::new(Database::open_in_memory()?)),
        })
    }

    // --- Articles ---

    pub async fn insert_article(&self, article: &Article) -> Result<()> {
        let db = self.db.lock().await;
        SqliteArticleRepository::new(db.connection()).insert(article)
    }

    pub async fn save_article(&self, article: &Article) -> Result<()> {
        let db = self.db.lock().await;
        SqliteArticleRepository::new(db.connection()).save(article)
    }

    pub async fn get_article(&self, id: &ArticleId) -> Result<Option<Article>> {
        let db = self.db.lock().await;
        SqliteArticleRepository::new(db.connection()).get(id)
    }

    pub async fn list_articles(&self, limit: usize, offset: usize) -> Result<Vec<Article>> {
        let db = self.db.lock().await;
        SqliteArticleRepository::new(db.connection()).list(limit, offset)
    }

    // --- Scheduled tasks ---

    pub async fn save_task(&self, task: &ScheduledTask) -> Result<()> {
        let db = self.db.lock().await;
        SqliteTaskRepository::new(db.connection()).save(task)
    }

    pub async fn get_task(&self, id: &TaskId) -> Result<Option<ScheduledTask>> {
        let db = self.db.lock().await;
        SqliteTaskRepository::new(db.connection()).get(id)
    }

    pub async fn find_due_tasks(&self, now: i64) -> Result<Vec<ScheduledTask>> {
        let db = self.db.lock().await;
        SqliteTaskRepository::new(db.connection()).find_due(now)
    }

    pub async fn find_active_task(
        &self,
        article_id: &ArticleId,
        platform: Platform,
    ) -> Result<Option<ScheduledTask>> {
        let db = self.db.lock().await;
        SqliteTaskRepository::new(db.connection()).find_active(article_id, platform)
    }

    pub async fn find_upcoming_tasks(&self, now: i64, horizon: i64) -> Result<Vec<ScheduledTask>> {
        let db = self.db.lock().await;
        SqliteTaskRepository::new(db.connection()).find_upcoming(now, horizon)
    }

    pub async fn list_tasks(&self, limit: usize) -> Result<Vec<ScheduledTask>> {
        let db = self.db.lock().await;
        SqliteTaskRepository::new(db.connection()).list(limit)
    }

    pub async fn delete_tasks(&self, ids: &[TaskId]) -> Result<usize> {
        let db = self.db.lock().await;
        SqliteTaskRepository::new(db.connection()).delete(ids)
    }

    pub async fn clear_task_history(&self) -> Result<usize> {
        let db = self.db.lock().await;
        SqliteTaskRepository::new(db.connection()).clear_terminal()
    }

    // --- Sync queue ---

    pub async fn upsert_queue_item(&self, item: &SyncQueueItem) -> Result<SyncQueueItem> {
        let db = self.db.lock().await;
        SqliteSyncQueueRepository::new(db.connection()).upsert(item)
    }

    pub async fn get_queue_item(&self, entity_client_id: &str) -> Result<Option<SyncQueueItem>> {
        let db = self.db.lock().await;
        SqliteSyncQueueRepository::new(db.connection()).get(entity_client_id)
    }

    pub async fn due_queue_items(&self, now: i64, limit: usize) -> Result<Vec<SyncQueueItem>> {
        let db = self.db.lock().await;
        SqliteSyncQueueRepository::new(db.connection()).due_batch(now, limit)
    }

    pub async fn record_queue_failure(
        &self,
        entity_client_id: &str,
        error: &str,
        retry_count: u32,
        next_attempt_at: i64,
    ) -> Result<()> {
        let db = self.db.lock().await;
        SqliteSyncQueueRepository::new(db.connection()).record_failure(
            entity_client_id,
            error,
            retry_count,
            next_attempt_at,
        )
    }

    pub async fn remove_queue_item(&self, entity_client_id: &str) -> Result<()> {
        let db = self.db.lock().await;
        SqliteSyncQueueRepository::new(db.connection()).remove(entity_client_id)
    }

    pub async fn list_queue_items(&self) -> Result<Vec<SyncQueueItem>> {
        let db = self.db.lock().await;
        SqliteSyncQueueRepository::new(db.connection()).list()
    }

    // --- Cached sessions ---

    pub async fn upsert_session(&self, session: &PlatformSession) -> Result<()> {
        let db = self.db.lock().await;
        SqliteSessionRepository::new(db.connection()).upsert(session)
    }

    pub async fn get_session(
        &self,
        user_id: &UserId,
        platform: Platform,
    ) -> Result<Option<PlatformSession>> {
        let db = self.db.lock().await;
        SqliteSessionRepository::new(db.connection()).get(user_id, platform)
    }
}
