//! Storage layer for Vellum

mod article_repository;
mod connection;
mod migrations;
mod queue_repository;
mod session_repository;
mod task_repository;

pub use article_repository::{ArticleRepository, SqliteArticleRepository};
pub use connection::Database;
pub use queue_repository::{SqliteSyncQueueRepository, SyncQueueRepository};
pub use session_repository::{SessionRepository, SqliteSessionRepository};
pub use task_repository::{SqliteTaskRepository, TaskRepository};
