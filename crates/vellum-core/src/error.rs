//! Error types for vellum-core

use thiserror::Error;

/// Result type alias using vellum-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vellum-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Article not found
    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    /// Task not found
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Scheduled time must be in the future
    #[error("Scheduled time must be in the future")]
    ScheduledTimeInPast,

    /// A pending or running task already exists for this article/platform
    #[error("A publish task for this article is already scheduled on {0}")]
    DuplicateTask(String),

    /// Operation only legal while the task is pending
    #[error("Task {0} is not pending (status: {1})")]
    TaskNotPending(String, String),

    /// Platform config does not match the target platform
    #[error("Config mismatch: task targets {expected} but config is for {actual}")]
    ConfigMismatch { expected: String, actual: String },

    /// No conflict recorded for the article
    #[error("Article {0} has no conflict to resolve")]
    NoConflict(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
