//! Sync queue repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{SyncAction, SyncQueueItem};

/// Trait for offline sync queue storage operations
pub trait SyncQueueRepository {
    /// Insert or collapse a queue item.
    ///
    /// If an item already exists for the same `entity_client_id`, its payload
    /// and action are replaced while `retry_count`, `next_attempt_at` and the
    /// original enqueue time are preserved, so rapid edits neither multiply
    /// queue entries nor reset backoff state.
    fn upsert(&self, item: &SyncQueueItem) -> Result<SyncQueueItem>;

    /// Get the queued item for an entity, if any
    fn get(&self, entity_client_id: &str) -> Result<Option<SyncQueueItem>>;

    /// Oldest-enqueued items eligible at `now`, up to `limit`
    fn due_batch(&self, now: i64, limit: usize) -> Result<Vec<SyncQueueItem>>;

    /// Record a failed attempt: bump retry bookkeeping and push the item
    /// past its backoff window
    fn record_failure(
        &self,
        entity_client_id: &str,
        error: &str,
        retry_count: u32,
        next_attempt_at: i64,
    ) -> Result<()>;

    /// Remove the queued item for an entity
    fn remove(&self, entity_client_id: &str) -> Result<()>;

    /// All queued items, oldest first
    fn list(&self) -> Result<Vec<SyncQueueItem>>;
}

/// `SQLite` implementation of `SyncQueueRepository`
pub struct SqliteSyncQueueRepository<'a> {
    conn: &'a Connection,
}

const COLUMNS: &str = "id, entity_type, entity_client_id, entity_id, action, payload,
    retry_count, last_error, next_attempt_at, created_at";

impl<'a> SqliteSyncQueueRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a queue item from a database row
    fn parse_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<SyncQueueItem> {
        let action: String = row.get("action")?;
        Ok(SyncQueueItem {
            id: row.get("id")?,
            entity_type: row.get("entity_type")?,
            entity_client_id: row.get("entity_client_id")?,
            entity_id: row.get("entity_id")?,
            action: action.parse().unwrap_or(SyncAction::Update),
            payload: row.get("payload")?,
            retry_count: row.get("retry_count")?,
            last_error: row.get("last_error")?,
            next_attempt_at: row.get("next_attempt_at")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl SyncQueueRepository for SqliteSyncQueueRepository<'_> {
    fn upsert(&self, item: &SyncQueueItem) -> Result<SyncQueueItem> {
        // Collapse: latest payload wins, backoff state survives
        self.conn.execute(
            "INSERT INTO sync_queue
                (entity_type, entity_client_id, entity_id, action, payload,
                 retry_count, last_error, next_attempt_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(entity_client_id) DO UPDATE SET
                entity_id = COALESCE(excluded.entity_id, sync_queue.entity_id),
                action = excluded.action,
                payload = excluded.payload",
            params![
                item.entity_type,
                item.entity_client_id,
                item.entity_id,
                item.action.as_str(),
                item.payload,
                item.retry_count,
                item.last_error,
                item.next_attempt_at,
                item.created_at,
            ],
        )?;

        self.get(&item.entity_client_id)?.ok_or_else(|| {
            crate::error::Error::InvalidInput("queue upsert did not persist".to_string())
        })
    }

    fn get(&self, entity_client_id: &str) -> Result<Option<SyncQueueItem>> {
        let item = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM sync_queue WHERE entity_client_id = ?"),
                params![entity_client_id],
                Self::parse_item,
            )
            .optional()?;
        Ok(item)
    }

    fn due_batch(&self, now: i64, limit: usize) -> Result<Vec<SyncQueueItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM sync_queue
             WHERE next_attempt_at <= ?
             ORDER BY created_at ASC
             LIMIT ?"
        ))?;

        let items = stmt
            .query_map(params![now, limit as i64], Self::parse_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(items)
    }

    fn record_failure(
        &self,
        entity_client_id: &str,
        error: &str,
        retry_count: u32,
        next_attempt_at: i64,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE sync_queue
             SET retry_count = ?2, last_error = ?3, next_attempt_at = ?4
             WHERE entity_client_id = ?1",
            params![entity_client_id, retry_count, error, next_attempt_at],
        )?;
        Ok(())
    }

    fn remove(&self, entity_client_id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM sync_queue WHERE entity_client_id = ?",
            params![entity_client_id],
        )?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<SyncQueueItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM sync_queue ORDER BY created_at ASC"
        ))?;

        let items = stmt
            .query_map([], Self::parse_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(items)
    }
}
