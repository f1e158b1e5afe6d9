//! Database migrations

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Migration to version 1: articles, scheduled tasks, cached sessions
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );
        CREATE TABLE IF NOT EXISTS articles (
            id TEXT PRIMARY KEY,
            server_id TEXT,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            summary TEXT NOT NULL DEFAULT '',
            source_type TEXT NOT NULL DEFAULT 'original',
            publish_state TEXT NOT NULL DEFAULT 'draft',
            scheduled_at INTEGER,
            published_url TEXT,
            local_version INTEGER NOT NULL DEFAULT 1,
            remote_version INTEGER NOT NULL DEFAULT 0,
            content_hash TEXT NOT NULL,
            remote_content_hash TEXT,
            sync_status TEXT NOT NULL DEFAULT 'pending',
            has_conflict INTEGER NOT NULL DEFAULT 0,
            conflict_remote_content TEXT,
            last_sync_error TEXT,
            created_at INTEGER NOT NULL,
            local_updated_at INTEGER NOT NULL,
            server_updated_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_articles_updated ON articles(local_updated_at DESC);
        CREATE INDEX IF NOT EXISTS idx_articles_sync_status ON articles(sync_status);
        CREATE TABLE IF NOT EXISTS scheduled_tasks (
            id TEXT PRIMARY KEY,
            article_id TEXT NOT NULL REFERENCES articles(id),
            user_id TEXT NOT NULL,
            platform TEXT NOT NULL,
            config TEXT NOT NULL,
            scheduled_at INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            error_message TEXT,
            executed_at INTEGER,
            result_url TEXT,
            retry_count INTEGER NOT NULL DEFAULT 0,
            max_retries INTEGER NOT NULL DEFAULT 3,
            notified INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tasks_due ON scheduled_tasks(status, scheduled_at);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_active
            ON scheduled_tasks(article_id, platform)
            WHERE status IN ('pending', 'running');
        CREATE TABLE IF NOT EXISTS platform_sessions (
            user_id TEXT NOT NULL,
            platform TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, platform)
        );
        INSERT INTO schema_version (version) VALUES (1);
        COMMIT;",
    )?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: offline sync queue
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;
        CREATE TABLE IF NOT EXISTS sync_queue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_type TEXT NOT NULL,
            entity_client_id TEXT NOT NULL UNIQUE,
            entity_id TEXT,
            action TEXT NOT NULL,
            payload TEXT NOT NULL,
            retry_count INTEGER NOT NULL DEFAULT 0,
            last_error TEXT,
            next_attempt_at INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sync_queue_eligible
            ON sync_queue(next_attempt_at, created_at);
        INSERT INTO schema_version (version) VALUES (2);
        COMMIT;",
    )?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;

    fn setup() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_migrations() {
        let conn = setup();
        run(&conn).unwrap();

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = setup();
        run(&conn).unwrap();
        run(&conn).unwrap(); // Should not fail

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_active_task_index_enforces_uniqueness() {
        let conn = setup();
        run(&conn).unwrap();

        conn.execute(
            "INSERT INTO articles (id, user_id, title, content, content_hash, created_at, local_updated_at)
             VALUES ('a1', 'u1', 't', 'c', 'h', 0, 0)",
            [],
        )
        .unwrap();

        let insert = "INSERT INTO scheduled_tasks
            (id, article_id, user_id, platform, config, scheduled_at, status, created_at, updated_at)
            VALUES (?1, 'a1', 'u1', 'juejin', '{}', 0, ?2, 0, 0)";

        conn.execute(insert, rusqlite::params!["t1", "pending"])
            .unwrap();
        // Second pending task for the same (article, platform) must be rejected
        assert!(conn
            .execute(insert, rusqlite::params!["t2", "pending"])
            .is_err());
        // A terminal task for the pair is fine
        conn.execute(insert, rusqlite::params!["t3", "cancelled"])
            .unwrap();
    }
}
