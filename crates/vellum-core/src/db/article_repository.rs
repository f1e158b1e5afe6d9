//! Article repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{Article, ArticleId, UserId};

/// Trait for article storage operations
pub trait ArticleRepository {
    /// Insert a new article
    fn insert(&self, article: &Article) -> Result<()>;

    /// Persist the full current state of an article
    fn save(&self, article: &Article) -> Result<()>;

    /// Get an article by ID
    fn get(&self, id: &ArticleId) -> Result<Option<Article>>;

    /// List articles, most recently edited first
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Article>>;
}

/// `SQLite` implementation of `ArticleRepository`
pub struct SqliteArticleRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteArticleRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse an article from a database row
    fn parse_article(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
        let id: String = row.get("id")?;
        let user_id: String = row.get("user_id")?;
        let tags: String = row.get("tags")?;
        let source_type: String = row.get("source_type")?;
        let publish_state: String = row.get("publish_state")?;
        let sync_status: String = row.get("sync_status")?;
        Ok(Article {
            id: id.parse().unwrap_or_default(),
            server_id: row.get("server_id")?,
            user_id: UserId::from(user_id),
            title: row.get("title")?,
            content: row.get("content")?,
            tags: serde_json::from_str(&tags).unwrap_or_default(),
            summary: row.get("summary")?,
            source_type: source_type.parse().unwrap_or_default(),
            publish_state: publish_state.parse().unwrap_or_default(),
            scheduled_at: row.get("scheduled_at")?,
            published_url: row.get("published_url")?,
            local_version: row.get("local_version")?,
            remote_version: row.get("remote_version")?,
            content_hash: row.get("content_hash")?,
            remote_content_hash: row.get("remote_content_hash")?,
            sync_status: sync_status.parse().unwrap_or_default(),
            has_conflict: row.get::<_, i32>("has_conflict")? != 0,
            conflict_remote_content: row.get("conflict_remote_content")?,
            last_sync_error: row.get("last_sync_error")?,
            created_at: row.get("created_at")?,
            local_updated_at: row.get("local_updated_at")?,
            server_updated_at: row.get("server_updated_at")?,
        })
    }

    fn write(&self, article: &Article, stmt: &str) -> Result<()> {
        self.conn.execute(
            stmt,
            params![
                article.id.as_str(),
                article.server_id,
                article.user_id.as_str(),
                article.title,
                article.content,
                serde_json::to_string(&article.tags)?,
                article.summary,
                article.source_type.as_str(),
                article.publish_state.as_str(),
                article.scheduled_at,
                article.published_url,
                article.local_version,
                article.remote_version,
                article.content_hash,
                article.remote_content_hash,
                article.sync_status.as_str(),
                i32::from(article.has_conflict),
                article.conflict_remote_content,
                article.last_sync_error,
                article.created_at,
                article.local_updated_at,
                article.server_updated_at,
            ],
        )?;
        Ok(())
    }
}

const COLUMNS: &str = "id, server_id, user_id, title, content, tags, summary, source_type,
    publish_state, scheduled_at, published_url, local_version, remote_version,
    content_hash, remote_content_hash, sync_status, has_conflict,
    conflict_remote_content, last_sync_error, created_at, local_updated_at,
    server_updated_at";

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn insert(&self, article: &Article) -> Result<()> {
        self.write(
            article,
            &format!(
                "INSERT INTO articles ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)"
            ),
        )
    }

    fn save(&self, article: &Article) -> Result<()> {
        self.write(
            article,
            &format!(
                "INSERT OR REPLACE INTO articles ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)"
            ),
        )
    }

    fn get(&self, id: &ArticleId) -> Result<Option<Article>> {
        let article = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM articles WHERE id = ?"),
                params![id.as_str()],
                Self::parse_article,
            )
            .optional()?;
        Ok(article)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Article>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM articles
             ORDER BY local_updated_at DESC
             LIMIT ? OFFSET ?"
        ))?;

        let articles = stmt
            .query_map(params![limit as i64, offset as i64], Self::parse_article)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::Database;
    use crate::models::{SyncStatus, UserId};

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn sample(title: &str) -> Article {
        Article::new(UserId::from("u1"), title, format!("{title} body"))
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup();
        let repo = SqliteArticleRepository::new(db.connection());

        let article = sample("Hello");
        repo.insert(&article).unwrap();

        let fetched = repo.get(&article.id).unwrap().unwrap();
        assert_eq!(fetched, article);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let db = setup();
        let repo = SqliteArticleRepository::new(db.connection());
        assert!(repo.get(&ArticleId::new()).unwrap().is_none());
    }

    #[test]
    fn test_save_round_trips_sync_fields() {
        let db = setup();
        let repo = SqliteArticleRepository::new(db.connection());

        let mut article = sample("Draft");
        repo.insert(&article).unwrap();

        article.local_version = 4;
        article.sync_status = SyncStatus::Conflict;
        article.has_conflict = true;
        article.conflict_remote_content = Some("remote body".to_string());
        article.remote_content_hash = Some("abc".to_string());
        article.server_id = Some("srv-9".to_string());
        repo.save(&article).unwrap();

        let fetched = repo.get(&article.id).unwrap().unwrap();
        assert_eq!(fetched, article);
    }

    #[test]
    fn test_list_orders_by_last_edit() {
        let db = setup();
        let repo = SqliteArticleRepository::new(db.connection());

        let mut first = sample("First");
        first.local_updated_at = 100;
        let mut second = sample("Second");
        second.local_updated_at = 200;
        repo.insert(&first).unwrap();
        repo.insert(&second).unwrap();

        let articles = repo.list(10, 0).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Second");
    }
}
