//! Cached platform session repository implementation

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{Platform, PlatformSession, UserId};

/// Trait for cached session storage operations
pub trait SessionRepository {
    /// Insert or refresh a cached session
    fn upsert(&self, session: &PlatformSession) -> Result<()>;

    /// Get the cached session for a (user, platform) pair
    fn get(&self, user_id: &UserId, platform: Platform) -> Result<Option<PlatformSession>>;
}

/// `SQLite` implementation of `SessionRepository`
pub struct SqliteSessionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSessionRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn upsert(&self, session: &PlatformSession) -> Result<()> {
        self.conn.execute(
            "INSERT INTO platform_sessions (user_id, platform, expires_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, platform) DO UPDATE SET
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at",
            params![
                session.user_id.as_str(),
                session.platform.as_str(),
                session.expires_at,
                session.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, user_id: &UserId, platform: Platform) -> Result<Option<PlatformSession>> {
        let session = self
            .conn
            .query_row(
                "SELECT user_id, platform, expires_at, updated_at
                 FROM platform_sessions
                 WHERE user_id = ? AND platform = ?",
                params![user_id.as_str(), platform.as_str()],
                |row| {
                    let user_id: String = row.get(0)?;
                    let platform: String = row.get(1)?;
                    Ok(PlatformSession {
                        user_id: UserId::from(user_id),
                        platform: platform.parse().unwrap_or(Platform::Juejin),
                        expires_at: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::Database;

    #[test]
    fn test_upsert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteSessionRepository::new(db.connection());

        let user = UserId::from("u1");
        let session = PlatformSession {
            user_id: user.clone(),
            platform: Platform::Juejin,
            expires_at: 5_000,
            updated_at: 1_000,
        };
        repo.upsert(&session).unwrap();
        assert_eq!(repo.get(&user, Platform::Juejin).unwrap().unwrap(), session);

        // Refresh extends the expiry in place
        let refreshed = PlatformSession {
            expires_at: 9_000,
            updated_at: 2_000,
            ..session
        };
        repo.upsert(&refreshed).unwrap();
        assert_eq!(
            repo.get(&user, Platform::Juejin).unwrap().unwrap(),
            refreshed
        );
        assert!(repo.get(&user, Platform::Zhihu).unwrap().is_none());
    }
}
