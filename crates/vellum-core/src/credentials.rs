//! Cached credential state
//!
//! The scheduler asks "is this user still logged in on this platform?"
//! before spending a publish attempt. The answer comes from locally cached
//! session expiries only — never a network probe — so a flaky connection is
//! never misread as an expired session.

use async_trait::async_trait;

use crate::models::{Platform, UserId};
use crate::services::DatabaseService;

/// Local-only login state lookup for a (user, platform) pair
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Whether the cached session is valid at the given instant
    async fn is_logged_in(&self, user_id: &UserId, platform: Platform, now: i64) -> bool;
}

/// Credential store backed by the local `platform_sessions` table
#[derive(Clone)]
pub struct CachedCredentialStore {
    db: DatabaseService,
}

impl CachedCredentialStore {
    #[must_use]
    pub const fn new(db: DatabaseService) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for CachedCredentialStore {
    async fn is_logged_in(&self, user_id: &UserId, platform: Platform, now: i64) -> bool {
        match self.db.get_session(user_id, platform).await {
            Ok(Some(session)) => session.is_valid(now),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Session lookup failed for {user_id}/{platform}: {e}");
                false
            }
        }
    }
}
