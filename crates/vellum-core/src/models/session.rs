//! Cached platform session state

use serde::{Deserialize, Serialize};

use super::{Platform, UserId};

/// Locally cached login state for a (user, platform) pair.
///
/// This is a cache of whatever the last interactive login left behind; the
/// scheduler consults it instead of probing the network, so a flaky
/// connection is never mistaken for an expired session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSession {
    pub user_id: UserId,
    pub platform: Platform,
    /// When the cached session expires (unix ms)
    pub expires_at: i64,
    /// When the cache entry was last refreshed (unix ms)
    pub updated_at: i64,
}

impl PlatformSession {
    /// Whether the cached session is still valid at the given instant
    #[must_use]
    pub const fn is_valid(&self, now: i64) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_is_strict() {
        let session = PlatformSession {
            user_id: UserId::from("u1"),
            platform: Platform::Juejin,
            expires_at: 1_000,
            updated_at: 0,
        };
        assert!(session.is_valid(999));
        assert!(!session.is_valid(1_000));
        assert!(!session.is_valid(1_001));
    }
}
