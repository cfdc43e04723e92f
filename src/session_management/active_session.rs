use crate::session_management::session::Session;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A stored session together with the bookkeeping storage backends need
/// for expiry and eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSession {
    /// The session record as returned to callers.
    pub session: Session,
    /// When the session was first written under its id.
    pub created_at: DateTime<Utc>,
    /// Last time the session was overwritten.
    pub updated_at: DateTime<Utc>,
}

impl ActiveSession {
    pub fn new(session: Session) -> Self {
        let now = Utc::now();
        Self {
            session,
            created_at: now,
            updated_at: now,
        }
    }

    /// A zero `ttl` never expires.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        ttl > Duration::zero() && now - self.updated_at >= ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_follows_last_update() {
        let mut entry = ActiveSession::new(Session::default());
        let now = Utc::now();
        entry.updated_at = now - Duration::seconds(120);

        assert!(entry.is_expired(Duration::seconds(60), now));
        assert!(!entry.is_expired(Duration::seconds(600), now));
        assert!(!entry.is_expired(Duration::zero(), now));
    }
}
