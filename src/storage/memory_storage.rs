use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, Utc};
use log::{debug, error, info};

use crate::error_handling::types::StorageError;
use crate::session_management::active_session::ActiveSession;
use crate::session_management::session::Session;
use crate::storage::storage_trait::SessionStore;

/// Process-local session store.
///
/// Entries idle for longer than `ttl` are treated as absent and removed on the
/// next access. When a new id would exceed `max_sessions`, the entry updated
/// least recently is evicted first. A zero `ttl` or `max_sessions` disables
/// the corresponding limit.
pub struct MemoryStorage {
    sessions: Mutex<HashMap<String, ActiveSession>>,
    ttl: Duration,
    max_sessions: usize,
}

impl MemoryStorage {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        info!(
            "MemoryStorage initialized (ttl: {}s, max sessions: {})",
            ttl.num_seconds(),
            max_sessions
        );
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            max_sessions,
        }
    }

    /// Store without expiry or capacity limit.
    pub fn unbounded() -> Self {
        Self::new(Duration::zero(), 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, ActiveSession>>, StorageError> {
        self.sessions.lock().map_err(|e| {
            error!("Session map lock poisoned: {}", e);
            StorageError::ReadFailed
        })
    }

    fn purge_expired(&self, sessions: &mut HashMap<String, ActiveSession>) -> usize {
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(self.ttl, now));
        before - sessions.len()
    }

    fn evict_oldest(sessions: &mut HashMap<String, ActiveSession>) {
        let oldest = sessions
            .iter()
            .min_by_key(|(_, entry)| entry.updated_at)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            sessions.remove(&id);
            debug!("Evicted session {} to stay within capacity", id);
        }
    }
}

impl SessionStore for MemoryStorage {
    fn get_session(&self, id: &str) -> Result<Option<Session>, StorageError> {
        let mut sessions = self.lock()?;
        let expired = match sessions.get(id) {
            Some(entry) => entry.is_expired(self.ttl, Utc::now()),
            None => return Ok(None),
        };
        if expired {
            sessions.remove(id);
            debug!("Session {} expired", id);
            return Ok(None);
        }
        Ok(sessions.get(id).map(|entry| entry.session.clone()))
    }

    fn set_session(&self, id: &str, session: &Session) -> Result<(), StorageError> {
        let mut sessions = self.lock()?;
        self.purge_expired(&mut sessions);

        match sessions.get_mut(id) {
            Some(entry) => {
                entry.session = session.clone();
                entry.updated_at = Utc::now();
            }
            None => {
                if self.max_sessions > 0 && sessions.len() >= self.max_sessions {
                    Self::evict_oldest(&mut sessions);
                }
                sessions.insert(id.to_string(), ActiveSession::new(session.clone()));
            }
        }
        debug!("Stored session {} ({} message(s))", id, session.message_count());
        Ok(())
    }

    fn delete_session(&self, id: &str) -> Result<bool, StorageError> {
        let mut sessions = self.lock()?;
        Ok(sessions.remove(id).is_some())
    }

    fn cleanup_expired(&self) -> Result<usize, StorageError> {
        let mut sessions = self.lock()?;
        let removed = self.purge_expired(&mut sessions);
        if removed > 0 {
            info!("Removed {} expired session(s)", removed);
        }
        Ok(removed)
    }

    fn session_count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }
}
