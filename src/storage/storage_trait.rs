//! Storage Trait
//!
//! This module defines the `SessionStore` trait, the interface every session
//! storage backend implements.
//!
//! Implementors of this trait are responsible for:
//! - Storing a session under a client-supplied id (total overwrite, no merge)
//! - Returning the stored session, or `None` on a miss
//! - Deleting sessions and purging expired ones
//!
//! All methods return a `Result` to handle potential storage errors.

use crate::error_handling::types::StorageError;
use crate::session_management::session::Session;

/// The `SessionStore` trait defines the interface for role-play session storage backends.
///
/// Stores perform no per-id locking of their own; ordering of concurrent
/// writes to one id is the caller's responsibility.
pub trait SessionStore: Send + Sync {
    /// Returns the session stored under `id`, or `None` if there is none or it expired.
    fn get_session(&self, id: &str) -> Result<Option<Session>, StorageError>;

    /// Replaces whatever is stored under `id` with `session`.
    fn set_session(&self, id: &str, session: &Session) -> Result<(), StorageError>;

    /// Removes the session under `id`. Returns whether something was removed.
    fn delete_session(&self, id: &str) -> Result<bool, StorageError>;

    /// Removes every expired session and returns how many were purged.
    fn cleanup_expired(&self) -> Result<usize, StorageError>;

    /// Number of sessions currently held, expired ones included until purged.
    fn session_count(&self) -> Result<usize, StorageError>;
}
