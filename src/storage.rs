//! Storage subsystem
//!
//! This module provides the session store abstraction and its backends.
//! Callers only see the [`SessionStore`] trait, so the in-memory default can be
//! swapped for the file-backed store (or a future external key-value store)
//! without touching the session manager.
//!
//! Components:
//! - `storage_trait`: the `SessionStore` trait defining a uniform API.
//! - `memory_storage`: process-local map with TTL expiry and a capacity bound.
//! - `file_storage`: one JSON document per session id on disk.

pub mod file_storage;
pub mod memory_storage;
pub mod storage_trait;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
pub use storage_trait::SessionStore;
