use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use log::{debug, error, info};

use crate::error_handling::types::StorageError;
use crate::session_management::active_session::ActiveSession;
use crate::session_management::session::Session;
use crate::storage::storage_trait::SessionStore;

/// Session store that keeps one pretty-printed JSON document per session id
/// under `<base_path>/sessions`.
///
/// Expiry follows the same rule as the in-memory store, based on the
/// `updated_at` recorded inside each document.
pub struct FileStorage {
    base_path: PathBuf,
    ttl: Duration,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(base_path: P, ttl: Duration) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        let sessions_dir = base_path.join("sessions");

        fs::create_dir_all(&sessions_dir).map_err(|e| {
            error!("Failed to create sessions dir {}: {}", sessions_dir.display(), e);
            StorageError::WriteFailed
        })?;
        info!("FileStorage initialized at {}", base_path.display());

        Ok(Self { base_path, ttl })
    }

    /// Construct FileStorage using env var PHARMACOACH_SESSION_DIR if set, otherwise current directory.
    pub fn new_default(ttl: Duration) -> Result<Self, StorageError> {
        if let Ok(dir) = std::env::var("PHARMACOACH_SESSION_DIR") {
            info!("Using FileStorage from PHARMACOACH_SESSION_DIR: {}", dir);
            return Self::new(PathBuf::from(dir), ttl);
        }
        let cwd = std::env::current_dir().map_err(|e| {
            error!("Failed to get current dir: {}", e);
            StorageError::ReadFailed
        })?;
        info!("Using FileStorage at current directory: {}", cwd.display());
        Self::new(cwd, ttl)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn sessions_dir(&self) -> PathBuf {
        self.base_path.join("sessions")
    }

    /// Session ids come from clients, so every byte outside `[A-Za-z0-9_-]`
    /// is hex-escaped to keep the mapping injective and path-safe.
    fn file_name_for(id: &str) -> String {
        let mut name = String::with_capacity(id.len());
        for byte in id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("~{:02x}", byte));
            }
        }
        format!("{}.json", name)
    }

    fn session_file_path(&self, id: &str) -> PathBuf {
        self.sessions_dir().join(Self::file_name_for(id))
    }

    fn read_entry(&self, path: &Path) -> Result<ActiveSession, StorageError> {
        let content = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read session file {}: {}", path.display(), e);
            StorageError::ReadFailed
        })?;
        serde_json::from_str(&content).map_err(|e| {
            error!("Invalid session file {}: {}", path.display(), e);
            StorageError::SerializationFailed(e.to_string())
        })
    }

    fn write_entry(&self, path: &Path, entry: &ActiveSession) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entry)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| {
            error!("Failed to write session file {}: {}", tmp.display(), e);
            StorageError::WriteFailed
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            error!("Failed to move {} into place: {}", tmp.display(), e);
            StorageError::WriteFailed
        })
    }

    fn session_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        let dir = self.sessions_dir();
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| {
            error!("Failed to read sessions dir {}: {}", dir.display(), e);
            StorageError::ReadFailed
        })? {
            let entry = entry.map_err(|e| {
                error!("Dir entry error: {}", e);
                StorageError::ReadFailed
            })?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl SessionStore for FileStorage {
    fn get_session(&self, id: &str) -> Result<Option<Session>, StorageError> {
        let path = self.session_file_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let entry = self.read_entry(&path)?;
        if entry.is_expired(self.ttl, Utc::now()) {
            let _ = fs::remove_file(&path);
            debug!("Session {} expired, removed {}", id, path.display());
            return Ok(None);
        }
        Ok(Some(entry.session))
    }

    fn set_session(&self, id: &str, session: &Session) -> Result<(), StorageError> {
        let path = self.session_file_path(id);
        let entry = match path.exists() {
            true => {
                let mut entry = self
                    .read_entry(&path)
                    .unwrap_or_else(|_| ActiveSession::new(session.clone()));
                entry.session = session.clone();
                entry.updated_at = Utc::now();
                entry
            }
            false => ActiveSession::new(session.clone()),
        };
        self.write_entry(&path, &entry)?;
        debug!("Saved session {} to {}", id, path.display());
        Ok(())
    }

    fn delete_session(&self, id: &str) -> Result<bool, StorageError> {
        let path = self.session_file_path(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| {
            error!("Failed to remove {}: {}", path.display(), e);
            StorageError::WriteFailed
        })?;
        Ok(true)
    }

    fn cleanup_expired(&self) -> Result<usize, StorageError> {
        let now = Utc::now();
        let mut removed = 0usize;
        for path in self.session_files()? {
            match self.read_entry(&path) {
                Ok(entry) if entry.is_expired(self.ttl, now) => {
                    let _ = fs::remove_file(&path);
                    removed += 1;
                }
                Ok(_) => {}
                Err(_) => debug!("Skipping unreadable session file {}", path.display()),
            }
        }
        info!("Removed {} expired session(s)", removed);
        Ok(removed)
    }

    fn session_count(&self) -> Result<usize, StorageError> {
        Ok(self.session_files()?.len())
    }
}
