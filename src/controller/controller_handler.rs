use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::configuration::config::Config;
use crate::configuration::types::StorageBackend;
use crate::error_handling::types::*;
use crate::llm::collaborator::build_collaborator;
use crate::session_management::session_manager::SessionManager;
use crate::storage::{FileStorage, MemoryStorage, SessionStore};
use crate::web_interface::WebServer;

/// How often expired sessions are swept from the store.
const CLEANUP_INTERVAL: StdDuration = StdDuration::from_secs(300);

/// Owns the configuration and the wired-up services.
pub struct Controller {
    pub config: Config,
    session_manager: Arc<SessionManager>,
    web_server: WebServer,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        debug!("Building controller");

        let store = build_store(&config)?;
        let collaborator = build_collaborator(&config.llm);
        info!("Chat collaborator: {}", collaborator.name());

        let session_manager = Arc::new(SessionManager::new(
            store,
            collaborator,
            config.analysis.clone(),
        ));
        let web_server = WebServer::new(session_manager.clone());

        Ok(Self {
            config,
            session_manager,
            web_server,
        })
    }

    pub fn session_manager(&self) -> Arc<SessionManager> {
        self.session_manager.clone()
    }

    /// Serves HTTP until the server stops or ctrl-c is received.
    pub async fn run(&mut self) -> Result<(), ControllerError> {
        let addr = self.config.socket_addr()?;

        let manager = self.session_manager.clone();
        let sweeper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match manager.cleanup_expired_sessions() {
                    Ok(0) => {}
                    Ok(n) => info!("Removed {} expired session(s)", n),
                    Err(e) => warn!("Session cleanup failed: {}", e),
                }
            }
        });

        let result = tokio::select! {
            served = self.web_server.start(addr) => served.map_err(|e| {
                error!("Web server stopped: {}", e);
                ControllerError::from(e)
            }),
            _ = tokio::signal::ctrl_c() => {
                info!("Received ctrl-c, shutting down");
                Ok(())
            }
        };

        sweeper.abort();
        result
    }
}

fn build_store(config: &Config) -> Result<Arc<dyn SessionStore>, ControllerError> {
    let ttl = config.session_ttl()?;

    match config.sessions.storage {
        StorageBackend::Memory => {
            info!(
                "Using in-memory session storage (ttl {}s, max {} sessions)",
                config.sessions.ttl_secs, config.sessions.max_sessions
            );
            Ok(Arc::new(MemoryStorage::new(ttl, config.sessions.max_sessions)))
        }
        StorageBackend::File => {
            let storage = match &config.sessions.storage_path {
                Some(path) => FileStorage::new(path, ttl),
                None => FileStorage::new_default(ttl),
            }
            .map_err(|e| {
                error!("Unable to prepare session directory: {}", e);
                ControllerError::StorageError(e)
            })?;
            info!("Using file session storage at {}", storage.base_path().display());
            Ok(Arc::new(storage))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_with_defaults_uses_memory_store() {
        let controller = Controller::new(Config::default()).unwrap();
        assert_eq!(
            controller.session_manager().get_active_session_count().unwrap(),
            0
        );
    }

    #[test]
    fn test_new_rejects_out_of_range_ttl() {
        let config = Config::from_toml_str("[sessions]\nttl_secs = 10000000000000000").unwrap();
        assert!(matches!(
            Controller::new(config),
            Err(ControllerError::ConfigurationError(ConfigError::NotInRange(_)))
        ));
    }

    #[tokio::test]
    async fn test_file_backend_writes_under_configured_path() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.sessions.storage = StorageBackend::File;
        config.sessions.storage_path = Some(dir.path().to_path_buf());

        let controller = Controller::new(config).unwrap();
        let manager = controller.session_manager();
        manager
            .start(
                "abc",
                crate::session_management::StartRequest {
                    scenario_id: Some("busy-primary-care".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(manager.get_active_session_count().unwrap(), 1);
        assert!(std::fs::read_dir(dir.path().join("sessions"))
            .unwrap()
            .next()
            .is_some());
    }
}
