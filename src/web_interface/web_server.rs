use log::info;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use warp::{Filter, Reply};

use super::routes::*;
use crate::error_handling::types::WebError;
use crate::session_management::session_manager::SessionManager;

/// HTTP front for the role-play, coaching and SQL features.
pub struct WebServer {
    session_manager: Arc<SessionManager>,
}

impl WebServer {
    pub fn new(session_manager: Arc<SessionManager>) -> Self {
        Self { session_manager }
    }

    /// Every route, with rejections rendered as JSON errors.
    pub fn routes(&self) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
        let manager = self.session_manager.clone();

        start_route(manager.clone())
            .or(respond_route(manager.clone()))
            .or(get_session_route(manager.clone()))
            .or(delete_session_route(manager.clone()))
            .or(end_route(manager.clone()))
            .or(list_scenarios_route())
            .or(chat_route(manager.clone()))
            .or(sql_route(manager.clone()))
            .or(health_route(manager))
            .recover(handle_rejection)
            .with(warp::log("pharmacoach::http"))
    }

    /// Serve until the process is stopped.
    pub async fn start(&self, addr: SocketAddr) -> Result<(), WebError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| WebError::BindFailed(format!("{}: {}", addr, e)))?;

        info!("Listening on http://{}", addr);
        warp::serve(self.routes()).incoming(listener).run().await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::AnalysisConfig;
    use crate::llm::collaborator::DisabledCollaborator;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_start_reports_address_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();
        let manager = SessionManager::new(
            Arc::new(MemoryStorage::unbounded()),
            Arc::new(DisabledCollaborator),
            AnalysisConfig::default(),
        );

        let result = WebServer::new(Arc::new(manager)).start(addr).await;
        assert!(matches!(result, Err(WebError::BindFailed(_))));
    }
}
