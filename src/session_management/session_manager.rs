use crate::analysis::{analyze_session, summarize_session, SessionSummary};
use crate::configuration::types::AnalysisConfig;
use crate::error_handling::types::SessionError;
use crate::llm::collaborator::{ask, ChatCollaborator, ChatMessage, ChatRequest, ConversationMode};
use crate::llm::fallback;
use crate::llm::prompts::roleplay_prompt;
use crate::scenarios;
use crate::session_management::opening_line::generate_turn0_dialogue;
use crate::session_management::session::{Message, Role, ScenarioBrief, Session};
use crate::session_management::state_deriver::derive_initial_state_from_scene;
use crate::session_management::HcpState;
use crate::storage::SessionStore;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Body of a `start` request. Every scenario field except the id is
/// optional and falls back to the built-in scenario registry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub scenario_id: Option<String>,
    pub scenario_title: Option<String>,
    pub scenario_description: Option<String>,
    pub scenario_tags: Option<Vec<String>>,
    pub scenario_context: Option<String>,
}

/// The structure related to role-play session management
///
/// Drives the `start` / `respond` transitions of a session and delegates
/// storage to a [`SessionStore`] and replies to a [`ChatCollaborator`].
///
/// # Fields Overview
///
/// - `store`: where sessions live between requests
/// - `collaborator`: the LLM playing the HCP and scoring the conversation
/// - `analysis`: when conversation analysis kicks in
/// - `locks`: one async mutex per session id, held for the whole of a
///   mutating call so same-id requests apply in order instead of overwriting
///   each other
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    collaborator: Arc<dyn ChatCollaborator>,
    analysis: AnalysisConfig,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        collaborator: Arc<dyn ChatCollaborator>,
        analysis: AnalysisConfig,
    ) -> Self {
        Self {
            store,
            collaborator,
            analysis,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn collaborator(&self) -> Arc<dyn ChatCollaborator> {
        self.collaborator.clone()
    }

    fn lock_for(&self, session_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Drop locks nobody is holding or waiting on.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Starts (or restarts) the session under `session_id`.
    ///
    /// Any previous session under the same id is replaced, history included.
    pub async fn start(
        &self,
        session_id: &str,
        request: StartRequest,
    ) -> Result<Session, SessionError> {
        let scenario_id = request
            .scenario_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SessionError::Validation("scenarioId is required".to_string()))?;

        let known = scenarios::find(&scenario_id);
        let tags: Option<Vec<String>> = request
            .scenario_tags
            .or_else(|| known.map(|s| s.challenges.iter().map(|c| c.to_string()).collect()));
        let scenario = ScenarioBrief {
            title: request
                .scenario_title
                .or_else(|| known.map(|s| s.title.to_string()))
                .unwrap_or_default(),
            description: request
                .scenario_description
                .or_else(|| known.map(|s| s.stakeholder.to_string()))
                .unwrap_or_default(),
            context: request
                .scenario_context
                .or_else(|| known.map(|s| s.context.to_string()))
                .unwrap_or_default(),
            tags: tags.clone().unwrap_or_default(),
        };

        let state = derive_initial_state_from_scene(&scenario.description, tags.as_deref());
        let opening = generate_turn0_dialogue(Some(state), &scenario.context);
        let session = Session::start(scenario_id.clone(), scenario, state, opening);

        let lock = self.lock_for(session_id);
        let _guard = lock.lock().await;
        self.store.set_session(session_id, &session)?;

        info!(
            "Started session {} on scenario {} (state: {})",
            session_id, scenario_id, state
        );
        Ok(session)
    }

    /// Appends the rep's message and the HCP's reply to an active session.
    ///
    /// Fails with [`SessionError::NoActiveSession`] on a store miss and never
    /// creates a session. A collaborator failure produces a marked fallback
    /// reply instead of an error.
    pub async fn respond(&self, session_id: &str, content: &str) -> Result<Session, SessionError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SessionError::Validation("content is required".to_string()));
        }

        let lock = self.lock_for(session_id);
        let _guard = lock.lock().await;

        let mut session = match self.store.get_session(session_id)? {
            Some(s) if s.active => s,
            _ => {
                debug!("respond on {} without an active session", session_id);
                return Err(SessionError::NoActiveSession);
            }
        };

        session.append_message(Message::user(content))?;

        let state = session.metadata.locked_state.unwrap_or(HcpState::Busy);
        let turn = session.metadata.turn_number + 1;
        let reply = self.hcp_reply(&session, state, turn).await;
        session.append_message(reply)?;
        session.metadata.turn_number = turn;

        if self.analysis.enabled && session.message_count() >= self.analysis.min_messages {
            let analysis = analyze_session(self.collaborator.as_ref(), &session).await;
            session.metadata.analysis = Some(analysis);
        }

        self.store.set_session(session_id, &session)?;
        debug!(
            "Session {} now at turn {} with {} message(s)",
            session_id,
            turn,
            session.message_count()
        );
        Ok(session)
    }

    async fn hcp_reply(&self, session: &Session, state: HcpState, turn: u32) -> Message {
        let scenario = session.metadata.scenario.clone().unwrap_or_default();
        let request = ChatRequest {
            mode: ConversationMode::Roleplay,
            system_prompt: roleplay_prompt(&scenario, state),
            messages: session
                .messages()
                .iter()
                .map(|m| match m.role {
                    Role::User => ChatMessage::new("user", m.content.clone()),
                    Role::Assistant => ChatMessage::new("assistant", m.content.clone()),
                })
                .collect(),
        };

        match ask(self.collaborator.as_ref(), &request)
            .await
            .map(|response| response.display_text())
        {
            Ok(Some(text)) => {
                Message::assistant(text, Some(json!({ "turn": turn, "source": "ai" })))
            }
            Ok(None) => {
                warn!("Empty role-play reply, using fallback line");
                Message::assistant(
                    fallback::roleplay_reply(state, turn),
                    Some(json!({ "turn": turn, "source": "fallback", "reason": "empty reply" })),
                )
            }
            Err(e) => {
                warn!("Role-play reply unavailable ({}), using fallback line", e);
                Message::assistant(
                    fallback::roleplay_reply(state, turn),
                    Some(json!({ "turn": turn, "source": "fallback", "reason": e.to_string() })),
                )
            }
        }
    }

    /// Current session for `session_id`, or the empty default shape.
    pub fn get(&self, session_id: &str) -> Result<Session, SessionError> {
        Ok(self.store.get_session(session_id)?.unwrap_or_default())
    }

    /// Summarizes the session without changing what is stored.
    pub async fn end(&self, session_id: &str) -> Result<SessionSummary, SessionError> {
        let session = match self.store.get_session(session_id)? {
            Some(s) if s.active => s,
            _ => return Err(SessionError::NoActiveSession),
        };
        info!("Summarizing session {}", session_id);
        Ok(summarize_session(self.collaborator.as_ref(), &session).await)
    }

    pub async fn reset(&self, session_id: &str) -> Result<bool, SessionError> {
        let lock = self.lock_for(session_id);
        let _guard = lock.lock().await;
        let removed = self.store.delete_session(session_id)?;
        if removed {
            info!("Cleared session {}", session_id);
        }
        Ok(removed)
    }

    pub fn get_active_session_count(&self) -> Result<usize, SessionError> {
        Ok(self.store.session_count()?)
    }

    pub fn cleanup_expired_sessions(&self) -> Result<usize, SessionError> {
        Ok(self.store.cleanup_expired()?)
    }
}
