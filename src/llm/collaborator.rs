use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::configuration::types::{LlmConfig, LlmProvider};
use crate::error_handling::types::LlmError;
use crate::llm::client::HttpCollaborator;
use crate::llm::normalize::NormalizedResponse;

/// Conversation mode, which selects the system prompt sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationMode {
    Coaching,
    Roleplay,
    Sql,
    Analysis,
}

impl ConversationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationMode::Coaching => "coaching",
            ConversationMode::Roleplay => "roleplay",
            ConversationMode::Sql => "sql",
            ConversationMode::Analysis => "analysis",
        }
    }
}

/// Role-tagged message in the OpenAI chat shape (`system`, `user`, `assistant`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub mode: ConversationMode,
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Messages with the system prompt prepended, as sent on the wire.
    pub fn wire_messages(&self) -> Vec<ChatMessage> {
        let mut all = Vec::with_capacity(self.messages.len() + 1);
        all.push(ChatMessage::new("system", self.system_prompt.clone()));
        all.extend(self.messages.iter().cloned());
        all
    }
}

/// External chat model. Implementations return the reply text only; callers
/// normalize it through [`ask`].
#[async_trait]
pub trait ChatCollaborator: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;

    fn name(&self) -> &str;
}

/// Stand-in used when no provider is configured. Every call fails with
/// [`LlmError::NotConfigured`] so callers take their fallback path.
pub struct DisabledCollaborator;

#[async_trait]
impl ChatCollaborator for DisabledCollaborator {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
        Err(LlmError::NotConfigured)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Sends `request` and normalizes the reply.
pub async fn ask(
    collaborator: &dyn ChatCollaborator,
    request: &ChatRequest,
) -> Result<NormalizedResponse, LlmError> {
    let text = collaborator.complete(request).await?;
    Ok(NormalizedResponse::from_text(&text))
}

/// Picks the collaborator for `config`, degrading to [`DisabledCollaborator`]
/// when the provider is off or incompletely configured.
pub fn build_collaborator(config: &LlmConfig) -> Arc<dyn ChatCollaborator> {
    if config.provider == LlmProvider::Disabled {
        info!("LLM provider disabled, serving fallback content only");
        return Arc::new(DisabledCollaborator);
    }

    match HttpCollaborator::new(config) {
        Ok(client) => {
            info!("Using LLM provider {}", client.name());
            Arc::new(client)
        }
        Err(e) => {
            warn!("LLM provider unavailable ({}), serving fallback content only", e);
            Arc::new(DisabledCollaborator)
        }
    }
}
