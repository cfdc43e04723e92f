//! Free-form coaching chat and natural-language to SQL translation.
//!
//! Both are thin wrappers over the collaborator that always produce an
//! answer: model output when available, marked demo content otherwise.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::llm::collaborator::{ask, ChatCollaborator, ChatMessage, ChatRequest, ConversationMode};
use crate::llm::fallback;
use crate::llm::prompts::system_prompt;

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Ai,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoachReply {
    pub reply: String,
    pub source: ReplySource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlTranslation {
    pub sql: String,
    pub explanation: String,
    pub source: ReplySource,
}

/// Keeps only `user` / `assistant` turns with content; clients cannot inject
/// their own system prompt.
fn sanitize(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    messages
        .iter()
        .filter(|m| m.role == "user" || m.role == "assistant")
        .filter(|m| !m.content.trim().is_empty())
        .cloned()
        .collect()
}

pub async fn coach_reply(collaborator: &dyn ChatCollaborator, messages: &[ChatMessage]) -> CoachReply {
    let messages = sanitize(messages);
    let request = ChatRequest {
        mode: ConversationMode::Coaching,
        system_prompt: system_prompt(ConversationMode::Coaching).to_string(),
        messages,
    };

    match ask(collaborator, &request)
        .await
        .map(|response| response.display_text())
    {
        Ok(Some(reply)) => CoachReply {
            reply,
            source: ReplySource::Ai,
        },
        Ok(None) => CoachReply {
            reply: fallback::coaching_reply(request.messages.len()),
            source: ReplySource::Demo,
        },
        Err(e) => {
            warn!("Coaching reply unavailable ({}), using demo tip", e);
            CoachReply {
                reply: fallback::coaching_reply(request.messages.len()),
                source: ReplySource::Demo,
            }
        }
    }
}

pub async fn translate_sql(collaborator: &dyn ChatCollaborator, question: &str) -> SqlTranslation {
    let request = ChatRequest {
        mode: ConversationMode::Sql,
        system_prompt: system_prompt(ConversationMode::Sql).to_string(),
        messages: vec![ChatMessage::new("user", question.trim())],
    };

    let demo = || {
        let (sql, explanation) = fallback::sql_translation(question);
        SqlTranslation {
            sql,
            explanation,
            source: ReplySource::Demo,
        }
    };

    match ask(collaborator, &request).await {
        Ok(response) => match response.string_field("sql") {
            Some(sql) => SqlTranslation {
                sql,
                explanation: response.string_field("explanation").unwrap_or_default(),
                source: ReplySource::Ai,
            },
            None => {
                warn!("SQL reply carried no `sql` field, using demo query");
                demo()
            }
        },
        Err(e) => {
            warn!("SQL translation unavailable ({}), using demo query", e);
            demo()
        }
    }
}
