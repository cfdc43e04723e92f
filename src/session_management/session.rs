use crate::analysis::ConversationAnalysis;
use crate::error_handling::types::SessionError;
use crate::session_management::HcpState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Author of a message in a role-play conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn assistant(content: impl Into<String>, metadata: Option<Value>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// Scenario details captured at start so later turns can rebuild the persona.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioBrief {
    pub title: String,
    pub description: String,
    pub context: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub hcp_state: Option<HcpState>,
    pub turn_number: u32,
    /// State fixed at start. `respond` never re-derives it.
    pub locked_state: Option<HcpState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioBrief>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ConversationAnalysis>,
}

/// One role-play conversation.
///
/// `Session::default()` is the empty shape returned for unknown session ids.
/// Messages can only be appended, and only once a scenario is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub active: bool,
    pub scenario_id: Option<String>,
    messages: Vec<Message>,
    pub metadata: SessionMetadata,
}

impl Session {
    /// Creates an active session whose first message is the scripted opening line.
    pub fn start(
        scenario_id: impl Into<String>,
        scenario: ScenarioBrief,
        state: HcpState,
        opening_line: &str,
    ) -> Self {
        let mut session = Self {
            active: true,
            scenario_id: Some(scenario_id.into()),
            messages: Vec::new(),
            metadata: SessionMetadata {
                hcp_state: Some(state),
                turn_number: 0,
                locked_state: Some(state),
                scenario: Some(scenario),
                analysis: None,
            },
        };
        session.messages.push(Message::assistant(
            opening_line,
            Some(json!({ "turn": 0, "source": "scripted" })),
        ));
        session
    }

    pub fn append_message(&mut self, message: Message) -> Result<(), SessionError> {
        if self.scenario_id.is_none() {
            return Err(SessionError::ScenarioNotSet);
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Concatenated content of every message sent by the rep.
    pub fn user_transcript(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> Session {
        Session::start("s-1", ScenarioBrief::default(), HcpState::Neutral, "Hello")
    }

    #[test]
    fn start_sets_locked_state_and_opening_message() {
        let session = started();
        assert!(session.active);
        assert_eq!(session.scenario_id.as_deref(), Some("s-1"));
        assert_eq!(session.metadata.hcp_state, Some(HcpState::Neutral));
        assert_eq!(session.metadata.locked_state, Some(HcpState::Neutral));
        assert_eq!(session.metadata.turn_number, 0);
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.messages()[0].role, Role::Assistant);
        assert_eq!(session.messages()[0].content, "Hello");
    }

    #[test]
    fn append_requires_scenario() {
        let mut empty = Session::default();
        let err = empty.append_message(Message::user("hi")).unwrap_err();
        assert!(matches!(err, SessionError::ScenarioNotSet));
        assert_eq!(empty.message_count(), 0);

        let mut session = started();
        session.append_message(Message::user("hi")).unwrap();
        assert_eq!(session.message_count(), 2);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let value = serde_json::to_value(started()).unwrap();
        assert_eq!(value["scenarioId"], "s-1");
        assert_eq!(value["metadata"]["hcpState"], "neutral");
        assert_eq!(value["metadata"]["turnNumber"], 0);
        assert_eq!(value["metadata"]["lockedState"], "neutral");
        assert_eq!(value["messages"][0]["role"], "assistant");
    }

    #[test]
    fn default_shape_is_empty() {
        let value = serde_json::to_value(Session::default()).unwrap();
        assert_eq!(value["active"], false);
        assert!(value["scenarioId"].is_null());
        assert_eq!(value["messages"].as_array().map(|m| m.len()), Some(0));
        assert!(value["metadata"]["hcpState"].is_null());
    }

    #[test]
    fn user_transcript_skips_assistant_turns() {
        let mut session = started();
        session.append_message(Message::user("first")).unwrap();
        session
            .append_message(Message::assistant("reply", None))
            .unwrap();
        session.append_message(Message::user("second")).unwrap();
        assert_eq!(session.user_transcript(), "first\nsecond");
    }
}
