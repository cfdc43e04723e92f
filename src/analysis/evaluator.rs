use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::analysis::metrics::{analyze_conversation, heuristic_feedback};
use crate::analysis::{AnalysisSource, ConversationAnalysis, MetricScore};
use crate::llm::collaborator::{ask, ChatCollaborator, ChatMessage, ChatRequest, ConversationMode};
use crate::llm::normalize::NormalizedResponse;
use crate::llm::prompts::system_prompt;
use crate::session_management::session::{Role, Session};
use crate::session_management::HcpState;

/// One-off report computed by `end`. Nothing is written back to the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub scenario_id: Option<String>,
    pub turns: u32,
    pub hcp_state: Option<HcpState>,
    pub metrics: Vec<MetricScore>,
    pub overall_score: f32,
    pub feedback: String,
    pub source: AnalysisSource,
}

fn transcript_for_model(session: &Session) -> String {
    session
        .messages()
        .iter()
        .map(|m| match m.role {
            Role::User => format!("Rep: {}", m.content),
            Role::Assistant => format!("HCP: {}", m.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn score_from(value: &Value) -> Option<u8> {
    let n = value.as_f64().or_else(|| value.as_str()?.trim().parse().ok())?;
    if !n.is_finite() {
        return None;
    }
    Some(n.round().clamp(1.0, 5.0) as u8)
}

/// Builds an analysis from a model reply, filling any metric the model left
/// out from `heuristic`. Returns `None` when the reply has no usable scores.
pub fn analysis_from_response(
    response: &NormalizedResponse,
    heuristic: &ConversationAnalysis,
) -> Option<ConversationAnalysis> {
    let json = response.parsed_json.as_ref()?;
    let scores = json.get("scores").unwrap_or(json);

    let mut found_any = false;
    let metrics: Vec<MetricScore> = heuristic
        .metrics
        .iter()
        .map(|fallback| match scores.get(fallback.metric.as_str()).and_then(score_from) {
            Some(score) => {
                found_any = true;
                MetricScore {
                    metric: fallback.metric,
                    score,
                    matched: Vec::new(),
                }
            }
            None => fallback.clone(),
        })
        .collect();

    if !found_any {
        return None;
    }

    let feedback = response
        .string_field("feedback")
        .unwrap_or_else(|| heuristic_feedback(&metrics));
    Some(ConversationAnalysis::new(metrics, feedback, AnalysisSource::Ai))
}

/// Analyzes the rep's side of `session`, asking the model first and falling
/// back to the keyword heuristic on any collaborator failure.
pub async fn analyze_session(
    collaborator: &dyn ChatCollaborator,
    session: &Session,
) -> ConversationAnalysis {
    let heuristic = analyze_conversation(&session.user_transcript());

    let request = ChatRequest {
        mode: ConversationMode::Analysis,
        system_prompt: system_prompt(ConversationMode::Analysis).to_string(),
        messages: vec![ChatMessage::new("user", transcript_for_model(session))],
    };

    match ask(collaborator, &request).await {
        Ok(response) => match analysis_from_response(&response, &heuristic) {
            Some(analysis) => analysis,
            None => {
                debug!("Analysis reply had no usable scores, using heuristic");
                heuristic
            }
        },
        Err(e) => {
            warn!("Conversation analysis unavailable ({}), using heuristic", e);
            heuristic
        }
    }
}

pub async fn summarize_session(
    collaborator: &dyn ChatCollaborator,
    session: &Session,
) -> SessionSummary {
    let analysis = analyze_session(collaborator, session).await;
    SessionSummary {
        scenario_id: session.scenario_id.clone(),
        turns: session.metadata.turn_number,
        hcp_state: session.metadata.hcp_state,
        metrics: analysis.metrics,
        overall_score: analysis.overall_score,
        feedback: analysis.feedback,
        source: analysis.source,
    }
}
