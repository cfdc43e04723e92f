use serde::{Deserialize, Serialize};

use crate::llm::collaborator::ChatMessage;

/// Header carrying the client's session id, echoed on every role-play response.
pub const SESSION_HEADER: &str = "x-session-id";

/// Largest JSON body accepted by any route.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

/// API error payload
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct SqlBody {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
}
