//! LLM collaborator subsystem.
//!
//! Everything that talks to the external chat model lives here: the
//! [`ChatCollaborator`] seam, the reqwest-backed client for OpenAI and the
//! Cloudflare worker proxy, per-mode system prompts, the normalization step
//! that turns untrusted reply text into a [`NormalizedResponse`], and the
//! deterministic fallback content used when the model is unavailable.

pub mod client;
pub mod collaborator;
pub mod fallback;
pub mod normalize;
pub mod prompts;

pub use client::HttpCollaborator;
pub use collaborator::{
    ask, build_collaborator, ChatCollaborator, ChatMessage, ChatRequest, ConversationMode,
    DisabledCollaborator,
};
pub use normalize::NormalizedResponse;
