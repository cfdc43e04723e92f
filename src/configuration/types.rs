use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("127.0.0.1"),
            port: 8787,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub storage: StorageBackend,
    /// Base directory for the file backend. Falls back to
    /// `PHARMACOACH_SESSION_DIR` and then the working directory.
    pub storage_path: Option<PathBuf>,
    /// Idle lifetime of a session. `0` keeps sessions for the process lifetime.
    pub ttl_secs: u64,
    /// Upper bound on stored sessions for the memory backend. `0` is unbounded.
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            storage_path: None,
            ttl_secs: 86_400,
            max_sessions: 1_000,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Openai,
    CloudflareWorker,
    Disabled,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Chat completions URL for OpenAI, or the worker URL. OpenAI has a default.
    pub endpoint: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Openai,
            endpoint: None,
            model: String::from("gpt-4o-mini"),
            api_key: None,
            timeout_secs: 12,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub enabled: bool,
    /// Analysis runs after a `respond` once the session holds this many messages.
    pub min_messages: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_messages: 4,
        }
    }
}
