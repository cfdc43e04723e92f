use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use crate::configuration::types::{LlmConfig, LlmProvider};
use crate::error_handling::types::LlmError;
use crate::llm::collaborator::{ChatCollaborator, ChatMessage, ChatRequest};

pub const OPENAI_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Keys a worker proxy may use to carry the reply text.
const ENVELOPE_KEYS: [&str; 5] = ["reply", "response", "content", "message", "text"];

#[derive(Serialize)]
struct OpenAiRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct WorkerRequestBody<'a> {
    mode: &'a str,
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

/// reqwest-backed collaborator for OpenAI and the Cloudflare worker proxy.
///
/// Requests are bounded by the configured timeout; an elapsed timeout is
/// reported as [`LlmError::Timeout`].
pub struct HttpCollaborator {
    client: reqwest::Client,
    provider: LlmProvider,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl HttpCollaborator {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.as_deref().filter(|k| !k.trim().is_empty());

        let endpoint = match config.provider {
            LlmProvider::Openai => {
                if api_key.is_none() {
                    return Err(LlmError::NotConfigured);
                }
                config
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| OPENAI_CHAT_ENDPOINT.to_string())
            }
            LlmProvider::CloudflareWorker => {
                config.endpoint.clone().ok_or(LlmError::NotConfigured)?
            }
            LlmProvider::Disabled => return Err(LlmError::NotConfigured),
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|e| {
                    LlmError::InvalidResponse(format!("Invalid authorization header: {}", e))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            provider: config.provider.clone(),
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn body(&self, request: &ChatRequest) -> Result<Value, LlmError> {
        let body = match self.provider {
            LlmProvider::CloudflareWorker => serde_json::to_value(WorkerRequestBody {
                mode: request.mode.as_str(),
                model: &self.model,
                messages: request.wire_messages(),
                temperature: self.temperature,
            }),
            _ => serde_json::to_value(OpenAiRequestBody {
                model: &self.model,
                messages: request.wire_messages(),
                temperature: self.temperature,
            }),
        };
        body.map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

/// Pulls the reply text out of a provider response body.
///
/// OpenAI bodies carry it in `choices[0].message.content`; worker proxies use
/// one of a few top-level string fields. Anything else is returned as-is.
pub fn extract_content(body: &str) -> Result<String, LlmError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(LlmError::InvalidResponse("empty body".to_string()));
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return Ok(body.to_string()),
    };

    if let Some(content) = value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    {
        return Ok(content.to_string());
    }

    if let Some(text) = ENVELOPE_KEYS
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
    {
        return Ok(text.to_string());
    }

    if let Some(text) = value.as_str() {
        return Ok(text.to_string());
    }

    Ok(body.to_string())
}

#[async_trait]
impl ChatCollaborator for HttpCollaborator {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let body = self.body(request)?;
        debug!(
            "Sending {} request with {} message(s) to {}",
            request.mode.as_str(),
            request.messages.len(),
            self.endpoint
        );

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("LLM request failed with status {}", status);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: text.chars().take(500).collect(),
            });
        }

        extract_content(&text)
    }

    fn name(&self) -> &str {
        match self.provider {
            LlmProvider::Openai => "openai",
            LlmProvider::CloudflareWorker => "cloudflare_worker",
            LlmProvider::Disabled => "disabled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::collaborator::ConversationMode;

    fn openai_config() -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::Openai,
            api_key: Some("sk-test".into()),
            ..LlmConfig::default()
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            mode: ConversationMode::Roleplay,
            system_prompt: "You are Dr. Patel".into(),
            messages: vec![ChatMessage::new("user", "Hello doctor")],
        }
    }

    #[test]
    fn extract_openai_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Go on."}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "Go on.");
    }

    #[test]
    fn extract_worker_envelope() {
        assert_eq!(extract_content(r#"{"reply":"Two minutes."}"#).unwrap(), "Two minutes.");
        assert_eq!(extract_content(r#"{"response":"Fine."}"#).unwrap(), "Fine.");
        assert_eq!(extract_content(r#""quoted""#).unwrap(), "quoted");
    }

    #[test]
    fn extract_passes_through_unknown_shapes() {
        assert_eq!(extract_content("plain words").unwrap(), "plain words");
        assert_eq!(extract_content(r#"{"score": 3}"#).unwrap(), r#"{"score": 3}"#);
        assert!(matches!(extract_content("   "), Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn openai_requires_api_key() {
        let config = LlmConfig {
            api_key: None,
            ..openai_config()
        };
        assert!(matches!(HttpCollaborator::new(&config), Err(LlmError::NotConfigured)));
    }

    #[test]
    fn openai_body_shape() {
        let client = HttpCollaborator::new(&openai_config()).unwrap();
        assert_eq!(client.endpoint, OPENAI_CHAT_ENDPOINT);
        let body = client.body(&request()).unwrap();
        assert_eq!(body["model"], LlmConfig::default().model.as_str());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hello doctor");
        assert!(body.get("mode").is_none());
    }

    #[test]
    fn worker_body_carries_mode() {
        let config = LlmConfig {
            provider: LlmProvider::CloudflareWorker,
            endpoint: Some("https://coach.example.workers.dev/chat".into()),
            api_key: None,
            ..LlmConfig::default()
        };
        let client = HttpCollaborator::new(&config).unwrap();
        assert_eq!(client.name(), "cloudflare_worker");
        let body = client.body(&request()).unwrap();
        assert_eq!(body["mode"], "roleplay");
        assert_eq!(body["messages"].as_array().map(|m| m.len()), Some(2));
    }

    async fn local_endpoint() -> (tokio::net::TcpListener, String) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
        (listener, url)
    }

    fn config_for(endpoint: String) -> LlmConfig {
        LlmConfig {
            endpoint: Some(endpoint),
            timeout_secs: 1,
            ..openai_config()
        }
    }

    #[tokio::test]
    async fn complete_extracts_openai_reply() {
        use warp::Filter;

        let (listener, endpoint) = local_endpoint().await;
        let routes = warp::post()
            .and(warp::header::<String>("authorization"))
            .and(warp::body::json())
            .map(|auth: String, body: Value| {
                let turns = body["messages"].as_array().map(|m| m.len()).unwrap_or(0);
                warp::reply::json(&serde_json::json!({
                    "choices": [{ "message": { "role": "assistant",
                        "content": format!("{} with {} messages", auth, turns) } }]
                }))
            });
        tokio::spawn(warp::serve(routes).incoming(listener).run());

        let client = HttpCollaborator::new(&config_for(endpoint)).unwrap();
        let reply = client.complete(&request()).await.unwrap();
        assert_eq!(reply, "Bearer sk-test with 2 messages");
    }

    #[tokio::test]
    async fn complete_maps_error_status_to_api_error() {
        use warp::Filter;

        let (listener, endpoint) = local_endpoint().await;
        let routes = warp::any().map(|| {
            warp::reply::with_status("upstream exploded", warp::http::StatusCode::INTERNAL_SERVER_ERROR)
        });
        tokio::spawn(warp::serve(routes).incoming(listener).run());

        let client = HttpCollaborator::new(&config_for(endpoint)).unwrap();
        match client.complete(&request()).await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected an API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn complete_maps_slow_reply_to_timeout() {
        use warp::Filter;

        let (listener, endpoint) = local_endpoint().await;
        let routes = warp::any().and_then(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok::<_, warp::Rejection>("too late")
        });
        tokio::spawn(warp::serve(routes).incoming(listener).run());

        let client = HttpCollaborator::new(&config_for(endpoint)).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout), "got {:?}", err);
    }
}
