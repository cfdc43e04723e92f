use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Keys probed, in order, when a structured reply carries its text in a field.
const TEXT_KEYS: [&str; 5] = ["reply", "response", "content", "message", "text"];

/// The single shape downstream code consumes from the model.
///
/// `raw_text` is always the reply as received (trimmed). `parsed_json` is
/// set when the reply is, or contains, a JSON object or array.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    pub parsed_json: Option<Value>,
    pub raw_text: String,
}

fn fenced_block() -> &'static Regex {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    FENCED.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("fenced block pattern is valid")
    })
}

fn parse_structured(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value @ Value::Object(_)) | Ok(value @ Value::Array(_)) => Some(value),
        _ => None,
    }
}

impl NormalizedResponse {
    pub fn from_text(text: &str) -> Self {
        let raw_text = text.trim().to_string();

        let parsed_json = parse_structured(&raw_text)
            .or_else(|| {
                fenced_block()
                    .captures_iter(&raw_text)
                    .filter_map(|c| c.get(1))
                    .find_map(|m| parse_structured(m.as_str()))
            })
            .or_else(|| {
                let start = raw_text.find('{')?;
                let end = raw_text.rfind('}')?;
                if end <= start {
                    return None;
                }
                parse_structured(&raw_text[start..=end])
            });

        Self {
            parsed_json,
            raw_text,
        }
    }

    /// String value of `key` in the parsed object, if any.
    pub fn string_field(&self, key: &str) -> Option<String> {
        self.parsed_json
            .as_ref()?
            .get(key)?
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Text meant for display: a known text field of the parsed object, or
    /// the raw reply when it is not bare JSON. `None` when nothing is left to
    /// show, such as `{"reply": ""}`.
    pub fn display_text(&self) -> Option<String> {
        if let Some(text) = TEXT_KEYS.iter().find_map(|key| self.string_field(key)) {
            return Some(text);
        }
        if self.raw_text.is_empty() || parse_structured(&self.raw_text).is_some() {
            return None;
        }
        Some(self.raw_text.clone())
    }
}
