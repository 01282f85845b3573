//! Client for the external conversational agent.
//!
//! The agent is a black box: it takes `{ agent_id, message }` and answers with
//! a loosely-shaped object. The helpers at the bottom of this module dig a
//! JSON value or plain text out of whatever comes back.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TallyError};
use crate::settings::Settings;

/// Matches a fenced ```json block (or a bare ``` block) around a JSON object.
static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").expect("fenced JSON regex is valid")
});

#[derive(Debug, Clone, Serialize)]
pub struct AgentRequest<'a> {
    pub agent_id: &'a str,
    pub message: &'a str,
}

/// What the agent returned. Every field is optional; `response` may be an
/// object or a string carrying JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub raw_response: Option<String>,
}

#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn send(&self, agent_id: &str, message: &str) -> Result<AgentReply>;
}

pub struct HttpAgentClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAgentClient {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if settings.api_key().is_none() {
            log::warn!(
                "{} is not set; calling the agent without credentials",
                settings.api_key_env
            );
        }
        Self::new(
            &settings.agent_endpoint,
            settings.api_key(),
            settings.request_timeout(),
        )
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn send(&self, agent_id: &str, message: &str) -> Result<AgentReply> {
        log::debug!(
            "POST {} agent={agent_id} ({} chars)",
            self.endpoint,
            message.len()
        );
        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&AgentRequest { agent_id, message });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("agent returned {status}: {body}");
            return Err(TallyError::Agent(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let reply: AgentReply = response.json().await?;
        log::debug!("agent reply received");
        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Permissive extraction
// ---------------------------------------------------------------------------

/// Parse JSON out of free text: the whole string, a fenced block, or the
/// outermost `{ ... }` span. `None` when nothing parses.
pub fn parse_json_loose(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }
    if let Some(caps) = FENCED_JSON.captures(trimmed) {
        if let Ok(v) = serde_json::from_str::<Value>(&caps[1]) {
            return Some(v);
        }
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

/// JSON value carried by a reply: object `response`, then string `response`
/// parsed as JSON, then `raw_response` parsed as JSON.
pub fn extract_json(reply: &AgentReply) -> Option<Value> {
    match &reply.response {
        Some(Value::Object(map)) => return Some(Value::Object(map.clone())),
        Some(Value::String(s)) => {
            if let Some(v) = parse_json_loose(s) {
                return Some(v);
            }
        }
        _ => {}
    }
    reply.raw_response.as_deref().and_then(parse_json_loose)
}

/// Human-readable text of a reply: string `response`, then the first string
/// among `response.result`, `response.response`, `response.message`, then
/// `raw_response`.
pub fn extract_text(response: Option<&Value>, raw_response: Option<&str>) -> Option<String> {
    let from_response = match response {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(map)) => ["result", "response", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    };
    from_response
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            raw_response
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_loose_plain() {
        assert_eq!(parse_json_loose(r#"{"a": 1}"#), Some(json!({"a": 1})));
    }

    #[test]
    fn test_parse_json_loose_fenced() {
        let text = "Here you go:\n```json\n{\"result\": {\"tips\": []}}\n```\nThanks!";
        assert_eq!(parse_json_loose(text), Some(json!({"result": {"tips": []}})));
    }

    #[test]
    fn test_parse_json_loose_embedded_in_prose() {
        let text = "Sure! {\"result\": 1} Let me know.";
        assert_eq!(parse_json_loose(text), Some(json!({"result": 1})));
    }

    #[test]
    fn test_parse_json_loose_garbage() {
        assert_eq!(parse_json_loose("no json here"), None);
        assert_eq!(parse_json_loose(""), None);
        assert_eq!(parse_json_loose("} backwards {"), None);
    }

    #[test]
    fn test_extract_json_object_response() {
        let reply = AgentReply {
            response: Some(json!({"result": {"insights": "ok"}})),
            raw_response: None,
        };
        assert_eq!(extract_json(&reply).unwrap()["result"]["insights"], "ok");
    }

    #[test]
    fn test_extract_json_string_response() {
        let reply = AgentReply {
            response: Some(json!("{\"result\": {\"insights\": \"ok\"}}")),
            raw_response: None,
        };
        assert_eq!(extract_json(&reply).unwrap()["result"]["insights"], "ok");
    }

    #[test]
    fn test_extract_json_falls_back_to_raw() {
        let reply = AgentReply {
            response: Some(json!("not json")),
            raw_response: Some("```json\n{\"result\": {}}\n```".to_string()),
        };
        assert_eq!(extract_json(&reply), Some(json!({"result": {}})));
    }

    #[test]
    fn test_extract_json_nothing() {
        assert_eq!(extract_json(&AgentReply::default()), None);
    }

    #[test]
    fn test_extract_text_paths() {
        assert_eq!(extract_text(Some(&json!("hello")), None).as_deref(), Some("hello"));
        assert_eq!(
            extract_text(Some(&json!({"message": "from message"})), None).as_deref(),
            Some("from message")
        );
        assert_eq!(
            extract_text(Some(&json!({"result": "first", "message": "second"})), None).as_deref(),
            Some("first")
        );
        assert_eq!(
            extract_text(Some(&json!({"other": 1})), Some("raw")).as_deref(),
            Some("raw")
        );
        assert_eq!(extract_text(None, None), None);
        assert_eq!(extract_text(Some(&json!("  ")), None), None);
    }

    #[test]
    fn test_reply_deserializes_with_missing_fields() {
        let reply: AgentReply = serde_json::from_str(r#"{"status": "done"}"#).unwrap();
        assert_eq!(reply, AgentReply::default());
    }
}
