use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::extract_text;
use crate::error::{Result, TallyError};
use crate::models::{Message, Role};

pub const CHAT_FAILED_MESSAGE: &str = "Failed to send message. Please try again.";
pub const EMPTY_REPLY_TEXT: &str = "Sorry, I couldn't come up with a response.";

/// Route the chat session posts to, relative to the proxy base URL.
pub const CHAT_ROUTE: &str = "/api/chat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post(&self, request: &ChatRequest) -> Result<ChatReply>;
}

/// Posts chat turns to the local proxy route.
pub struct ProxyClient {
    http: reqwest::Client,
    url: String,
}

impl ProxyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: format!("{}{CHAT_ROUTE}", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ChatTransport for ProxyClient {
    async fn post(&self, request: &ChatRequest) -> Result<ChatReply> {
        log::debug!("POST {}", self.url);
        let response = self.http.post(&self.url).json(request).send().await?;
        let status = response.status();
        let reply: ChatReply = response.json().await.unwrap_or_default();

        if !status.is_success() || !reply.success {
            let reason = reply
                .error
                .unwrap_or_else(|| format!("proxy returned HTTP {}", status.as_u16()));
            return Err(TallyError::Agent(reason));
        }
        Ok(reply)
    }
}

/// Flatten prior turns into `User:` / `Assistant:` lines and append the new
/// user turn.
pub fn build_transcript(history: &[Message], new_message: &str) -> String {
    let mut transcript = String::new();
    for msg in history {
        transcript.push_str(msg.role.label());
        transcript.push_str(": ");
        transcript.push_str(&msg.content);
        transcript.push('\n');
    }
    transcript.push_str(Role::User.label());
    transcript.push_str(": ");
    transcript.push_str(new_message);
    transcript
}

/// Append-only message log. A turn only stays in the log if it round-tripped.
pub struct ChatSession<T> {
    transport: T,
    agent_id: String,
    messages: Vec<Message>,
    loading: bool,
    error: Option<String>,
    next_seq: u64,
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: T, agent_id: impl Into<String>) -> Self {
        Self {
            transport,
            agent_id: agent_id.into(),
            messages: Vec::new(),
            loading: false,
            error: None,
            next_seq: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.error = None;
    }

    /// Send one user turn. Returns the assistant reply, or `None` for blank
    /// input. On failure the user turn is rolled back out of the log.
    pub async fn send(&mut self, text: &str) -> Result<Option<&Message>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let transcript = build_transcript(&self.messages, text);
        let user_msg = self.message(Role::User, text);
        let user_id = user_msg.id.clone();
        self.messages.push(user_msg);

        self.loading = true;
        self.error = None;
        let request = ChatRequest {
            message: transcript,
            agent_id: Some(self.agent_id.clone()),
        };
        let outcome = self.transport.post(&request).await;
        self.loading = false;

        match outcome {
            Ok(reply) => {
                let content = extract_text(reply.response.as_ref(), reply.raw_response.as_deref())
                    .unwrap_or_else(|| EMPTY_REPLY_TEXT.to_string());
                let assistant = self.message(Role::Assistant, &content);
                self.messages.push(assistant);
                Ok(self.messages.last())
            }
            Err(e) => {
                log::warn!("chat send failed: {e}");
                self.messages.retain(|m| m.id != user_id);
                self.error = Some(CHAT_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    fn message(&mut self, role: Role, content: &str) -> Message {
        let created_at = Utc::now();
        self.next_seq += 1;
        Message {
            id: format!("{}-{}", created_at.timestamp_millis(), self.next_seq),
            role,
            content: content.to_string(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    /// Transport that records requests and replays canned outcomes.
    struct FakeTransport {
        outcomes: Mutex<Vec<Result<ChatReply>>>,
        requests: Arc<Mutex<Vec<ChatRequest>>>,
    }

    impl FakeTransport {
        fn new(outcomes: Vec<Result<ChatReply>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        async fn post(&self, request: &ChatRequest) -> Result<ChatReply> {
            self.requests.lock().unwrap().push(request.clone());
            self.outcomes.lock().unwrap().remove(0)
        }
    }

    fn ok_reply(response: Value) -> Result<ChatReply> {
        Ok(ChatReply {
            success: true,
            response: Some(response),
            raw_response: None,
            error: None,
        })
    }

    #[test]
    fn test_transcript_flattens_history() {
        let now = Utc::now();
        let history = vec![
            Message { id: "1".into(), role: Role::User, content: "hello".into(), created_at: now },
            Message { id: "2".into(), role: Role::Assistant, content: "hi there".into(), created_at: now },
        ];
        assert_eq!(
            build_transcript(&history, "how much did I spend?"),
            "User: hello\nAssistant: hi there\nUser: how much did I spend?"
        );
        assert_eq!(build_transcript(&[], "hi"), "User: hi");
    }

    #[tokio::test]
    async fn test_send_appends_both_turns() {
        let transport = FakeTransport::new(vec![ok_reply(json!("Hello!"))]);
        let requests = Arc::clone(&transport.requests);
        let mut session = ChatSession::new(transport, "bot");

        let reply = session.send("hi").await.unwrap().unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Hello!");
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[0].content, "hi");
        assert!(!session.is_loading());

        let sent = requests.lock().unwrap();
        assert_eq!(sent[0].message, "User: hi");
        assert_eq!(sent[0].agent_id.as_deref(), Some("bot"));
    }

    #[tokio::test]
    async fn test_second_turn_carries_transcript() {
        let transport = FakeTransport::new(vec![
            ok_reply(json!("first answer")),
            ok_reply(json!({"result": "second answer"})),
        ]);
        let requests = Arc::clone(&transport.requests);
        let mut session = ChatSession::new(transport, "bot");

        session.send("one").await.unwrap();
        let reply = session.send("two").await.unwrap().unwrap();
        assert_eq!(reply.content, "second answer");
        assert_eq!(
            requests.lock().unwrap()[1].message,
            "User: one\nAssistant: first answer\nUser: two"
        );
    }

    #[tokio::test]
    async fn test_network_error_rolls_back_user_turn() {
        let transport = FakeTransport::new(vec![Err(TallyError::Agent("connection refused".into()))]);
        let mut session = ChatSession::new(transport, "bot");

        assert!(session.send("hi").await.is_err());
        assert!(session.messages().is_empty());
        assert_eq!(session.error(), Some(CHAT_FAILED_MESSAGE));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_turns_and_one_banner() {
        let transport = FakeTransport::new(vec![
            ok_reply(json!("ok")),
            Err(TallyError::Agent("boom".into())),
            Err(TallyError::Agent("boom again".into())),
        ]);
        let mut session = ChatSession::new(transport, "bot");

        session.send("first").await.unwrap();
        assert!(session.send("second").await.is_err());
        assert!(session.send("third").await.is_err());
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.error(), Some(CHAT_FAILED_MESSAGE));

        session.dismiss_error();
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let transport = FakeTransport::new(vec![]);
        let requests = Arc::clone(&transport.requests);
        let mut session = ChatSession::new(transport, "bot");
        assert!(session.send("   ").await.unwrap().is_none());
        assert!(session.messages().is_empty());
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reply_text_fallbacks() {
        let transport = FakeTransport::new(vec![
            Ok(ChatReply {
                success: true,
                response: Some(json!({"unexpected": true})),
                raw_response: Some("raw text".into()),
                error: None,
            }),
            ok_reply(json!({"nothing": "useful"})),
        ]);
        let mut session = ChatSession::new(transport, "bot");
        assert_eq!(session.send("a").await.unwrap().unwrap().content, "raw text");
        assert_eq!(session.send("b").await.unwrap().unwrap().content, EMPTY_REPLY_TEXT);
    }

    #[tokio::test]
    async fn test_clear_resets_log() {
        let transport = FakeTransport::new(vec![ok_reply(json!("hey"))]);
        let mut session = ChatSession::new(transport, "bot");
        session.send("hi").await.unwrap();
        session.clear();
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_reply_wire_shape() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"success": false, "error": "agent down"}"#).unwrap();
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("agent down"));
        assert!(reply.response.is_none());
    }
}
