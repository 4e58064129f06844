//! Request body and per-turn behavior options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retrieval strategy the agent applies for the turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Single retrieval pass over the query as given.
    #[default]
    Direct,
    /// Decompose into subqueries before retrieval.
    Informed,
}

/// One prior message supplied as extra conversation history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// Creates a history message.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// JSON body for `POST /api/v1/agent/stream`.
///
/// Defaults mirror the backend schema: `max_chunks` is bounded to `1..=20`
/// and `score_threshold` to `[0, 1]`; the turn builder validates both before
/// the request is sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub query: String,
    pub max_chunks: u8,
    pub score_threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<uuid::Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<Vec<ChatMessage>>,
    pub strategy: Strategy,
}

impl TurnRequest {
    /// Creates a request with backend-default tuning values.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_chunks: 4,
            score_threshold: 0.35,
            llm_provider: None,
            llm_model: None,
            session_id: None,
            conversation: None,
            strategy: Strategy::default(),
        }
    }
}

/// Generic turn behavior options.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnOptions {
    /// Optional per-turn timeout enforced by the transport.
    pub timeout: Option<Duration>,
    /// Bounded event buffer size used by the streaming channel.
    pub stream_buffer_capacity: usize,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            stream_buffer_capacity: 128,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_match_backend_schema() {
        let request = TurnRequest::new("restart the ingest worker");
        let body = serde_json::to_value(&request).expect("serialize");
        assert_eq!(body.get("max_chunks").and_then(|v| v.as_u64()), Some(4));
        assert_eq!(
            body.get("score_threshold").and_then(|v| v.as_f64()),
            Some(0.35)
        );
        assert_eq!(body.get("strategy").and_then(|v| v.as_str()), Some("direct"));
        assert!(body.get("session_id").is_none());
        assert!(body.get("conversation").is_none());
    }

    #[test]
    fn optional_fields_serialize_when_set() {
        let mut request = TurnRequest::new("q");
        request.strategy = Strategy::Informed;
        request.session_id = Some(uuid::Uuid::new_v4());
        request.conversation = Some(vec![ChatMessage::new("user", "earlier question")]);
        let body = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            body.get("strategy").and_then(|v| v.as_str()),
            Some("informed")
        );
        assert!(body.get("session_id").is_some());
        assert_eq!(
            body.pointer("/conversation/0/role").and_then(|v| v.as_str()),
            Some("user")
        );
    }

    #[test]
    fn turn_options_default_buffer_capacity() {
        assert_eq!(TurnOptions::default().stream_buffer_capacity, 128);
    }
}
