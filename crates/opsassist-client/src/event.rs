//! Typed events carried by the agent stream.
//!
//! The set of shapes is closed: payloads with an unknown `type` tag or a
//! malformed body fail to decode, and callers drop them without aborting the
//! stream.

use serde::{Deserialize, Serialize};

/// Failure to decode one content payload into a typed event.
///
/// Non-fatal by contract: the stream continues and the payload is dropped.
#[derive(Debug, thiserror::Error)]
pub enum EventDecodeError {
    /// The payload was not valid JSON or did not match a recognized shape.
    #[error("malformed event payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload parsed but a field violated its bounds.
    #[error("event field out of range: {0}")]
    OutOfRange(String),
}

/// Turn lifecycle notification, emitted first on every stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<uuid::Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_turn: Option<u32>,
}

/// Classified user intent with the model's confidence.
///
/// Producers emit this report in two layouts: the fields flat next to the
/// event tag, or the whole report nested under an `intent` key. Both decode
/// to the same struct; serialization always writes the flat layout.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IntentReport {
    pub intent: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl<'de> Deserialize<'de> for IntentReport {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wire {
            intent: String,
            confidence: f64,
            #[serde(default)]
            reasoning: Option<String>,
            #[serde(default)]
            entities: Vec<String>,
            #[serde(default)]
            requested_action: Option<String>,
            #[serde(default)]
            raw_response: Option<String>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Nested { intent: Wire },
            Flat(Wire),
        }

        let wire = match Shape::deserialize(deserializer)? {
            Shape::Nested { intent } => intent,
            Shape::Flat(wire) => wire,
        };
        Ok(IntentReport {
            intent: wire.intent,
            confidence: wire.confidence,
            reasoning: wire.reasoning,
            entities: wire.entities,
            requested_action: wire.requested_action,
            raw_response: wire.raw_response,
        })
    }
}

/// One retrieved context snippet supporting the answer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default)]
    pub score: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Wholesale replacement of the retrieved context set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextsUpdate {
    #[serde(default)]
    pub contexts: Vec<ContextSnippet>,
}

/// Outcome reported by a tool invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub status: String,
    pub detail: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A tool action the agent executed during the turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolAction {
    pub tool: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
    pub result: ToolOutcome,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionUpdate {
    pub action: ToolAction,
}

/// Guardrail report attached to the final answer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardrailReport {
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub has_warnings: bool,
    #[serde(default)]
    pub info: serde_json::Value,
}

/// The authoritative final answer; carries the full text, not a delta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subqueries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardrails: Option<GuardrailReport>,
}

/// Producer-reported turn failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
}

/// The closed set of typed agent stream events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    Status(StatusUpdate),
    Intent(IntentReport),
    Contexts(ContextsUpdate),
    Action(ActionUpdate),
    Answer(AnswerPayload),
    Done,
    Error(ErrorReport),
}

impl AgentEvent {
    /// Parses one content payload into a typed event.
    ///
    /// Producers attach extra bookkeeping fields (for example `session_id`)
    /// to several event kinds; unknown fields are tolerated, unknown tags are
    /// not.
    pub fn decode(payload: &str) -> Result<Self, EventDecodeError> {
        let event: AgentEvent = serde_json::from_str(payload)?;
        if let AgentEvent::Intent(intent) = &event
            && !(0.0..=1.0).contains(&intent.confidence)
        {
            return Err(EventDecodeError::OutOfRange(format!(
                "intent confidence {} outside [0, 1]",
                intent.confidence
            )));
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_status_with_session_metadata() {
        let event = AgentEvent::decode(
            r#"{"type":"status","state":"processing","session_id":"8e43f1a6-45f8-4f4f-9d9b-7a4f62f4f001","conversation_turn":3}"#,
        )
        .expect("status");
        let AgentEvent::Status(status) = event else {
            panic!("expected status event");
        };
        assert_eq!(status.state, "processing");
        assert!(status.session_id.is_some());
        assert_eq!(status.conversation_turn, Some(3));
    }

    #[test]
    fn decodes_intent_and_enforces_confidence_bounds() {
        let event = AgentEvent::decode(
            r#"{"type":"intent","intent":"create_task","confidence":0.92,"entities":["task"]}"#,
        )
        .expect("intent");
        assert!(matches!(
            event,
            AgentEvent::Intent(IntentReport { ref intent, confidence, .. })
                if intent == "create_task" && confidence == 0.92
        ));

        let err = AgentEvent::decode(r#"{"type":"intent","intent":"x","confidence":1.2}"#)
            .expect_err("out of range");
        assert!(matches!(err, EventDecodeError::OutOfRange(_)));
    }

    #[test]
    fn decodes_intent_nested_under_intent_key() {
        let event = AgentEvent::decode(
            r#"{"type":"intent","intent":{"intent":"create_task","confidence":0.92,"reasoning":"","entities":["task"],"requested_action":null,"raw_response":null},"session_id":"8e43f1a6-45f8-4f4f-9d9b-7a4f62f4f001"}"#,
        )
        .expect("nested intent");
        let AgentEvent::Intent(report) = event else {
            panic!("expected intent event");
        };
        assert_eq!(report.intent, "create_task");
        assert_eq!(report.confidence, 0.92);
        assert_eq!(report.entities, vec!["task"]);

        let err = AgentEvent::decode(
            r#"{"type":"intent","intent":{"intent":"x","confidence":1.5}}"#,
        )
        .expect_err("out of range");
        assert!(matches!(err, EventDecodeError::OutOfRange(_)));
    }

    #[test]
    fn decodes_contexts_action_and_answer() {
        let contexts = AgentEvent::decode(
            r#"{"type":"contexts","contexts":[{"score":0.8,"text":"doc A","source":"runbook.md"}]}"#,
        )
        .expect("contexts");
        let AgentEvent::Contexts(update) = contexts else {
            panic!("expected contexts event");
        };
        assert_eq!(update.contexts.len(), 1);
        assert_eq!(update.contexts[0].text, "doc A");

        let action = AgentEvent::decode(
            r#"{"type":"action","action":{"tool":"create_task","arguments":{"title":"t"},"result":{"status":"success","detail":"created","data":{"id":12}}}}"#,
        )
        .expect("action");
        let AgentEvent::Action(update) = action else {
            panic!("expected action event");
        };
        assert_eq!(update.action.tool, "create_task");
        assert_eq!(update.action.result.status, "success");

        let answer = AgentEvent::decode(
            r#"{"type":"answer","text":"Created task #12","strategy":"informed","subqueries":["a"],"model":"gpt-4o","guardrails":{"warnings":[],"has_warnings":false,"info":{}}}"#,
        )
        .expect("answer");
        let AgentEvent::Answer(payload) = answer else {
            panic!("expected answer event");
        };
        assert_eq!(payload.text, "Created task #12");
        assert_eq!(payload.strategy.as_deref(), Some("informed"));
    }

    #[test]
    fn decodes_done_and_error() {
        assert!(matches!(
            AgentEvent::decode(r#"{"type":"done"}"#).expect("done"),
            AgentEvent::Done
        ));
        assert!(matches!(
            AgentEvent::decode(r#"{"type":"error","message":"Agent execution failed."}"#)
                .expect("error"),
            AgentEvent::Error(ErrorReport { ref message }) if message == "Agent execution failed."
        ));
    }

    #[test]
    fn unknown_tags_fail_closed() {
        assert!(AgentEvent::decode(r#"{"type":"heartbeat"}"#).is_err());
        assert!(AgentEvent::decode(r#"{"state":"processing"}"#).is_err());
        assert!(AgentEvent::decode("not json at all").is_err());
    }

    #[test]
    fn extra_bookkeeping_fields_are_tolerated() {
        let event = AgentEvent::decode(
            r#"{"type":"done","session_id":"8e43f1a6-45f8-4f4f-9d9b-7a4f62f4f001"}"#,
        )
        .expect("done with extras");
        assert!(matches!(event, AgentEvent::Done));
    }
}
