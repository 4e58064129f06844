//! In-progress view of one streamed turn and the reducer that maintains it.

use serde::{Deserialize, Serialize};

use crate::event::{
    AgentEvent, ContextSnippet, GuardrailReport, IntentReport, ToolAction,
};

/// Lifecycle state of one streamed turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    #[default]
    Idle,
    Processing,
    Complete,
    Error,
}

impl TurnStatus {
    /// Terminal states never revert to `Processing`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// Aggregate snapshot for one turn, owned by exactly one stream.
///
/// Mutated only through [`TurnSnapshot::apply`]. Each `answer` event carries
/// the full text so far, so `answer` is replaced, never appended; `intent`,
/// `contexts`, and `action` are likewise replaced wholesale per event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    pub status: TurnStatus,
    pub answer: String,
    pub contexts: Vec<ContextSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ToolAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardrails: Option<GuardrailReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subqueries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<uuid::Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_turn: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TurnSnapshot {
    /// Creates an empty snapshot at `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the snapshot.
    ///
    /// Total over every variant and never panics. Once `Error` is reached it
    /// is sticky: no later event, including a late `Answer` or `Done`, can
    /// downgrade it back to `Complete` or `Processing`.
    pub fn apply(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Status(status) => {
                if let Some(session_id) = status.session_id {
                    self.session_id = Some(session_id);
                }
                if let Some(turn) = status.conversation_turn {
                    self.conversation_turn = Some(turn);
                }
                if status.state == "processing" && !self.status.is_terminal() {
                    self.status = TurnStatus::Processing;
                }
            }
            AgentEvent::Intent(intent) => {
                self.intent = Some(intent);
            }
            AgentEvent::Contexts(update) => {
                self.contexts = update.contexts;
            }
            AgentEvent::Action(update) => {
                self.action = Some(update.action);
            }
            AgentEvent::Answer(answer) => {
                self.answer = answer.text;
                self.strategy = answer.strategy;
                self.subqueries = answer.subqueries;
                self.model = answer.model;
                self.guardrails = answer.guardrails;
                if self.status != TurnStatus::Error {
                    self.status = TurnStatus::Complete;
                }
            }
            AgentEvent::Error(report) => {
                self.status = TurnStatus::Error;
                self.error_message = Some(report.message);
            }
            AgentEvent::Done => {
                if self.status != TurnStatus::Error {
                    self.status = TurnStatus::Complete;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AnswerPayload, ContextsUpdate, ErrorReport, StatusUpdate};

    fn status_processing() -> AgentEvent {
        AgentEvent::Status(StatusUpdate {
            state: "processing".into(),
            session_id: None,
            conversation_turn: None,
        })
    }

    fn answer(text: &str) -> AgentEvent {
        AgentEvent::Answer(AnswerPayload {
            text: text.into(),
            strategy: Some("informed".into()),
            subqueries: Vec::new(),
            model: None,
            guardrails: None,
        })
    }

    #[test]
    fn full_turn_reaches_complete_with_all_fields() {
        let mut snapshot = TurnSnapshot::new();
        snapshot.apply(status_processing());
        assert_eq!(snapshot.status, TurnStatus::Processing);

        snapshot.apply(AgentEvent::Intent(IntentReport {
            intent: "create_task".into(),
            confidence: 0.92,
            reasoning: None,
            entities: Vec::new(),
            requested_action: None,
            raw_response: None,
        }));
        snapshot.apply(AgentEvent::Contexts(ContextsUpdate {
            contexts: vec![ContextSnippet {
                text: "doc A".into(),
                score: 0.8,
                ..Default::default()
            }],
        }));
        snapshot.apply(answer("Created task #12"));

        assert_eq!(snapshot.status, TurnStatus::Complete);
        assert_eq!(snapshot.answer, "Created task #12");
        assert_eq!(snapshot.strategy.as_deref(), Some("informed"));
        assert_eq!(snapshot.contexts.len(), 1);
        assert_eq!(
            snapshot.intent.as_ref().map(|i| i.intent.as_str()),
            Some("create_task")
        );
    }

    #[test]
    fn error_then_done_stays_error() {
        let mut snapshot = TurnSnapshot::new();
        snapshot.apply(AgentEvent::Error(ErrorReport { message: "x".into() }));
        snapshot.apply(AgentEvent::Done);
        assert_eq!(snapshot.status, TurnStatus::Error);
        assert_eq!(snapshot.error_message.as_deref(), Some("x"));
    }

    #[test]
    fn answer_then_done_stays_complete() {
        let mut snapshot = TurnSnapshot::new();
        snapshot.apply(answer("A"));
        snapshot.apply(AgentEvent::Done);
        assert_eq!(snapshot.status, TurnStatus::Complete);
        assert_eq!(snapshot.answer, "A");
    }

    #[test]
    fn late_answer_cannot_downgrade_an_error() {
        let mut snapshot = TurnSnapshot::new();
        snapshot.apply(AgentEvent::Error(ErrorReport {
            message: "boom".into(),
        }));
        snapshot.apply(answer("too late"));
        assert_eq!(snapshot.status, TurnStatus::Error);
        // the answer fields themselves still update; only status is sticky
        assert_eq!(snapshot.answer, "too late");
        assert_eq!(snapshot.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn processing_cannot_reopen_a_terminal_turn() {
        let mut snapshot = TurnSnapshot::new();
        snapshot.apply(answer("done"));
        snapshot.apply(status_processing());
        assert_eq!(snapshot.status, TurnStatus::Complete);
    }

    #[test]
    fn contexts_are_replaced_wholesale() {
        let mut snapshot = TurnSnapshot::new();
        snapshot.apply(AgentEvent::Contexts(ContextsUpdate {
            contexts: vec![
                ContextSnippet {
                    text: "first".into(),
                    ..Default::default()
                },
                ContextSnippet {
                    text: "second".into(),
                    ..Default::default()
                },
            ],
        }));
        snapshot.apply(AgentEvent::Contexts(ContextsUpdate {
            contexts: vec![ContextSnippet {
                text: "only".into(),
                ..Default::default()
            }],
        }));
        assert_eq!(snapshot.contexts.len(), 1);
        assert_eq!(snapshot.contexts[0].text, "only");
    }

    #[test]
    fn status_captures_session_metadata() {
        let mut snapshot = TurnSnapshot::new();
        let session_id = uuid::Uuid::new_v4();
        snapshot.apply(AgentEvent::Status(StatusUpdate {
            state: "processing".into(),
            session_id: Some(session_id),
            conversation_turn: Some(2),
        }));
        assert_eq!(snapshot.session_id, Some(session_id));
        assert_eq!(snapshot.conversation_turn, Some(2));
    }

    #[test]
    fn nested_intent_payload_reaches_the_snapshot() {
        let event = AgentEvent::decode(
            r#"{"type":"intent","intent":{"intent":"query_status","confidence":0.88,"reasoning":"","entities":[]},"session_id":"8e43f1a6-45f8-4f4f-9d9b-7a4f62f4f001"}"#,
        )
        .expect("nested intent");
        let mut snapshot = TurnSnapshot::new();
        snapshot.apply(event);
        let intent = snapshot.intent.expect("intent recorded");
        assert_eq!(intent.intent, "query_status");
        assert_eq!(intent.confidence, 0.88);
    }
}
