use std::sync::{Arc, Mutex};

use crate::assistant::AssistantInner;
use crate::turn::{AbortHandle, TurnBuilder};

/// Configuration used to open a `Conversation`.
#[derive(Clone, Debug, Default)]
pub struct ConversationConfig {
    /// Human-readable name (useful for logs).
    pub name: String,
    /// Backend conversation session to resume, when known.
    ///
    /// Left empty, the backend creates a session on the first turn and
    /// reports its id through a `status` event.
    pub session_id: Option<uuid::Uuid>,
}

impl ConversationConfig {
    /// Creates a named conversation config.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            session_id: None,
        }
    }

    /// Creates a config that resumes an existing backend session.
    pub fn resume(name: impl Into<String>, session_id: uuid::Uuid) -> Self {
        Self {
            name: name.into(),
            session_id: Some(session_id),
        }
    }
}

/// Logical grouping for turns against one backend conversation session.
///
/// At most one turn per conversation is in flight: starting a new turn
/// aborts the previous one (last writer wins). Each turn still owns its own
/// snapshot; aborting never mutates the old turn's state.
#[derive(Clone)]
pub struct Conversation {
    pub(crate) inner: Arc<AssistantInner>,
    pub(crate) config: ConversationConfig,
    pub(crate) in_flight: Arc<Mutex<Option<AbortHandle>>>,
}

impl Conversation {
    pub(crate) fn new(inner: Arc<AssistantInner>, config: ConversationConfig) -> Self {
        Self {
            inner,
            config,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts building a turn for the given user query.
    pub fn turn(&self, query: impl Into<String>) -> TurnBuilder {
        TurnBuilder::new(
            self.inner.clone(),
            self.in_flight.clone(),
            self.config.name.clone(),
            self.config.session_id,
            query.into(),
        )
    }

    /// Aborts the in-flight turn, if any.
    pub fn cancel(&self) {
        let handle = self.in_flight.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}
