use crate::{errors::TurnFailure, snapshot::TurnSnapshot};

/// Normalized events exposed by `TurnStream`.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnEvent {
    /// First event for every turn.
    TurnStarted { turn_id: uuid::Uuid },
    /// One raw content payload in arrival order.
    ///
    /// Decode with [`crate::event::AgentEvent::decode`] for custom handling;
    /// the turn runtime also folds every decodable payload into the snapshot
    /// carried by the terminal `Completed` event.
    Message {
        turn_id: uuid::Uuid,
        seq: u64,
        payload: String,
    },
    /// Terminal success event with the folded snapshot.
    Completed {
        turn_id: uuid::Uuid,
        snapshot: TurnSnapshot,
    },
    /// Terminal failure event.
    ///
    /// Caller cancellation arrives here as `TurnFailure::Cancelled` and only
    /// as that variant, so it can be told apart from a stream failure.
    Error {
        turn_id: uuid::Uuid,
        error: TurnFailure,
    },
}
