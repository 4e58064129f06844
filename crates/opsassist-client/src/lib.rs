//! Streaming client for the AI Operations Assistant agent endpoint.
//!
//! The backend answers `POST /api/v1/agent/stream` with a chunked
//! `text/event-stream` body carrying typed events (`status`, `intent`,
//! `contexts`, `action`, `answer`, `done`, `error`). This crate consumes
//! that stream incrementally and folds the events into one coherent
//! [`TurnSnapshot`] per turn.
//!
//! # Builder-first usage
//!
//! ```no_run
//! use opsassist_client::prelude::*;
//! use opsassist_client::http::HttpTransportConfig;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), AssistantError> {
//! let assistant = Assistant::connect(
//!     HttpTransportConfig::new("token").tenant_id("acme"),
//! )?;
//!
//! let snapshot = assistant
//!     .conversation(ConversationConfig::named("demo"))
//!     .turn("Which runbook covers the ingest worker?")
//!     .strategy(Strategy::Informed)
//!     .collect_snapshot()
//!     .await?;
//!
//! println!("{}", snapshot.answer);
//! # Ok(())
//! # }
//! ```

/// Client entry point and builder.
pub mod assistant;
/// Conversation grouping and single-flight turn handoff.
pub mod conversation;
/// Public error types used by the client API.
pub mod errors;
/// Typed agent stream events and the fallible event decoder.
pub mod event;
/// HTTP transport and its configuration.
pub mod http;
/// Common imports for typical usage.
pub mod prelude;
/// Request body and per-turn options.
pub mod request;
/// Turn snapshot and the aggregate reducer.
pub mod snapshot;
/// Incremental SSE frame decoding and payload classification.
pub mod sse;
/// Normalized public turn events.
pub mod stream;
/// Transport contract used by the turn runtime.
pub mod transport;
/// Turn builder, streaming handle, and cancellation handle.
pub mod turn;

pub use assistant::{Assistant, AssistantBuilder};
pub use conversation::{Conversation, ConversationConfig};
pub use errors::{AssistantError, TransportError, TurnFailure};
pub use event::{
    AgentEvent, AnswerPayload, ContextSnippet, EventDecodeError, GuardrailReport, IntentReport,
    StatusUpdate, ToolAction, ToolOutcome,
};
pub use http::{HttpTransport, HttpTransportConfig};
pub use request::{ChatMessage, Strategy, TurnOptions, TurnRequest};
pub use snapshot::{TurnSnapshot, TurnStatus};
pub use sse::{FrameDecoder, Payload, Utf8StreamDecoder, classify_frame};
pub use stream::TurnEvent;
pub use transport::{AgentTransport, PayloadStream, TransportStreamHandle};
pub use turn::{AbortHandle, TurnBuilder, TurnStream};
