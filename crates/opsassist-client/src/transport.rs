//! Contract between the turn runtime and a streaming transport.

use std::pin::Pin;

use crate::errors::TransportError;
use crate::request::{TurnOptions, TurnRequest};
use crate::sse::Payload;

/// Boxed stream of classified payloads produced by a transport.
pub type PayloadStream =
    Pin<Box<dyn futures::Stream<Item = Result<Payload, TransportError>> + Send + 'static>>;

/// Handle returned by a transport once the streaming response is established.
pub struct TransportStreamHandle {
    /// Classified payloads in arrival order. Ends with `Payload::Done`, with
    /// `Payload::Error`, or by simply closing after the body is exhausted.
    pub payloads: PayloadStream,
}

/// A source of agent turn streams.
///
/// The transport is agnostic to event semantics: it yields classified
/// payloads and nothing richer. Implementations must fail before returning a
/// handle when the response status is not 2xx, so the frame decoder never
/// sees a failed response.
#[async_trait::async_trait]
pub trait AgentTransport: Send + Sync {
    /// Opens one streaming turn against the backend.
    async fn open(
        &self,
        request: TurnRequest,
        options: TurnOptions,
    ) -> Result<TransportStreamHandle, TransportError>;
}
