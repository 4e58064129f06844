//! HTTP transport speaking the backend's agent SSE endpoint.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use futures::StreamExt as _;
use futures::stream;
use tracing::debug;

use crate::errors::{AssistantError, TransportError};
use crate::request::{TurnOptions, TurnRequest};
use crate::sse::{FrameDecoder, Payload, classify_frame};
use crate::transport::{AgentTransport, TransportStreamHandle};

const TENANT_HEADER: &str = "X-Tenant-ID";

type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

/// Configuration for the HTTP transport.
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Bearer token sent in the `Authorization` header.
    pub api_token: String,
    /// Base URL of the assistant backend.
    pub base_url: String,
    /// Tenant identifier sent as `X-Tenant-ID` when present.
    ///
    /// Without it the backend falls back to subdomain resolution.
    pub tenant_id: Option<String>,
    /// Default HTTP timeout for requests.
    pub timeout: Duration,
}

impl HttpTransportConfig {
    /// Creates a config with local-development defaults and a provided token.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: "http://localhost:8000".to_string(),
            tenant_id: None,
            timeout: Duration::from_secs(120),
        }
    }

    /// Builds a config from `ASSISTANT_API_TOKEN`, `ASSISTANT_API_URL`, and
    /// `ASSISTANT_TENANT_ID`.
    pub fn from_env() -> Result<Self, AssistantError> {
        let api_token = std::env::var("ASSISTANT_API_TOKEN").unwrap_or_default();
        if api_token.trim().is_empty() {
            return Err(AssistantError::Config(
                "missing ASSISTANT_API_TOKEN for HTTP transport".into(),
            ));
        }
        let mut config = Self::new(api_token);
        if let Ok(base_url) = std::env::var("ASSISTANT_API_URL")
            && !base_url.trim().is_empty()
        {
            config.base_url = base_url;
        }
        if let Ok(tenant_id) = std::env::var("ASSISTANT_TENANT_ID")
            && !tenant_id.trim().is_empty()
        {
            config.tenant_id = Some(tenant_id);
        }
        Ok(config)
    }

    /// Overrides the backend base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the tenant identifier header value.
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn agent_stream_url(&self) -> String {
        format!(
            "{}/api/v1/agent/stream",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Transport for the agent streaming endpoint over reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Creates a transport from explicit configuration.
    pub fn new(config: HttpTransportConfig) -> Result<Self, AssistantError> {
        if config.api_token.trim().is_empty() {
            return Err(AssistantError::Config(
                "HTTP transport api_token must not be empty".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistantError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Creates a transport from `ASSISTANT_*` environment variables.
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::new(HttpTransportConfig::from_env()?)
    }
}

#[async_trait::async_trait]
impl AgentTransport for HttpTransport {
    async fn open(
        &self,
        request: TurnRequest,
        options: TurnOptions,
    ) -> Result<TransportStreamHandle, TransportError> {
        debug!(
            strategy = ?request.strategy,
            session_id = ?request.session_id,
            "starting agent stream"
        );

        let mut http_req = self
            .client
            .post(self.config.agent_stream_url())
            .bearer_auth(&self.config.api_token)
            .json(&request);
        if let Some(tenant_id) = self.config.tenant_id.as_deref() {
            http_req = http_req.header(TENANT_HEADER, tenant_id);
        }
        if let Some(timeout) = options.timeout {
            http_req = http_req.timeout(timeout);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| TransportError::transport(format!("agent stream request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::upstream(
                format!("agent stream request failed with status {status}: {body}"),
                Some(status.as_u16()),
            ));
        }

        let bytes_stream: ByteStream = Box::pin(response.bytes_stream());
        Ok(TransportStreamHandle {
            payloads: Box::pin(payload_stream(bytes_stream)),
        })
    }
}

fn payload_stream(
    bytes_stream: ByteStream,
) -> impl futures::Stream<Item = Result<Payload, TransportError>> + Send {
    struct State {
        bytes_stream: ByteStream,
        decoder: FrameDecoder,
        pending: VecDeque<Payload>,
        done: bool,
    }

    stream::try_unfold(
        State {
            bytes_stream,
            decoder: FrameDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(payload) = state.pending.pop_front() {
                    return Ok(Some((payload, state)));
                }
                if state.done {
                    return Ok(None);
                }

                match state.bytes_stream.next().await {
                    Some(Ok(chunk)) => {
                        for frame in state.decoder.feed(&chunk) {
                            match classify_frame(&frame) {
                                Payload::Empty => {}
                                payload => state.pending.push_back(payload),
                            }
                        }
                    }
                    Some(Err(e)) => {
                        return Err(TransportError::transport(format!(
                            "agent stream read failed: {e}"
                        )));
                    }
                    None => {
                        state.done = true;
                        if let Some(frame) = state.decoder.flush() {
                            match classify_frame(&frame) {
                                Payload::Empty => {}
                                payload => state.pending.push_back(payload),
                            }
                        }
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt as _;

    fn byte_stream(chunks: Vec<&'static [u8]>) -> ByteStream {
        Box::pin(stream::iter(
            chunks
                .into_iter()
                .map(|bytes| Ok(bytes::Bytes::from_static(bytes))),
        ))
    }

    async fn collect_payloads(chunks: Vec<&'static [u8]>) -> Vec<Payload> {
        payload_stream(byte_stream(chunks))
            .try_collect()
            .await
            .expect("payload stream")
    }

    #[tokio::test]
    async fn classifies_frames_across_chunk_boundaries() {
        let payloads = collect_payloads(vec![
            b"data: {\"type\":\"status\",\"sta",
            b"te\":\"processing\"}\n\ndata: [DO",
            b"NE]\n\n",
        ])
        .await;
        assert_eq!(
            payloads,
            vec![
                Payload::Content("{\"type\":\"status\",\"state\":\"processing\"}".into()),
                Payload::Done,
            ]
        );
    }

    #[tokio::test]
    async fn trailing_frame_without_delimiter_is_flushed_at_eof() {
        let payloads = collect_payloads(vec![b"data: {\"type\":\"done\"}"]).await;
        assert_eq!(payloads, vec![Payload::Content("{\"type\":\"done\"}".into())]);
    }

    #[tokio::test]
    async fn error_sentinel_is_classified() {
        let payloads = collect_payloads(vec![b"data: [ERROR]\n\n"]).await;
        assert_eq!(payloads, vec![Payload::Error]);
    }

    #[tokio::test]
    async fn keepalive_comments_produce_no_payloads() {
        let payloads = collect_payloads(vec![b": ping\n\n: ping\n\n"]).await;
        assert!(payloads.is_empty());
    }

    #[test]
    fn agent_stream_url_handles_trailing_slash() {
        let config = HttpTransportConfig::new("token").base_url("https://ops.example.com/");
        assert_eq!(
            config.agent_stream_url(),
            "https://ops.example.com/api/v1/agent/stream"
        );
    }

    #[test]
    fn transport_rejects_blank_token() {
        let result = HttpTransport::new(HttpTransportConfig::new("  "));
        assert!(matches!(result, Err(AssistantError::Config(_))));
    }
}
