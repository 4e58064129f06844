use std::sync::Arc;

use crate::conversation::{Conversation, ConversationConfig};
use crate::errors::AssistantError;
use crate::http::{HttpTransport, HttpTransportConfig};
use crate::transport::AgentTransport;

pub(crate) struct AssistantInner {
    transport: Arc<dyn AgentTransport>,
}

impl AssistantInner {
    pub(crate) fn transport(&self) -> Arc<dyn AgentTransport> {
        self.transport.clone()
    }
}

/// Entry point for opening conversations and streaming agent turns.
#[derive(Clone)]
pub struct Assistant {
    pub(crate) inner: Arc<AssistantInner>,
}

impl Assistant {
    /// Starts a builder for configuring the transport.
    pub fn builder() -> AssistantBuilder {
        AssistantBuilder::default()
    }

    /// Creates an assistant client talking HTTP to the backend.
    pub fn connect(config: HttpTransportConfig) -> Result<Self, AssistantError> {
        Self::builder()
            .transport(Arc::new(HttpTransport::new(config)?))
            .build()
    }

    /// Creates an assistant client from `ASSISTANT_*` environment variables.
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::connect(HttpTransportConfig::from_env()?)
    }

    /// Opens a logical conversation for grouping related turns.
    pub fn conversation(&self, config: ConversationConfig) -> Conversation {
        Conversation::new(self.inner.clone(), config)
    }
}

/// Builder used to install a transport before creating an `Assistant`.
///
/// Mostly useful for tests and non-HTTP transports; `Assistant::connect` is
/// the usual path.
#[derive(Default)]
pub struct AssistantBuilder {
    transport: Option<Arc<dyn AgentTransport>>,
}

impl AssistantBuilder {
    /// Sets the transport used for every turn.
    pub fn transport(mut self, transport: Arc<dyn AgentTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the assistant client.
    pub fn build(self) -> Result<Assistant, AssistantError> {
        let transport = self.transport.ok_or_else(|| {
            AssistantError::Config("a transport must be configured before building".into())
        })?;
        Ok(Assistant {
            inner: Arc::new(AssistantInner { transport }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_transport_is_a_config_error() {
        let result = Assistant::builder().build();
        assert!(
            matches!(result, Err(AssistantError::Config(message)) if message.contains("transport"))
        );
    }

    #[test]
    fn connect_rejects_blank_token() {
        let result = Assistant::connect(HttpTransportConfig::new(""));
        assert!(matches!(result, Err(AssistantError::Config(_))));
    }
}
