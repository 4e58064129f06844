/// Errors produced by a transport implementation before they are normalized
/// for the public turn stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Backend returned an application-level failure (HTTP status, auth,
    /// inactive tenant, explicit error sentinel).
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        status_code: Option<u16>,
    },
    /// Network or stream I/O failed.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// Response shape or frame sequencing was invalid.
    #[error("protocol error: {message}")]
    Protocol { message: String },
}

impl TransportError {
    /// Creates an upstream-level error.
    pub fn upstream(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Upstream {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a protocol-level error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Upstream { message, .. }
            | Self::Transport { message, .. }
            | Self::Protocol { message, .. } => message,
        }
    }
}

/// Terminal turn failure sent through `TurnEvent::Error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum TurnFailure {
    /// Backend reported a terminal failure (non-2xx status or error sentinel).
    #[error("upstream failure: {message}")]
    Upstream {
        message: String,
        status_code: Option<u16>,
    },
    /// Network/stream transport failed mid-turn.
    #[error("transport failure: {message}")]
    Transport { message: String },
    /// The client detected a protocol or invariant error.
    #[error("protocol failure: {message}")]
    Protocol { message: String },
    /// The turn was cancelled by the caller.
    ///
    /// Kept distinct from the failure variants so callers can tell "user
    /// cancelled" from "stream failed" and skip showing an error message.
    #[error("turn cancelled")]
    Cancelled,
}

impl TurnFailure {
    /// Returns true when this terminal state was caused by caller
    /// cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Top-level error type for the public client API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssistantError {
    /// Invalid client/transport configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid user input to the builder API.
    #[error("validation error: {0}")]
    Validation(String),
    /// Transport startup/request error before the turn stream is established.
    #[error(transparent)]
    Transport(TransportError),
    /// Terminal failure returned from a started turn.
    #[error(transparent)]
    TurnFailed(TurnFailure),
    /// Internal protocol misuse or invariant violation.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl AssistantError {
    pub(crate) fn turn_failed(failure: TurnFailure) -> Self {
        Self::TurnFailed(failure)
    }

    pub(crate) fn protocol_msg(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns true when the underlying cause was caller cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::TurnFailed(TurnFailure::Cancelled))
    }
}

impl From<TurnFailure> for AssistantError {
    fn from(value: TurnFailure) -> Self {
        AssistantError::TurnFailed(value)
    }
}

pub(crate) fn turn_failure_from_transport_error(err: &TransportError) -> TurnFailure {
    match err {
        TransportError::Upstream {
            message,
            status_code,
        } => TurnFailure::Upstream {
            message: message.clone(),
            status_code: *status_code,
        },
        TransportError::Transport { message } => TurnFailure::Transport {
            message: message.clone(),
        },
        TransportError::Protocol { message } => TurnFailure::Protocol {
            message: message.clone(),
        },
    }
}
