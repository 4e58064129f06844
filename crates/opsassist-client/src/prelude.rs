//! Common imports for typical client usage.
//!
//! This module intentionally exports the most frequently used builder/runtime
//! types so examples and application code need fewer import lines.
pub use crate::{
    AbortHandle, AgentEvent, Assistant, AssistantBuilder, AssistantError, ChatMessage,
    Conversation, ConversationConfig, Strategy, TurnBuilder, TurnEvent, TurnFailure, TurnSnapshot,
    TurnStatus, TurnStream,
};
