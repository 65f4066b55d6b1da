//! The remote model collaborator

use crate::protocol::{Message, ToolSchema};
use crate::session::{DeltaStream, SessionResult};
use async_trait::async_trait;

/// Everything the model is invoked with for one step
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Conversation history
    pub messages: Vec<Message>,
    /// Tool declarations
    pub tools: Vec<ToolSchema>,
    /// Step index within this request, starting at 0
    pub step: u32,
    /// Step bound for this request
    pub max_steps: u32,
}

/// A language model that answers one step at a time
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Stream the deltas of one assistant step
    async fn step(&self, request: ModelRequest) -> SessionResult<DeltaStream>;
}
