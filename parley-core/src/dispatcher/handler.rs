//! Client-side handlers for automatically resolved tools
//!
//! Handlers are synchronous. A handler's result is attached before
//! `dispatch` returns.

use super::selection::{pick, SelectionStrategy};
use crate::protocol::ToolCall;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Errors a handler can report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("No candidates to choose from")]
    NoCandidates,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Computes a result for a call without awaiting anything
pub trait AutomaticHandler: Send + Sync {
    /// Produce the output for `call`
    fn resolve(&self, call: &ToolCall) -> Result<Value, HandlerError>;
}

impl<F> AutomaticHandler for F
where
    F: Fn(&ToolCall) -> Result<Value, HandlerError> + Send + Sync,
{
    fn resolve(&self, call: &ToolCall) -> Result<Value, HandlerError> {
        self(call)
    }
}

/// Answers with one value from a fixed candidate list
pub struct ChoiceHandler {
    candidates: Vec<Value>,
    strategy: Arc<dyn SelectionStrategy>,
}

impl ChoiceHandler {
    /// Create a handler over `candidates`
    pub fn new(candidates: Vec<Value>, strategy: Arc<dyn SelectionStrategy>) -> Self {
        Self {
            candidates,
            strategy,
        }
    }

    /// Candidate values
    pub fn candidates(&self) -> &[Value] {
        &self.candidates
    }
}

impl AutomaticHandler for ChoiceHandler {
    fn resolve(&self, _call: &ToolCall) -> Result<Value, HandlerError> {
        pick(self.strategy.as_ref(), &self.candidates)
            .cloned()
            .ok_or(HandlerError::NoCandidates)
    }
}

impl std::fmt::Debug for ChoiceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChoiceHandler")
            .field("candidates", &self.candidates)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}
