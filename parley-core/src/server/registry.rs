//! Remote tool executors and the tool declarations sent to the model

use crate::protocol::{ToolCall, ToolSchema};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors a remote executor can report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Execution failed: {0}")]
    Failed(String),

    #[error("No result within {0} ms")]
    Timeout(u64),
}

/// Produces results for remote-executed tools
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Execute `call` and return its output
    async fn execute(&self, call: &ToolCall) -> Result<Value, ExecutorError>;
}

/// Tool declarations plus executors for the tools run on this side
#[derive(Clone, Default)]
pub struct ToolRegistry {
    schemas: Vec<ToolSchema>,
    executors: HashMap<String, Arc<dyn RemoteExecutor>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a tool the client resolves
    pub fn declare(mut self, schema: ToolSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Declare a tool and run it here
    pub fn executed(mut self, schema: ToolSchema, executor: impl RemoteExecutor + 'static) -> Self {
        self.executors
            .insert(schema.name.clone(), Arc::new(executor));
        self.schemas.push(schema);
        self
    }

    /// All declarations, in registration order
    pub fn schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    /// Executor for `name`, if it runs here
    pub fn executor(&self, name: &str) -> Option<Arc<dyn RemoteExecutor>> {
        self.executors.get(name).cloned()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut executed: Vec<&str> = self.executors.keys().map(String::as_str).collect();
        executed.sort_unstable();
        f.debug_struct("ToolRegistry")
            .field("schemas", &self.schemas)
            .field("executed", &executed)
            .finish()
    }
}
