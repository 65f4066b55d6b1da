//! Server side of the chat: model invocation and remote tool execution

mod model;
mod registry;
mod route;

pub use model::{ModelClient, ModelRequest};
pub use registry::{ExecutorError, RemoteExecutor, ToolRegistry};
pub use route::{ChatRoute, DEFAULT_EXECUTOR_TIMEOUT, DEFAULT_ROUTE_MAX_STEPS};
