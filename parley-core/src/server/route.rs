//! Server-side chat route
//!
//! `ChatRoute` receives the client's history, invokes the model with the
//! tool declarations, runs the tools it has executors for, and invokes the
//! model again while every requested call was answered here. A call with no
//! executor ends the step loop: the client is expected to resolve it and
//! send the history back.

use super::model::{ModelClient, ModelRequest};
use super::registry::{ExecutorError, ToolRegistry};
use crate::config::ParleyConfig;
use crate::conversation::{Conversation, DeltaEffect};
use crate::protocol::{MessageDelta, Role, ToolCall};
use crate::session::{ChatTransport, DeltaStream, SessionResult, TurnRequest};
use async_trait::async_trait;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default step bound per turn
pub const DEFAULT_ROUTE_MAX_STEPS: u32 = 5;

/// Default wait for a remote executor
pub const DEFAULT_EXECUTOR_TIMEOUT: Duration = Duration::from_secs(10);

/// In-process route between a client session and a model
pub struct ChatRoute<M> {
    model: M,
    registry: ToolRegistry,
    max_steps: u32,
    executor_timeout: Duration,
}

impl<M: ModelClient> ChatRoute<M> {
    /// Create a route with default limits
    pub fn new(model: M, registry: ToolRegistry) -> Self {
        Self {
            model,
            registry,
            max_steps: DEFAULT_ROUTE_MAX_STEPS,
            executor_timeout: DEFAULT_EXECUTOR_TIMEOUT,
        }
    }

    /// Take limits from configuration
    pub fn from_config(model: M, registry: ToolRegistry, config: &ParleyConfig) -> Self {
        Self::new(model, registry)
            .with_max_steps(config.session.max_steps)
            .with_executor_timeout(config.session.executor_timeout())
    }

    /// Bound the number of model steps per turn
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// How long to wait for a remote executor
    pub fn with_executor_timeout(mut self, timeout: Duration) -> Self {
        self.executor_timeout = timeout;
        self
    }

    /// The tool registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run the step loop and collect every delta, in order
    ///
    /// Steps are numbered across the whole turn: the loop starts at
    /// `request.step` and stops at the smaller of the turn bound carried by
    /// the request and this route's own bound.
    pub async fn respond(&self, request: TurnRequest) -> SessionResult<Vec<MessageDelta>> {
        let end = request.max_steps.min(self.max_steps);
        if request.step >= end {
            warn!(step = request.step, max_steps = end, "no model steps left in this turn");
            return Ok(Vec::new());
        }

        let mut history = Conversation::from_messages(request.messages)?;
        let mut emitted = Vec::new();

        for step in request.step..end {
            let model_request = ModelRequest {
                messages: history.messages().to_vec(),
                tools: self.registry.schemas().to_vec(),
                step,
                max_steps: end,
            };
            debug!(step, "invoking model");

            let mut requested = Vec::new();
            let mut deltas = self.model.step(model_request).await?;
            while let Some(delta) = deltas.next().await {
                let delta = delta?;
                if let DeltaEffect::ToolCallRequested(call) = history.apply_delta(delta.clone())? {
                    requested.push(call);
                }
                emitted.push(delta);
            }

            let unfinished = history
                .messages()
                .last()
                .is_some_and(|m| m.role == Role::Assistant && !m.is_complete());
            if unfinished {
                warn!(step, "model step ended without a finish delta, closing message");
                history.apply_delta(MessageDelta::Finish)?;
                emitted.push(MessageDelta::Finish);
            }

            if requested.is_empty() {
                debug!(step, "model finished without tool calls");
                break;
            }

            let outputs = self.execute_all(&requested).await;
            let all_executed = outputs.len() == requested.len();
            for (call_id, output) in outputs {
                let delta = MessageDelta::ToolOutputAvailable {
                    tool_call_id: call_id,
                    output,
                };
                history.apply_delta(delta.clone())?;
                emitted.push(delta);
            }

            if !all_executed {
                info!(step, "tool calls left for the client, ending request");
                break;
            }
            if step + 1 == end {
                warn!(max_steps = end, "step limit reached");
            }
        }

        Ok(emitted)
    }

    /// Run every call that has an executor; returns (call id, output) for the ones that succeeded
    async fn execute_all(&self, calls: &[ToolCall]) -> Vec<(String, Value)> {
        let runs = calls.iter().filter_map(|call| {
            let executor = self.registry.executor(&call.tool_name)?;
            let timeout = self.executor_timeout;
            Some(async move {
                let result = match tokio::time::timeout(timeout, executor.execute(call)).await {
                    Ok(result) => result,
                    Err(_) => Err(ExecutorError::Timeout(timeout.as_millis() as u64)),
                };
                (call, result)
            })
        });

        join_all(runs)
            .await
            .into_iter()
            .filter_map(|(call, result)| match result {
                Ok(output) => {
                    debug!(call_id = %call.call_id, tool = %call.tool_name, "executed remotely");
                    Some((call.call_id.clone(), output))
                }
                Err(err) => {
                    warn!(
                        call_id = %call.call_id,
                        tool = %call.tool_name,
                        error = %err,
                        "remote execution produced no result"
                    );
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl<M: ModelClient> ChatTransport for ChatRoute<M> {
    async fn send(&self, request: TurnRequest) -> SessionResult<DeltaStream> {
        let deltas = self.respond(request).await?;
        Ok(stream::iter(deltas.into_iter().map(Ok)).boxed())
    }
}
