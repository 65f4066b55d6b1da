//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parley_core::protocol::MessageDelta;
use parley_core::server::{ModelClient, ModelRequest};
use parley_core::session::{ChatTransport, DeltaStream, SessionError, SessionResult, TurnRequest};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A model that replays canned steps and records what it was asked
#[derive(Clone, Default)]
pub struct ScriptedModel {
    steps: Arc<Mutex<VecDeque<Vec<MessageDelta>>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl ScriptedModel {
    pub fn new(steps: Vec<Vec<MessageDelta>>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn step(&self, request: ModelRequest) -> SessionResult<DeltaStream> {
        self.requests.lock().unwrap().push(request);
        let deltas = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SessionError::Model("script exhausted".to_string()))?;
        Ok(stream::iter(deltas.into_iter().map(Ok)).boxed())
    }
}

/// Used directly as a transport, the script stands in for the whole server
#[async_trait]
impl ChatTransport for ScriptedModel {
    async fn send(&self, request: TurnRequest) -> SessionResult<DeltaStream> {
        self.step(ModelRequest {
            messages: request.messages,
            tools: Vec::new(),
            step: request.step,
            max_steps: request.max_steps,
        })
        .await
    }
}

pub fn start(id: &str) -> MessageDelta {
    MessageDelta::Start {
        message_id: id.to_string(),
    }
}

pub fn text(delta: &str) -> MessageDelta {
    MessageDelta::TextDelta {
        delta: delta.to_string(),
    }
}

pub fn tool_call(id: &str, name: &str, input: Value) -> MessageDelta {
    MessageDelta::ToolInputAvailable {
        tool_call_id: id.to_string(),
        tool_name: name.to_string(),
        input,
    }
}

pub fn finish() -> MessageDelta {
    MessageDelta::Finish
}
