//! Core transcript types
//!
//! This module contains the data structures a chat transcript is made of.
//! The design prioritizes:
//! - A closed set of part variants, so every consumer matches exhaustively
//! - Tool parts with exactly two observable states
//! - Stream deltas as the only way remote collaborators change a message

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
}

/// Streaming state of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    /// Deltas are still arriving
    Streaming,
    /// The message is complete
    #[default]
    Done,
}

/// Observable state of a tool part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolState {
    /// The call has been requested, no result yet
    InputAvailable,
    /// A result has been attached
    OutputAvailable,
}

/// A tool invocation embedded in an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPart {
    /// Call identifier, unique within the conversation
    #[serde(rename = "toolCallId")]
    pub tool_call_id: String,

    /// Name of the invoked tool
    #[serde(rename = "toolName")]
    pub tool_name: String,

    /// Current state
    pub state: ToolState,

    /// Structured input chosen by the model
    #[serde(default)]
    pub input: Value,

    /// Attached result, present iff `state` is `OutputAvailable`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub output: Option<Value>,
}

impl ToolPart {
    /// Create a tool part that is waiting for its result
    pub fn requested(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: Value,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            state: ToolState::InputAvailable,
            input,
            output: None,
        }
    }

    /// Whether a result has been attached
    pub fn is_resolved(&self) -> bool {
        self.state == ToolState::OutputAvailable
    }

    /// Check the state/output invariant
    pub fn is_consistent(&self) -> bool {
        match self.state {
            ToolState::InputAvailable => self.output.is_none(),
            ToolState::OutputAvailable => self.output.is_some(),
        }
    }

    /// View this part as the call it represents
    pub fn to_call(&self) -> ToolCall {
        ToolCall {
            call_id: self.tool_call_id.clone(),
            tool_name: self.tool_name.clone(),
            input: self.input.clone(),
        }
    }
}

/// Individual part of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Part {
    /// Literal text
    Text { text: String },
    /// Tool invocation
    #[serde(rename = "tool-invocation")]
    Tool(ToolPart),
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Borrow the tool part, if any
    pub fn as_tool(&self) -> Option<&ToolPart> {
        match self {
            Part::Tool(tool) => Some(tool),
            Part::Text { .. } => None,
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    pub id: String,

    /// Role of the message sender
    pub role: Role,

    /// Ordered parts
    #[serde(default)]
    pub parts: Vec<Part>,

    /// Whether deltas are still arriving
    #[serde(default)]
    pub state: StreamState,

    /// Custom payloads for the rendering layer
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub metadata: HashMap<String, Value>,
}

impl Message {
    /// Create an empty message with a generated id
    pub fn new(role: Role) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), role)
    }

    /// Create an empty message with an explicit id
    pub fn with_id(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            parts: Vec::new(),
            state: StreamState::Done,
            metadata: HashMap::new(),
        }
    }

    /// Create a user message holding one text part
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User).with_text(text)
    }

    /// Create an empty assistant message
    pub fn assistant(id: impl Into<String>) -> Self {
        Self::with_id(id, Role::Assistant)
    }

    /// Append a text part
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::text(text));
        self
    }

    /// Append a tool part
    #[must_use]
    pub fn with_tool(mut self, part: ToolPart) -> Self {
        self.parts.push(Part::Tool(part));
        self
    }

    /// Set the stream state
    #[must_use]
    pub fn with_state(mut self, state: StreamState) -> Self {
        self.state = state;
        self
    }

    /// Add metadata
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether streaming has finished
    pub fn is_complete(&self) -> bool {
        self.state == StreamState::Done
    }

    /// Iterate over the tool parts in order
    pub fn tool_parts(&self) -> impl Iterator<Item = &ToolPart> {
        self.parts.iter().filter_map(Part::as_tool)
    }

    /// Concatenated text of all text parts
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                Part::Tool(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A request, originated by the model, to invoke a named tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call
    pub call_id: String,

    /// Name of the tool
    pub tool_name: String,

    /// Structured input
    pub input: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(call_id: impl Into<String>, tool_name: impl Into<String>, input: Value) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            input,
        }
    }
}

/// The value returned for a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Call this result resolves
    pub call_id: String,

    /// Tool-specific output
    pub output: Value,
}

/// Tool declaration sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,

    /// Human readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Input schema (JSON Schema)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl ToolSchema {
    /// Create a schema with just a name and description
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            parameters: None,
        }
    }

    /// Set the parameter schema
    #[must_use]
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// Incremental change to the conversation, as streamed by remote collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessageDelta {
    /// A new assistant message begins
    Start {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    /// Text appended to the streaming message
    TextDelta { delta: String },
    /// The model requested a tool call
    ToolInputAvailable {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        #[serde(default)]
        input: Value,
    },
    /// A remote executor produced a result
    ToolOutputAvailable {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        output: Value,
    },
    /// The streaming message is complete
    Finish,
}
