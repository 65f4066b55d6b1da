//! Append-only conversation state
//!
//! `Conversation` owns the message list and is the only place messages are
//! appended or patched. Every mutation goes through `&mut self`, so two
//! attachments can never race on the same tool call.

use crate::protocol::{
    Message, MessageDelta, Part, Role, StreamState, ToolCall, ToolPart, ToolResult, ToolState,
};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised when a mutation would break a conversation invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("Tool call id '{0}' is already used in this conversation")]
    DuplicateCallId(String),

    #[error("Message id '{0}' is already used in this conversation")]
    DuplicateMessageId(String),

    #[error("Unknown tool call '{0}'")]
    UnknownCall(String),

    #[error("Tool call '{0}' already has a result")]
    AlreadyResolved(String),

    #[error("Tool part '{0}' has a state that does not match its output")]
    InconsistentToolPart(String),

    #[error("No assistant message is currently streaming")]
    NoStreamingMessage,

    #[error("Conversation has been abandoned")]
    Abandoned,
}

/// What a delta did to the conversation
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaEffect {
    /// An assistant message started (or resumed) streaming
    MessageStarted(String),
    /// Text was appended
    TextAppended,
    /// A new tool call became visible
    ToolCallRequested(ToolCall),
    /// A tool call received its result
    ToolResolved(ToolResult),
    /// The streaming message completed
    MessageFinished(String),
}

/// Ordered message history with an index of every tool call
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    /// call id -> (message index, part index)
    call_index: HashMap<String, (usize, usize)>,
    abandoned: bool,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a conversation from a received history
    pub fn from_messages(messages: Vec<Message>) -> Result<Self, ConversationError> {
        let mut conversation = Self::new();
        for message in messages {
            conversation.append(message)?;
        }
        Ok(conversation)
    }

    /// All messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Consume the conversation, returning its messages
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether there are no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent assistant message, if any
    pub fn latest_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Look up a tool part by call id
    pub fn tool_part(&self, call_id: &str) -> Option<&ToolPart> {
        let (msg_idx, part_idx) = *self.call_index.get(call_id)?;
        self.messages.get(msg_idx)?.parts.get(part_idx)?.as_tool()
    }

    /// Calls in the latest assistant message that are still waiting for a result
    pub fn pending_calls(&self) -> Vec<ToolCall> {
        self.latest_assistant()
            .map(|m| {
                m.tool_parts()
                    .filter(|p| !p.is_resolved())
                    .map(ToolPart::to_call)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the conversation has been abandoned
    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    /// Stop accepting mutations; nothing is attached after this point
    pub fn abandon(&mut self) {
        self.abandoned = true;
    }

    /// Append a whole message
    pub fn append(&mut self, message: Message) -> Result<(), ConversationError> {
        self.ensure_open()?;

        let msg_idx = self.messages.len();
        let mut new_calls = Vec::new();
        for (part_idx, part) in message.parts.iter().enumerate() {
            if let Part::Tool(tool) = part {
                if !tool.is_consistent() {
                    return Err(ConversationError::InconsistentToolPart(
                        tool.tool_call_id.clone(),
                    ));
                }
                if self.call_index.contains_key(&tool.tool_call_id)
                    || new_calls.iter().any(|(id, _)| id == &tool.tool_call_id)
                {
                    return Err(ConversationError::DuplicateCallId(tool.tool_call_id.clone()));
                }
                new_calls.push((tool.tool_call_id.clone(), part_idx));
            }
        }

        for (call_id, part_idx) in new_calls {
            self.call_index.insert(call_id, (msg_idx, part_idx));
        }
        self.messages.push(message);
        Ok(())
    }

    /// Attach the result for a call; a call can be resolved only once
    pub fn attach_result(
        &mut self,
        call_id: &str,
        output: Value,
    ) -> Result<ToolResult, ConversationError> {
        self.ensure_open()?;

        let (msg_idx, part_idx) = *self
            .call_index
            .get(call_id)
            .ok_or_else(|| ConversationError::UnknownCall(call_id.to_string()))?;

        let part = match self
            .messages
            .get_mut(msg_idx)
            .and_then(|m| m.parts.get_mut(part_idx))
        {
            Some(Part::Tool(part)) => part,
            _ => return Err(ConversationError::UnknownCall(call_id.to_string())),
        };

        if part.is_resolved() {
            return Err(ConversationError::AlreadyResolved(call_id.to_string()));
        }

        part.state = ToolState::OutputAvailable;
        part.output = Some(output.clone());

        Ok(ToolResult {
            call_id: call_id.to_string(),
            output,
        })
    }

    /// Apply one streamed delta
    pub fn apply_delta(&mut self, delta: MessageDelta) -> Result<DeltaEffect, ConversationError> {
        self.ensure_open()?;

        match delta {
            MessageDelta::Start { message_id } => {
                let resume = matches!(
                    self.messages.last(),
                    Some(last) if last.id == message_id && last.role == Role::Assistant
                );
                if let Some(last) = self.messages.last_mut().filter(|_| resume) {
                    last.state = StreamState::Streaming;
                } else {
                    if self.messages.iter().any(|m| m.id == message_id) {
                        return Err(ConversationError::DuplicateMessageId(message_id));
                    }
                    // A new message ends the one before it
                    if let Some(last) = self.messages.last_mut() {
                        last.state = StreamState::Done;
                    }
                    let message =
                        Message::assistant(message_id.clone()).with_state(StreamState::Streaming);
                    self.messages.push(message);
                }
                Ok(DeltaEffect::MessageStarted(message_id))
            }
            MessageDelta::TextDelta { delta } => {
                let message = self.streaming_message_mut()?;
                match message.parts.last_mut() {
                    Some(Part::Text { text }) => text.push_str(&delta),
                    _ => message.parts.push(Part::text(delta)),
                }
                Ok(DeltaEffect::TextAppended)
            }
            MessageDelta::ToolInputAvailable {
                tool_call_id,
                tool_name,
                input,
            } => {
                if self.call_index.contains_key(&tool_call_id) {
                    return Err(ConversationError::DuplicateCallId(tool_call_id));
                }
                let msg_idx = self.messages.len().saturating_sub(1);
                let message = self.streaming_message_mut()?;
                let part = ToolPart::requested(tool_call_id.clone(), tool_name, input);
                let call = part.to_call();
                message.parts.push(Part::Tool(part));
                let part_idx = message.parts.len() - 1;
                self.call_index.insert(tool_call_id, (msg_idx, part_idx));
                Ok(DeltaEffect::ToolCallRequested(call))
            }
            MessageDelta::ToolOutputAvailable {
                tool_call_id,
                output,
            } => self
                .attach_result(&tool_call_id, output)
                .map(DeltaEffect::ToolResolved),
            MessageDelta::Finish => {
                let message = self.streaming_message_mut()?;
                message.state = StreamState::Done;
                Ok(DeltaEffect::MessageFinished(message.id.clone()))
            }
        }
    }

    fn streaming_message_mut(&mut self) -> Result<&mut Message, ConversationError> {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant && !last.is_complete() => Ok(last),
            _ => Err(ConversationError::NoStreamingMessage),
        }
    }

    fn ensure_open(&self) -> Result<(), ConversationError> {
        if self.abandoned {
            Err(ConversationError::Abandoned)
        } else {
            Ok(())
        }
    }
}
