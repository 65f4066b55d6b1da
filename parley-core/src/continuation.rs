//! Automatic-continuation predicate
//!
//! After every change to the message list the host asks whether the
//! conversation should be sent back to the model. The predicate never does
//! any I/O itself; acting on `true` is the caller's job.

use crate::protocol::{Message, Role};

/// Whether the latest assistant message is complete and every tool call in
/// it has a result
///
/// Returns `false` when the last message is not an assistant message, when
/// it is still streaming, when it contains no tool parts, or when any tool
/// part is still `input-available`.
pub fn should_continue(messages: &[Message]) -> bool {
    let Some(last) = messages.last() else {
        return false;
    };

    if last.role != Role::Assistant || !last.is_complete() {
        return false;
    }

    let mut tools = last.tool_parts().peekable();
    if tools.peek().is_none() {
        return false;
    }
    tools.all(|part| part.is_resolved())
}

/// Fires the continuation at most once per resolved batch of tool calls
///
/// The predicate is re-evaluated on every message-list change, and the same
/// resolved message may be observed several times before the continuation
/// request lands. The trigger remembers the message id and tool part count
/// it last fired for, so a message resumed by a later step can fire again
/// once its new calls resolve.
#[derive(Debug, Clone, Default)]
pub struct ContinuationTrigger {
    last_fired: Option<(String, usize)>,
}

impl ContinuationTrigger {
    /// Create a trigger that has never fired
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once when `should_continue` first holds for the latest message
    pub fn poll(&mut self, messages: &[Message]) -> bool {
        if !should_continue(messages) {
            return false;
        }
        let Some(last) = messages.last() else {
            return false;
        };
        let batch = (last.id.clone(), last.tool_parts().count());
        if self.last_fired.as_ref() == Some(&batch) {
            return false;
        }
        self.last_fired = Some(batch);
        true
    }

    /// Forget which message fired last
    pub fn reset(&mut self) {
        self.last_fired = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{StreamState, ToolPart, ToolState};
    use serde_json::json;

    fn resolved(id: &str) -> ToolPart {
        let mut part = ToolPart::requested(id, "getLocation", json!({}));
        part.state = ToolState::OutputAvailable;
        part.output = Some(json!("Chicago"));
        part
    }

    #[test]
    fn test_empty_history() {
        assert!(!should_continue(&[]));
    }

    #[test]
    fn test_user_message_last() {
        let messages = vec![
            Message::assistant("a1").with_tool(resolved("c1")),
            Message::user("thanks"),
        ];
        assert!(!should_continue(&messages));
    }

    #[test]
    fn test_streaming_message_blocks() {
        let messages = vec![Message::assistant("a1")
            .with_tool(resolved("c1"))
            .with_state(StreamState::Streaming)];
        assert!(!should_continue(&messages));
    }

    #[test]
    fn test_text_only_message_does_not_continue() {
        let messages = vec![Message::assistant("a1").with_text("done")];
        assert!(!should_continue(&messages));
    }

    #[test]
    fn test_pending_part_blocks() {
        let messages = vec![Message::assistant("a1")
            .with_tool(resolved("c1"))
            .with_tool(ToolPart::requested("c2", "askForConfirmation", json!({})))];
        assert!(!should_continue(&messages));
    }

    #[test]
    fn test_all_resolved_continues() {
        let messages = vec![Message::assistant("a1")
            .with_text("checking")
            .with_tool(resolved("c1"))
            .with_tool(resolved("c2"))];
        assert!(should_continue(&messages));
    }

    #[test]
    fn test_trigger_fires_once_per_message() {
        let mut trigger = ContinuationTrigger::new();
        let mut messages = vec![Message::assistant("a1").with_tool(resolved("c1"))];

        assert!(trigger.poll(&messages));
        assert!(!trigger.poll(&messages));

        messages.push(Message::assistant("a2").with_tool(resolved("c2")));
        assert!(trigger.poll(&messages));
    }

    #[test]
    fn test_trigger_fires_again_for_resumed_message() {
        let mut trigger = ContinuationTrigger::new();
        let mut messages = vec![Message::assistant("a1").with_tool(resolved("c1"))];
        assert!(trigger.poll(&messages));

        messages[0].parts.push(crate::protocol::Part::Tool(resolved("c2")));
        assert!(trigger.poll(&messages));
        assert!(!trigger.poll(&messages));
    }
}
