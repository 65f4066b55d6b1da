//! The tool-call dispatcher
//!
//! `ToolCallDispatcher` decides, for every newly observed tool call, whether
//! it is answered now, answered after the user confirms, or left to a remote
//! executor. It never awaits: every method completes synchronously relative
//! to the event that invoked it.

use super::confirmation::{prompt_text, Affordance, ConfirmationChoice};
use super::handler::HandlerError;
use super::mode::{HandlingMode, UnknownToolPolicy};
use super::policy::{ToolEntry, ToolPolicy};
use crate::conversation::{Conversation, ConversationError};
use crate::protocol::{ToolCall, ToolResult};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Result attached when a pending call is cancelled
pub const DEFAULT_CANCEL_LITERAL: &str = "Cancelled: no result was received.";

/// Errors reported by the dispatcher; they never reach the model
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown tool '{tool}' for call '{call_id}'")]
    UnknownTool { tool: String, call_id: String },

    #[error("Handler for '{tool}' failed: {source}")]
    Handler {
        tool: String,
        #[source]
        source: HandlerError,
    },

    #[error("Tool call '{0}' does not take a confirmation")]
    NotInteractive(String),

    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

/// What `dispatch` did with a call
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A result was attached before `dispatch` returned
    Resolved(ToolResult),
    /// Waiting for the user to pick an affordance
    AwaitingConfirmation,
    /// Waiting for a remote executor
    AwaitingRemote,
    /// Unknown tool, left untouched
    Ignored,
    /// The call already had a result
    AlreadyResolved,
}

/// What `confirm` did with an activation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    /// The literal for the choice was attached
    Attached(ToolResult),
    /// The call was already answered; the activation was a no-op
    AlreadyResolved,
}

/// A call that has waited longer than the pending timeout
#[derive(Debug, Clone, PartialEq)]
pub struct OverdueCall {
    pub call_id: String,
    pub tool_name: String,
    pub waited: Duration,
}

/// Render-ready state of one tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolView {
    /// No result yet and nothing for the user to do
    Pending {
        mode: Option<HandlingMode>,
        overdue: bool,
    },
    /// No result yet, the user must pick one of two affordances
    AwaitingConfirmation {
        prompt: String,
        affordances: [Affordance; 2],
        overdue: bool,
    },
    /// A result is attached
    Resolved { output: Value },
}

#[derive(Debug, Clone)]
struct PendingCall {
    tool_name: String,
    since: Instant,
}

/// Routes tool calls according to a `ToolPolicy`
#[derive(Debug)]
pub struct ToolCallDispatcher {
    policy: ToolPolicy,
    pending_timeout: Option<Duration>,
    cancel_literal: String,
    seen: HashSet<String>,
    pending: HashMap<String, PendingCall>,
}

impl ToolCallDispatcher {
    /// Create a dispatcher with no pending timeout
    pub fn new(policy: ToolPolicy) -> Self {
        Self {
            policy,
            pending_timeout: None,
            cancel_literal: DEFAULT_CANCEL_LITERAL.to_string(),
            seen: HashSet::new(),
            pending: HashMap::new(),
        }
    }

    /// Report unresolved calls as overdue after `timeout`
    pub fn with_pending_timeout(mut self, timeout: Duration) -> Self {
        self.pending_timeout = Some(timeout);
        self
    }

    /// Result attached by `cancel`
    pub fn with_cancel_literal(mut self, literal: impl Into<String>) -> Self {
        self.cancel_literal = literal.into();
        self
    }

    /// The handling table
    pub fn policy(&self) -> &ToolPolicy {
        &self.policy
    }

    /// Number of calls still waiting for a result
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Handle one tool call
    ///
    /// Automatic calls are resolved before this returns. Dispatching a call
    /// that already has a result is a no-op.
    pub fn dispatch(
        &mut self,
        conversation: &mut Conversation,
        call: &ToolCall,
    ) -> Result<DispatchOutcome, DispatchError> {
        if conversation.is_abandoned() {
            return Err(ConversationError::Abandoned.into());
        }
        self.seen.insert(call.call_id.clone());

        if conversation
            .tool_part(&call.call_id)
            .is_some_and(|part| part.is_resolved())
        {
            self.pending.remove(&call.call_id);
            return Ok(DispatchOutcome::AlreadyResolved);
        }

        let entry = match self.policy.get(&call.tool_name) {
            Some(entry) => entry.clone(),
            None => return self.unknown_tool(call),
        };

        match entry {
            ToolEntry::AutomaticSilent(handler) => match handler.resolve(call) {
                Ok(output) => {
                    let result = conversation.attach_result(&call.call_id, output)?;
                    self.pending.remove(&call.call_id);
                    debug!(call_id = %call.call_id, tool = %call.tool_name, "resolved automatically");
                    Ok(DispatchOutcome::Resolved(result))
                }
                Err(source) => {
                    warn!(
                        call_id = %call.call_id,
                        tool = %call.tool_name,
                        error = %source,
                        "automatic handler failed, call stays pending"
                    );
                    self.track(call);
                    Err(DispatchError::Handler {
                        tool: call.tool_name.clone(),
                        source,
                    })
                }
            },
            ToolEntry::InteractiveConfirmation(_) => {
                self.track(call);
                debug!(call_id = %call.call_id, tool = %call.tool_name, "awaiting confirmation");
                Ok(DispatchOutcome::AwaitingConfirmation)
            }
            ToolEntry::RemoteExecuted => {
                self.track(call);
                debug!(call_id = %call.call_id, tool = %call.tool_name, "awaiting remote result");
                Ok(DispatchOutcome::AwaitingRemote)
            }
        }
    }

    /// Dispatch every pending call in the latest assistant message that has
    /// not been dispatched before
    pub fn dispatch_new(
        &mut self,
        conversation: &mut Conversation,
    ) -> Vec<(ToolCall, Result<DispatchOutcome, DispatchError>)> {
        let fresh: Vec<ToolCall> = conversation
            .pending_calls()
            .into_iter()
            .filter(|call| !self.seen.contains(&call.call_id))
            .collect();

        fresh
            .into_iter()
            .map(|call| {
                let outcome = self.dispatch(conversation, &call);
                (call, outcome)
            })
            .collect()
    }

    /// The user activated one of the two affordances for `call_id`
    ///
    /// A second activation on an answered call is a no-op.
    pub fn confirm(
        &mut self,
        conversation: &mut Conversation,
        call_id: &str,
        choice: ConfirmationChoice,
    ) -> Result<ConfirmOutcome, DispatchError> {
        let part = conversation
            .tool_part(call_id)
            .ok_or_else(|| ConversationError::UnknownCall(call_id.to_string()))?;

        let literals = match self.policy.get(&part.tool_name) {
            Some(ToolEntry::InteractiveConfirmation(literals)) => literals.clone(),
            _ => return Err(DispatchError::NotInteractive(call_id.to_string())),
        };

        if part.is_resolved() {
            debug!(call_id, "confirmation ignored, call already answered");
            return Ok(ConfirmOutcome::AlreadyResolved);
        }

        let output = Value::String(literals.literal(choice).to_string());
        let result = conversation.attach_result(call_id, output)?;
        self.pending.remove(call_id);
        info!(call_id, ?choice, "confirmation attached");
        Ok(ConfirmOutcome::Attached(result))
    }

    /// Attach the cancellation literal to an unresolved call
    pub fn cancel(
        &mut self,
        conversation: &mut Conversation,
        call_id: &str,
    ) -> Result<ToolResult, DispatchError> {
        let output = Value::String(self.cancel_literal.clone());
        let result = conversation.attach_result(call_id, output)?;
        self.pending.remove(call_id);
        info!(call_id, "pending call cancelled");
        Ok(result)
    }

    /// Forget a call whose result arrived from elsewhere
    pub fn note_resolved(&mut self, call_id: &str) {
        self.pending.remove(call_id);
    }

    /// Calls that have waited longer than the pending timeout at `now`
    pub fn overdue_calls(&self, now: Instant) -> Vec<OverdueCall> {
        let Some(timeout) = self.pending_timeout else {
            return Vec::new();
        };

        let mut overdue: Vec<OverdueCall> = self
            .pending
            .iter()
            .filter_map(|(call_id, pending)| {
                let waited = now.saturating_duration_since(pending.since);
                (waited >= timeout).then(|| OverdueCall {
                    call_id: call_id.clone(),
                    tool_name: pending.tool_name.clone(),
                    waited,
                })
            })
            .collect();
        overdue.sort_by(|a, b| b.waited.cmp(&a.waited));
        overdue
    }

    /// Render-ready state of `call_id` at `now`
    pub fn view(&self, conversation: &Conversation, call_id: &str, now: Instant) -> Option<ToolView> {
        let part = conversation.tool_part(call_id)?;

        if let Some(output) = &part.output {
            return Some(ToolView::Resolved {
                output: output.clone(),
            });
        }

        let overdue = self.is_overdue(call_id, now);
        let view = match self.policy.get(&part.tool_name) {
            Some(ToolEntry::InteractiveConfirmation(literals)) => ToolView::AwaitingConfirmation {
                prompt: prompt_text(&part.to_call()),
                affordances: literals.affordances(),
                overdue,
            },
            Some(entry) => ToolView::Pending {
                mode: Some(entry.mode()),
                overdue,
            },
            None => ToolView::Pending {
                mode: None,
                overdue,
            },
        };
        Some(view)
    }

    /// Release all pending state; nothing is attached afterwards
    pub fn abandon(&mut self, conversation: &mut Conversation) {
        if !self.pending.is_empty() {
            info!(pending = self.pending.len(), "abandoning pending tool calls");
        }
        self.pending.clear();
        self.seen.clear();
        conversation.abandon();
    }

    fn is_overdue(&self, call_id: &str, now: Instant) -> bool {
        match (self.pending_timeout, self.pending.get(call_id)) {
            (Some(timeout), Some(pending)) => now.saturating_duration_since(pending.since) >= timeout,
            _ => false,
        }
    }

    fn track(&mut self, call: &ToolCall) {
        self.pending
            .entry(call.call_id.clone())
            .or_insert_with(|| PendingCall {
                tool_name: call.tool_name.clone(),
                since: Instant::now(),
            });
    }

    fn unknown_tool(&mut self, call: &ToolCall) -> Result<DispatchOutcome, DispatchError> {
        match self.policy.unknown_tools() {
            UnknownToolPolicy::Ignore => {
                warn!(call_id = %call.call_id, tool = %call.tool_name, "no policy for tool, ignoring");
                self.track(call);
                Ok(DispatchOutcome::Ignored)
            }
            UnknownToolPolicy::Reject => Err(DispatchError::UnknownTool {
                tool: call.tool_name.clone(),
                call_id: call.call_id.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::confirmation::ConfirmationLiterals;
    use crate::dispatcher::handler::ChoiceHandler;
    use crate::dispatcher::selection::FixedSelection;
    use crate::protocol::{Message, ToolPart};
    use serde_json::json;
    use std::sync::Arc;

    fn policy() -> ToolPolicy {
        ToolPolicy::new()
            .automatic(
                "getLocation",
                ChoiceHandler::new(
                    vec![json!("New York"), json!("Chicago")],
                    Arc::new(FixedSelection(1)),
                ),
            )
            .interactive("askForConfirmation", ConfirmationLiterals::default())
            .remote("getWeatherInformation")
    }

    fn conversation_with(calls: &[(&str, &str)]) -> Conversation {
        let mut message = Message::assistant("a1");
        for (id, tool) in calls {
            message = message.with_tool(ToolPart::requested(*id, *tool, json!({"message": "Ok?"})));
        }
        Conversation::from_messages(vec![message]).unwrap()
    }

    #[test]
    fn test_automatic_resolves_before_return() {
        let mut conversation = conversation_with(&[("c1", "getLocation")]);
        let mut dispatcher = ToolCallDispatcher::new(policy());
        let call = conversation.pending_calls().remove(0);

        let outcome = dispatcher.dispatch(&mut conversation, &call).unwrap();
        assert!(matches!(outcome, DispatchOutcome::Resolved(ref r) if r.output == json!("Chicago")));
        assert!(conversation.tool_part("c1").unwrap().is_resolved());

        let again = dispatcher.dispatch(&mut conversation, &call).unwrap();
        assert_eq!(again, DispatchOutcome::AlreadyResolved);
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[test]
    fn test_unknown_tool_policies() {
        let mut conversation = conversation_with(&[("c1", "mystery")]);
        let call = conversation.pending_calls().remove(0);

        let mut ignoring = ToolCallDispatcher::new(policy());
        assert_eq!(
            ignoring.dispatch(&mut conversation, &call).unwrap(),
            DispatchOutcome::Ignored
        );

        let mut rejecting =
            ToolCallDispatcher::new(policy().with_unknown_tools(UnknownToolPolicy::Reject));
        let err = rejecting.dispatch(&mut conversation, &call).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTool { ref tool, .. } if tool == "mystery"));
    }

    #[test]
    fn test_confirm_rejects_non_interactive() {
        let mut conversation = conversation_with(&[("c1", "getWeatherInformation")]);
        let mut dispatcher = ToolCallDispatcher::new(policy());
        let err = dispatcher
            .confirm(&mut conversation, "c1", ConfirmationChoice::Confirm)
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotInteractive(_)));
    }

    #[test]
    fn test_dispatch_new_runs_each_call_once() {
        let mut conversation =
            conversation_with(&[("c1", "askForConfirmation"), ("c2", "getWeatherInformation")]);
        let mut dispatcher = ToolCallDispatcher::new(policy());

        let first = dispatcher.dispatch_new(&mut conversation);
        assert_eq!(first.len(), 2);
        assert!(dispatcher.dispatch_new(&mut conversation).is_empty());
        assert_eq!(dispatcher.pending_count(), 2);
    }

    #[test]
    fn test_overdue_and_cancel() {
        let mut conversation = conversation_with(&[("c1", "getWeatherInformation")]);
        let mut dispatcher =
            ToolCallDispatcher::new(policy()).with_pending_timeout(Duration::from_secs(30));
        dispatcher.dispatch_new(&mut conversation);

        assert!(dispatcher.overdue_calls(Instant::now()).is_empty());
        let later = Instant::now() + Duration::from_secs(31);
        let overdue = dispatcher.overdue_calls(later);
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].tool_name, "getWeatherInformation");
        assert_eq!(
            dispatcher.view(&conversation, "c1", later),
            Some(ToolView::Pending {
                mode: Some(HandlingMode::RemoteExecuted),
                overdue: true
            })
        );

        let result = dispatcher.cancel(&mut conversation, "c1").unwrap();
        assert_eq!(result.output, json!(DEFAULT_CANCEL_LITERAL));
        assert!(dispatcher.overdue_calls(later).is_empty());
    }

    #[test]
    fn test_view_for_confirmation() {
        let mut conversation = conversation_with(&[("c1", "askForConfirmation")]);
        let mut dispatcher = ToolCallDispatcher::new(policy());
        dispatcher.dispatch_new(&mut conversation);

        match dispatcher.view(&conversation, "c1", Instant::now()) {
            Some(ToolView::AwaitingConfirmation {
                prompt, overdue, ..
            }) => {
                assert_eq!(prompt, "Ok?");
                assert!(!overdue);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_abandon_blocks_later_confirmation() {
        let mut conversation = conversation_with(&[("c1", "askForConfirmation")]);
        let mut dispatcher = ToolCallDispatcher::new(policy());
        dispatcher.dispatch_new(&mut conversation);
        dispatcher.abandon(&mut conversation);

        let err = dispatcher
            .confirm(&mut conversation, "c1", ConfirmationChoice::Confirm)
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Conversation(ConversationError::Abandoned)
        ));
        assert_eq!(dispatcher.pending_count(), 0);
        assert!(!conversation.tool_part("c1").unwrap().is_resolved());
    }

    #[test]
    fn test_dispatch_after_abandon_tracks_nothing() {
        let mut conversation = conversation_with(&[("c1", "getWeatherInformation")]);
        let mut dispatcher = ToolCallDispatcher::new(policy());
        dispatcher.abandon(&mut conversation);

        let call = conversation.tool_part("c1").unwrap().to_call();
        let err = dispatcher.dispatch(&mut conversation, &call).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Conversation(ConversationError::Abandoned)
        ));
        assert_eq!(dispatcher.pending_count(), 0);
        assert!(dispatcher.dispatch_new(&mut conversation).iter().all(|(_, r)| r.is_err()));
        assert_eq!(dispatcher.pending_count(), 0);
    }
}
