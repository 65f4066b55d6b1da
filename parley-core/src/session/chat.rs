//! Client-side chat session
//!
//! `ChatSession` owns the conversation and drives it: it sends the history
//! through a transport, applies the streamed deltas one at a time, hands each
//! new tool call to the dispatcher as soon as it appears, and sends an
//! automatic continuation once every call of the latest assistant message is
//! resolved.

use super::error::{SessionError, SessionResult};
use super::transport::{ChatTransport, TurnRequest};
use crate::config::ParleyConfig;
use crate::continuation::ContinuationTrigger;
use crate::conversation::{Conversation, ConversationError, DeltaEffect};
use crate::dispatcher::{
    ConfirmOutcome, ConfirmationChoice, DispatchError, OverdueCall, SelectionStrategy,
    ToolCallDispatcher, ToolPolicy, ToolView,
};
use crate::protocol::{Message, MessageDelta, Role, ToolCall};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default bound on model steps per turn
pub const DEFAULT_MAX_STEPS: u32 = 5;

/// Where a turn stopped
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The latest assistant message is complete and nothing is pending
    Completed,
    /// Tool calls are waiting for the user or a remote executor
    AwaitingTools(Vec<ToolCall>),
    /// The step bound was hit; any calls still pending are listed
    StepLimitReached { pending: Vec<ToolCall> },
}

/// Drives one conversation against a transport
pub struct ChatSession<T> {
    transport: T,
    conversation: Conversation,
    dispatcher: ToolCallDispatcher,
    trigger: ContinuationTrigger,
    max_steps: u32,
    steps: u32,
    dispatch_errors: Vec<DispatchError>,
}

impl<T: ChatTransport> ChatSession<T> {
    /// Create a session with an empty conversation
    pub fn new(transport: T, dispatcher: ToolCallDispatcher) -> Self {
        Self {
            transport,
            conversation: Conversation::new(),
            dispatcher,
            trigger: ContinuationTrigger::new(),
            max_steps: DEFAULT_MAX_STEPS,
            steps: 0,
            dispatch_errors: Vec::new(),
        }
    }

    /// Create a session whose policy and limits come from configuration
    pub fn from_config(
        transport: T,
        config: &ParleyConfig,
        strategy: Arc<dyn SelectionStrategy>,
    ) -> Self {
        let mut dispatcher = ToolCallDispatcher::new(ToolPolicy::from_config(config, strategy))
            .with_cancel_literal(config.session.cancel_literal.clone());
        if let Some(timeout) = config.session.pending_timeout() {
            dispatcher = dispatcher.with_pending_timeout(timeout);
        }
        Self::new(transport, dispatcher).with_max_steps(config.session.max_steps)
    }

    /// Bound the number of model steps per turn
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Start from an existing history
    pub fn with_history(mut self, messages: Vec<Message>) -> SessionResult<Self> {
        self.conversation = Conversation::from_messages(messages)?;
        Ok(self)
    }

    /// The conversation, for rendering
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The dispatcher
    pub fn dispatcher(&self) -> &ToolCallDispatcher {
        &self.dispatcher
    }

    /// Render-ready state of a tool call
    pub fn view(&self, call_id: &str) -> Option<ToolView> {
        self.dispatcher
            .view(&self.conversation, call_id, Instant::now())
    }

    /// Calls that have been pending longer than the configured timeout
    pub fn overdue_calls(&self) -> Vec<OverdueCall> {
        self.dispatcher.overdue_calls(Instant::now())
    }

    /// Dispatcher errors collected while streaming, oldest first
    pub fn take_dispatch_errors(&mut self) -> Vec<DispatchError> {
        std::mem::take(&mut self.dispatch_errors)
    }

    /// Submit free text from the user and run the turn
    pub async fn send_text(&mut self, text: impl Into<String>) -> SessionResult<TurnOutcome> {
        self.ensure_open()?;
        self.conversation.append(Message::user(text))?;
        self.steps = 0;
        self.run().await
    }

    /// The user activated an affordance; continues the turn if that resolved the batch
    pub async fn confirm(
        &mut self,
        call_id: &str,
        choice: ConfirmationChoice,
    ) -> SessionResult<TurnOutcome> {
        self.ensure_open()?;
        match self
            .dispatcher
            .confirm(&mut self.conversation, call_id, choice)?
        {
            ConfirmOutcome::Attached(_) => self.resume().await,
            ConfirmOutcome::AlreadyResolved => Ok(self.outcome()),
        }
    }

    /// Give up on a pending call and continue the turn if possible
    pub async fn cancel(&mut self, call_id: &str) -> SessionResult<TurnOutcome> {
        self.ensure_open()?;
        self.dispatcher.cancel(&mut self.conversation, call_id)?;
        self.resume().await
    }

    /// Stop the session; pending calls are released and nothing is attached later
    pub fn abandon(&mut self) {
        info!("session abandoned");
        self.dispatcher.abandon(&mut self.conversation);
    }

    /// Whether the session has been abandoned
    pub fn is_abandoned(&self) -> bool {
        self.conversation.is_abandoned()
    }

    async fn resume(&mut self) -> SessionResult<TurnOutcome> {
        if self.trigger.poll(self.conversation.messages()) {
            info!(step = self.steps, "all tool calls resolved, continuing");
            self.run().await
        } else {
            Ok(self.outcome())
        }
    }

    async fn run(&mut self) -> SessionResult<TurnOutcome> {
        loop {
            if self.steps >= self.max_steps {
                let pending = self.conversation.pending_calls();
                warn!(
                    max_steps = self.max_steps,
                    pending = pending.len(),
                    "step limit reached, ending turn"
                );
                return Ok(TurnOutcome::StepLimitReached { pending });
            }

            self.stream_step().await?;

            if !self.trigger.poll(self.conversation.messages()) {
                return Ok(self.outcome());
            }
            info!(step = self.steps, "all tool calls resolved, continuing");
        }
    }

    /// Send one request and apply its response
    ///
    /// Every `start` delta counts as one model step against the turn bound,
    /// and a request always costs at least one. The trailing assistant message
    /// is closed even when the stream fails part way.
    async fn stream_step(&mut self) -> SessionResult<()> {
        let request = TurnRequest {
            messages: self.conversation.messages().to_vec(),
            step: self.steps,
            max_steps: self.max_steps,
        };
        debug!(step = request.step, messages = request.messages.len(), "sending request");

        let sent_at = self.steps;
        let streamed = match self.transport.send(request).await {
            Ok(mut stream) => {
                let mut streamed = Ok(());
                while let Some(delta) = stream.next().await {
                    if let Err(err) = delta.and_then(|delta| self.apply(delta)) {
                        streamed = Err(err);
                        break;
                    }
                }
                streamed
            }
            Err(err) => Err(err),
        };
        if self.steps == sent_at {
            self.steps += 1;
        }

        let closed = self.close_unfinished();
        streamed.and(closed)
    }

    fn close_unfinished(&mut self) -> SessionResult<()> {
        if self.conversation.is_abandoned() {
            return Ok(());
        }
        let unfinished = self
            .conversation
            .messages()
            .last()
            .is_some_and(|m| m.role == Role::Assistant && !m.is_complete());
        if unfinished {
            warn!("stream ended without a finish delta, closing message");
            self.apply(MessageDelta::Finish)?;
        }
        Ok(())
    }

    fn apply(&mut self, delta: MessageDelta) -> SessionResult<()> {
        let effect = match self.conversation.apply_delta(delta) {
            Ok(effect) => effect,
            Err(ConversationError::AlreadyResolved(call_id)) => {
                warn!(call_id = %call_id, "duplicate tool result ignored");
                return Ok(());
            }
            Err(ConversationError::Abandoned) => return Err(SessionError::Abandoned),
            Err(err) => return Err(err.into()),
        };

        match effect {
            DeltaEffect::MessageStarted(_) => self.steps += 1,
            DeltaEffect::ToolCallRequested(call) => {
                if let Err(err) = self.dispatcher.dispatch(&mut self.conversation, &call) {
                    warn!(call_id = %call.call_id, error = %err, "dispatch failed");
                    self.dispatch_errors.push(err);
                }
            }
            DeltaEffect::ToolResolved(result) => {
                debug!(call_id = %result.call_id, "remote result received");
                self.dispatcher.note_resolved(&result.call_id);
            }
            DeltaEffect::TextAppended | DeltaEffect::MessageFinished(_) => {}
        }
        Ok(())
    }

    fn outcome(&self) -> TurnOutcome {
        let pending = self.conversation.pending_calls();
        if pending.is_empty() {
            TurnOutcome::Completed
        } else {
            TurnOutcome::AwaitingTools(pending)
        }
    }

    fn ensure_open(&self) -> SessionResult<()> {
        if self.conversation.is_abandoned() {
            Err(SessionError::Abandoned)
        } else {
            Ok(())
        }
    }
}
