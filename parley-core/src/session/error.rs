//! Session error types

use crate::conversation::ConversationError;
use crate::dispatcher::DispatchError;
use crate::protocol::ProtocolError;
use thiserror::Error;

/// Result type for session and transport operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while driving a conversation
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport could not deliver the request or the stream broke
    #[error("Transport error: {0}")]
    Transport(String),

    /// The model collaborator failed
    #[error("Model error: {0}")]
    Model(String),

    /// A payload could not be encoded or decoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A delta or attachment broke a conversation invariant
    #[error(transparent)]
    Conversation(#[from] ConversationError),

    /// The dispatcher refused a user action
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The session was abandoned and accepts no further actions
    #[error("Session has been abandoned")]
    Abandoned,
}
