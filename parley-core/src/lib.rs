//! Parley Core Library
//!
//! This crate lets a chat application mix server-executed and client-executed
//! tools, with optional human confirmation, inside a chat transcript.

pub mod config;
pub mod continuation;
pub mod conversation;
pub mod cookbook;
pub mod dispatcher;
pub mod protocol;
pub mod server;
pub mod session;

pub use continuation::{should_continue, ContinuationTrigger};
pub use conversation::{Conversation, ConversationError, DeltaEffect};

/// Returns the version of the Parley Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
