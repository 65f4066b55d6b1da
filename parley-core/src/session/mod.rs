//! Client session and transport
//!
//! The session is the only writer of its conversation. Suspension happens
//! only while a request is in flight or a response stream is polled; the
//! dispatcher and the continuation check run synchronously between deltas.

mod chat;
mod error;
mod transport;

pub use chat::{ChatSession, TurnOutcome, DEFAULT_MAX_STEPS};
pub use error::{SessionError, SessionResult};
pub use transport::{ChatTransport, DeltaStream, TurnRequest, WireTransport};
