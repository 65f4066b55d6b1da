//! Protocol module for transcript structures
//!
//! This module defines the canonical data model shared by the client session,
//! the dispatcher and the server route. These structures are designed to be:
//! - Closed sum types, matched exhaustively at every consumption site
//! - Streamable through incremental deltas
//! - Serializable for transport without losing part order or tool state

pub mod codec;
pub mod types;

pub use codec::{decode_frames, decode_messages, encode_frame, encode_messages, ProtocolError};
pub use types::{
    Message, MessageDelta, Part, Role, StreamState, ToolCall, ToolPart, ToolResult, ToolSchema,
    ToolState,
};
