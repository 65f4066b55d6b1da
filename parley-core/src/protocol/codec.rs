//! JSON transport encoding for messages and stream deltas
//!
//! Messages travel as a JSON array. Deltas travel as server-sent-event style
//! frames, one `data: <json>` line per delta followed by a blank line.

use super::types::{Message, MessageDelta};
use thiserror::Error;

const DATA_PREFIX: &str = "data: ";

/// Errors raised while encoding or decoding transport payloads
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),
}

/// Serialize a message history for transport
pub fn encode_messages(messages: &[Message]) -> Result<String, ProtocolError> {
    serde_json::to_string(messages).map_err(ProtocolError::Encode)
}

/// Reconstruct a message history received from the other side
pub fn decode_messages(payload: &str) -> Result<Vec<Message>, ProtocolError> {
    serde_json::from_str(payload).map_err(ProtocolError::Decode)
}

/// Encode one delta as a transport frame
pub fn encode_frame(delta: &MessageDelta) -> Result<String, ProtocolError> {
    let json = serde_json::to_string(delta).map_err(ProtocolError::Encode)?;
    Ok(format!("{DATA_PREFIX}{json}\n\n"))
}

/// Decode every frame in a buffer, in order
///
/// Blank lines separate frames; lines without the `data: ` prefix are rejected.
pub fn decode_frames(buffer: &str) -> Result<Vec<MessageDelta>, ProtocolError> {
    buffer
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let json = line
                .strip_prefix(DATA_PREFIX)
                .ok_or_else(|| ProtocolError::MalformedFrame(line.to_string()))?;
            serde_json::from_str(json).map_err(ProtocolError::Decode)
        })
        .collect()
}
