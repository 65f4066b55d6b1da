//! Transport between the client session and the route that talks to the model

use super::error::SessionResult;
use crate::protocol::{
    decode_frames, decode_messages, encode_frame, encode_messages, Message, MessageDelta,
};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

/// Stream of deltas produced for one request
pub type DeltaStream = BoxStream<'static, SessionResult<MessageDelta>>;

/// One request from the client: the full history so far
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    /// Conversation history
    pub messages: Vec<Message>,
    /// Model steps already taken in the current turn
    pub step: u32,
    /// Bound on model steps for the whole turn
    pub max_steps: u32,
}

/// Sends a conversation somewhere and streams the answer back
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver `request` and return the response deltas
    async fn send(&self, request: TurnRequest) -> SessionResult<DeltaStream>;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for std::sync::Arc<T> {
    async fn send(&self, request: TurnRequest) -> SessionResult<DeltaStream> {
        (**self).send(request).await
    }
}

/// Pushes every request and response through the JSON wire encoding
///
/// The history is serialized and reconstructed before it reaches the inner
/// transport, and the response deltas are framed and decoded again, exactly
/// as they would be across a network boundary.
pub struct WireTransport<T> {
    inner: T,
}

impl<T: ChatTransport> WireTransport<T> {
    /// Wrap `inner`
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: ChatTransport> ChatTransport for WireTransport<T> {
    async fn send(&self, request: TurnRequest) -> SessionResult<DeltaStream> {
        let payload = encode_messages(&request.messages)?;
        let received = TurnRequest {
            messages: decode_messages(&payload)?,
            step: request.step,
            max_steps: request.max_steps,
        };

        let mut response = self.inner.send(received).await?;
        let mut buffer = String::new();
        while let Some(delta) = response.next().await {
            buffer.push_str(&encode_frame(&delta?)?);
        }

        let deltas = decode_frames(&buffer)?;
        Ok(stream::iter(deltas.into_iter().map(Ok)).boxed())
    }
}
