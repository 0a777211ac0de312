//! Per-message context handed to handlers.
//!
//! - [`Response`] is the reply side: it knows which channel the message came
//!   from and posts text back through the transport.
//! - [`MessageContext`] pairs the resolved [`Request`] with its [`Response`].
//!   One `Arc<MessageContext>` is created per dispatch and shared by every
//!   handler in the chain.

use std::sync::Arc;

use tracing::{debug, error};

use karma_core::BoxedTransport;

use crate::request::Request;

/// Replies into the channel a message arrived from.
#[derive(Clone)]
pub struct Response {
    channel: String,
    transport: BoxedTransport,
}

impl Response {
    pub fn new(channel: impl Into<String>, transport: BoxedTransport) -> Self {
        Self {
            channel: channel.into(),
            transport,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Posts `text` into the originating channel.
    ///
    /// Send failures are logged and swallowed; a handler never sees them.
    pub async fn respond(&self, text: &str) {
        match self.transport.respond(&self.channel, text).await {
            Ok(()) => debug!(channel = %self.channel, "Reply sent"),
            Err(e) => error!(channel = %self.channel, error = %e, "Failed to send reply"),
        }
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

/// Everything a handler gets for one message.
#[derive(Debug, Clone)]
pub struct MessageContext {
    request: Request,
    response: Response,
}

impl MessageContext {
    pub fn new(request: Request, response: Response) -> Self {
        Self { request, response }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Shorthand for `self.response().respond(text)`.
    pub async fn respond(&self, text: &str) {
        self.response.respond(text).await;
    }

    pub(crate) fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
