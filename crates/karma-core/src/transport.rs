//! Outbound side of the chat transport.
//!
//! Connecting, presence and roster sync belong to the transport itself; the
//! bot only needs to post text back into a channel.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::TransportResult;

/// A channel the bot can reply through.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Posts `text` into `channel`.
    async fn respond(&self, channel: &str, text: &str) -> TransportResult<()>;
}

/// A boxed Transport trait object.
pub type BoxedTransport = Arc<dyn Transport>;

/// A transport that keeps every reply in memory instead of sending it.
///
/// Useful for embedding the dispatcher somewhere replies are collected
/// afterwards, and for tests.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all `(channel, text)` pairs sent so far, oldest first.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    /// Returns just the reply texts, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, t)| t.clone()).collect()
    }

    /// Drops everything recorded so far.
    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn respond(&self, channel: &str, text: &str) -> TransportResult<()> {
        self.sent.lock().push((channel.to_string(), text.to_string()));
        Ok(())
    }
}
