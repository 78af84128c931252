//! The seam between the bot core and a chat platform.
//!
//! A platform adapter feeds [`InboundEvent`]s into the dispatcher and
//! implements [`ChatTransport`] for replies. [`console`] is the adapter the
//! binary ships with.

pub mod console;

use crate::core::policy::split_message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub display_name: String,
    /// Per-server nickname, when the platform has one.
    pub alias: Option<String>,
    /// Set for messages the bot itself sent; those are never answered.
    pub is_self: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
}

/// The message an inbound event replies to, when the platform could resolve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyReference {
    pub author_name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Platform message id; only used to correlate log lines.
    pub message_id: u64,
    pub channel_id: ChannelId,
    pub author: Author,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub reply_to: Option<ReplyReference>,
}

/// Errors returned by a transport send.
#[derive(Debug)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error: {}", self.0)
    }
}

impl std::error::Error for TransportError {}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends one message. Callers keep `text` within the platform limit.
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), TransportError>;

    /// Shows a "typing" hint. Purely cosmetic.
    async fn typing(&self, channel: ChannelId) -> Result<(), TransportError>;
}

/// Outbound side of one channel: chunks long text and swallows cosmetic failures.
#[derive(Clone)]
pub struct Outbox {
    transport: Arc<dyn ChatTransport>,
    channel: ChannelId,
    max_len: usize,
}

impl Outbox {
    pub fn new(transport: Arc<dyn ChatTransport>, channel: ChannelId, max_len: usize) -> Self {
        Self {
            transport,
            channel,
            max_len,
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Sends `text` as consecutive chunks of at most `max_len` characters.
    pub async fn say(&self, text: impl AsRef<str>) -> Result<(), TransportError> {
        for chunk in split_message(text.as_ref(), self.max_len) {
            self.transport.send(self.channel, &chunk).await?;
        }
        Ok(())
    }

    pub async fn typing(&self) {
        if let Err(err) = self.transport.typing(self.channel).await {
            debug!(channel = %self.channel, error = %err, "typing hint failed");
        }
    }
}
