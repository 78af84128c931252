//! Waiting for a yes/no answer from one user in one channel.
//!
//! A command registers interest through [`ConfirmationBroker::register`]; the
//! dispatch loop offers every inbound event to the broker before anything
//! else. The first message from that author in that channel resolves the
//! wait and is consumed.

use crate::transport::{ChannelId, InboundEvent, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed,
    Declined,
    TimedOut,
}

type Key = (ChannelId, UserId);

#[derive(Clone, Default)]
pub struct ConfirmationBroker {
    pending: Arc<Mutex<HashMap<Key, (u64, oneshot::Sender<String>)>>>,
    next_id: Arc<AtomicU64>,
}

/// A registered wait. Dropping it withdraws the registration.
pub struct PendingConfirmation {
    key: Key,
    id: u64,
    receiver: oneshot::Receiver<String>,
    broker: ConfirmationBroker,
}

impl ConfirmationBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wait for the next message of `author` in `channel`. A newer
    /// registration for the same pair replaces the older one, which then
    /// resolves as declined.
    pub fn register(&self, channel: ChannelId, author: UserId) -> PendingConfirmation {
        let (sender, receiver) = oneshot::channel();
        let key = (channel, author);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, (id, sender));
        PendingConfirmation {
            key,
            id,
            receiver,
            broker: self.clone(),
        }
    }

    /// Hands `event` to a matching waiter. Returns `true` when it was consumed.
    pub fn offer(&self, event: &InboundEvent) -> bool {
        let key = (event.channel_id, event.author.id);
        let sender = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key);
        match sender {
            Some((_, sender)) => sender.send(event.content.clone()).is_ok(),
            None => false,
        }
    }

    pub fn has_pending(&self, channel: ChannelId, author: UserId) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&(channel, author))
    }
}

impl PendingConfirmation {
    /// Waits up to `timeout`; only a (case-insensitive) `yes` confirms.
    pub async fn wait(mut self, timeout: Duration) -> ConfirmationOutcome {
        match tokio::time::timeout(timeout, &mut self.receiver).await {
            Ok(Ok(answer)) if answer.trim().eq_ignore_ascii_case("yes") => {
                ConfirmationOutcome::Confirmed
            }
            Ok(_) => ConfirmationOutcome::Declined,
            Err(_) => ConfirmationOutcome::TimedOut,
        }
    }
}

impl Drop for PendingConfirmation {
    fn drop(&mut self) {
        let mut pending = self
            .broker
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        // Only remove our own registration, not a newer one for the same key.
        if pending
            .get(&self.key)
            .is_some_and(|(id, _)| *id == self.id)
        {
            pending.remove(&self.key);
        }
    }
}
