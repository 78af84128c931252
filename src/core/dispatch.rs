//! The event loop: one router, one sequential worker per channel.
//!
//! The router filters events, hands confirmation answers to their waiters and
//! queues everything else on the owning channel's worker. Workers handle their
//! queue strictly in arrival order, so turns within a channel never reorder,
//! while a slow completion in one channel does not hold up another.

use crate::core::relay::Relay;
use crate::transport::{ChannelId, InboundEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub async fn run_dispatch_loop(
    relay: Arc<Relay>,
    mut events: mpsc::Receiver<InboundEvent>,
    shutdown: CancellationToken,
) {
    let mut workers: HashMap<ChannelId, mpsc::UnboundedSender<InboundEvent>> = HashMap::new();
    let mut tasks = JoinSet::new();

    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        if !relay.accepts(&event) {
            continue;
        }

        if relay.confirmations.offer(&event) {
            debug!(channel = %event.channel_id, author = %event.author.id, "confirmation answer received");
            continue;
        }

        let channel = event.channel_id;
        let worker = workers.entry(channel).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tasks.spawn(channel_worker(Arc::clone(&relay), channel, rx));
            tx
        });
        // A worker only stops once its sender is dropped, which happens below.
        let _ = worker.send(event);
    }

    info!(channels = workers.len(), "dispatch loop stopping");
    drop(workers);
    // Let in-flight turns finish unless shutdown was requested outright.
    if shutdown.is_cancelled() {
        tasks.abort_all();
    }
    while tasks.join_next().await.is_some() {}
}

async fn channel_worker(
    relay: Arc<Relay>,
    channel: ChannelId,
    mut queue: mpsc::UnboundedReceiver<InboundEvent>,
) {
    debug!(%channel, "channel worker started");
    while let Some(event) = queue.recv().await {
        relay.handle_event(event).await;
    }
    debug!(%channel, "channel worker stopped");
}
