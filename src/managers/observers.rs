//! Observer list for tab state broadcasts.
//!
//! Each subscriber owns an unbounded FIFO queue, so every subscriber sees
//! every snapshot in the order mutations were applied. The latest snapshot
//! is also kept in a `watch` cell for non-blocking reads from other tasks.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tracing::debug;

use crate::types::tab::TabsSnapshot;

pub struct Observers {
    subscribers: Vec<UnboundedSender<TabsSnapshot>>,
    latest: watch::Sender<TabsSnapshot>,
}

impl Observers {
    pub fn new() -> Self {
        let (latest, _) = watch::channel(TabsSnapshot::default());
        Self {
            subscribers: Vec::new(),
            latest,
        }
    }

    /// Register a subscriber. The current snapshot is queued first.
    pub fn subscribe(&mut self, current: TabsSnapshot) -> UnboundedReceiver<TabsSnapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(current);
        self.subscribers.push(tx);
        rx
    }

    /// Read-only view of the latest snapshot that never blocks the host.
    pub fn watch(&self) -> watch::Receiver<TabsSnapshot> {
        self.latest.subscribe()
    }

    /// Deliver one snapshot to every live subscriber, pruning dropped ones.
    pub fn broadcast(&mut self, snapshot: TabsSnapshot) {
        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
        if self.subscribers.len() != before {
            debug!(pruned = before - self.subscribers.len(), "dropped closed observers");
        }
        self.latest.send_replace(snapshot);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for Observers {
    fn default() -> Self {
        Self::new()
    }
}
