//! Event subscriptions.
//!
//! The event log is the source of truth; the bus only forwards it. Each
//! `publish` sends the records appended since the previous one, so every
//! subscriber sees every record exactly once and in sequence order. A new
//! subscriber first receives the backlog.

use tokio::sync::mpsc;

use crate::triggers::{EventLog, EventRecord};

/// Fan-out of event-log records to unbounded channels.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<EventRecord>>,
    /// Records already forwarded.
    cursor: usize,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a channel. The backlog up to the last publish is sent
    /// immediately; later records arrive with the next `publish`.
    pub fn subscribe(&mut self, log: &EventLog) -> mpsc::UnboundedReceiver<EventRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        for record in log.iter().take(self.cursor) {
            if tx.send(record.clone()).is_err() {
                break;
            }
        }
        self.subscribers.push(tx);
        rx
    }

    /// Forward everything appended since the last call. Returns the number
    /// of records forwarded.
    pub fn publish(&mut self, log: &EventLog) -> usize {
        let fresh: Vec<EventRecord> = log.since(self.cursor).cloned().collect();
        self.cursor = log.len();
        if fresh.is_empty() {
            return 0;
        }
        self.subscribers.retain(|tx| {
            fresh.iter().all(|record| tx.send(record.clone()).is_ok())
        });
        fresh.len()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
