//! Storage-level change notifications for vote rows.
//!
//! Repositories publish a [`ChangeEvent`] after every committed vote
//! mutation. Observers (the live results channel) subscribe, filter by
//! poll, and re-read storage; events carry no row data on purpose —
//! the database stays the single source of truth and a missed event
//! only delays a recompute, never corrupts one.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Kind of committed mutation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeOp {
    /// A response set was inserted.
    Insert,
    /// A response set was deleted.
    Delete,
    /// A response set was replaced in one transaction.
    Replace,
}

/// A committed change to the vote rows of one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened.
    pub op: ChangeOp,
    /// The poll whose vote rows changed.
    pub poll_id: String,
}

/// Broadcast feed of vote-row changes.
///
/// Cloning is cheap; all clones publish into the same channel.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Create a feed with the given event buffer capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a committed change. Dropped silently when nobody is
    /// subscribed.
    pub fn publish(&self, event: ChangeEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::trace!(?event, "No subscribers for change event");
        }
    }

    /// Subscribe to all future change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let feed = ChangeFeed::new(8);
        let mut rx = feed.subscribe();

        feed.publish(ChangeEvent {
            op: ChangeOp::Insert,
            poll_id: "p1".to_string(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.op, ChangeOp::Insert);
        assert_eq!(event.poll_id, "p1");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let feed = ChangeFeed::new(8);
        // Must not panic or error
        feed.publish(ChangeEvent {
            op: ChangeOp::Delete,
            poll_id: "p1".to_string(),
        });
        assert_eq!(feed.subscriber_count(), 0);
    }
}
