//! Fan-out of the running configuration to push subscribers.

use tokio::sync::mpsc::{self, error::TrySendError};

const SUBSCRIBER_CAPACITY: usize = 16;

/// Non-blocking publisher of running-config snapshots.
///
/// A full subscriber misses the update; a closed one is forgotten.
#[derive(Debug, Default)]
pub struct Broadcaster {
    subscribers: Vec<mpsc::Sender<String>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and hand it `current` straight away.
    pub fn subscribe(&mut self, current: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        // A fresh channel always has room for the first message.
        let _ = tx.try_send(current.to_string());
        self.subscribers.push(tx);
        tracing::debug!(subscribers = self.subscribers.len(), "push subscriber added");
        rx
    }

    pub fn publish(&mut self, json: &str) {
        self.subscribers.retain(|tx| match tx.try_send(json.to_string()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("push subscriber is full, update dropped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("push subscriber closed, removing");
                false
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_gets_current_then_updates() {
        let mut broadcaster = Broadcaster::new();
        let mut rx = broadcaster.subscribe("{}");
        broadcaster.publish(r#"{"a":1}"#);

        assert_eq!(rx.recv().await.unwrap(), "{}");
        assert_eq!(rx.recv().await.unwrap(), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn closed_subscriber_is_removed() {
        let mut broadcaster = Broadcaster::new();
        let rx = broadcaster.subscribe("{}");
        let mut live = broadcaster.subscribe("{}");
        drop(rx);

        broadcaster.publish("x");
        assert_eq!(broadcaster.subscriber_count(), 1);
        assert_eq!(live.recv().await.unwrap(), "{}");
        assert_eq!(live.recv().await.unwrap(), "x");
    }

    #[tokio::test]
    async fn full_subscriber_does_not_block() {
        let mut broadcaster = Broadcaster::new();
        let mut rx = broadcaster.subscribe("0");
        for i in 1..=SUBSCRIBER_CAPACITY * 2 {
            broadcaster.publish(&i.to_string());
        }
        assert_eq!(broadcaster.subscriber_count(), 1);

        let mut received = 0;
        while let Ok(_msg) = rx.try_recv() {
            received += 1;
        }
        assert_eq!(received, SUBSCRIBER_CAPACITY);
    }
}
