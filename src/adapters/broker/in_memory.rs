//! In-memory broker for tests and single-process deployments.
//!
//! Fan-out is a plain per-channel list of mpsc senders. A subscriber whose
//! queue is full misses events (slow consumers must not stall the bus);
//! closed subscribers are pruned on the next publish or subscribe touching
//! their channel.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::domain::ChannelKey;
use crate::ports::{BrokerError, MessageBroker, Subscription};

const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Single-process pub/sub bus.
#[derive(Debug)]
pub struct InMemoryBroker {
    inner: Mutex<HashMap<ChannelKey, Vec<mpsc::Sender<Vec<u8>>>>>,
    queue_capacity: usize,
}

impl InMemoryBroker {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            queue_capacity,
        }
    }

    /// Number of open subscriptions on a channel.
    pub async fn subscriber_count(&self, channel: &ChannelKey) -> usize {
        let inner = self.inner.lock().await;
        inner
            .get(channel)
            .map(|subs| subs.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, channel: &ChannelKey, payload: Vec<u8>) -> Result<(), BrokerError> {
        let mut inner = self.inner.lock().await;
        let Some(subs) = inner.get_mut(channel) else {
            return Ok(());
        };

        subs.retain(|s| !s.is_closed());

        let mut dropped = 0u64;
        for sub in subs.iter() {
            match sub.try_send(payload.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => dropped += 1,
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }

        if subs.is_empty() {
            inner.remove(channel);
        }

        if dropped > 0 {
            debug!(channel = %channel, dropped, "dropped events for full subscriber queues");
        }

        Ok(())
    }

    async fn subscribe(&self, channel: &ChannelKey) -> Result<Subscription, BrokerError> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);

        let mut inner = self.inner.lock().await;
        let subs = inner.entry(channel.clone()).or_default();
        subs.retain(|s| !s.is_closed());
        subs.push(tx);

        Ok(Subscription::new(channel.clone(), rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionCode;

    fn channel() -> ChannelKey {
        SessionCode::parse("AB12").unwrap().message_channel()
    }

    #[tokio::test]
    async fn subscriber_receives_published_payload() {
        let broker = InMemoryBroker::default();
        let mut sub = broker.subscribe(&channel()).await.unwrap();

        broker.publish(&channel(), b"hello".to_vec()).await.unwrap();

        assert_eq!(sub.recv().await, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn all_subscribers_of_a_channel_receive_the_event() {
        let broker = InMemoryBroker::default();
        let mut a = broker.subscribe(&channel()).await.unwrap();
        let mut b = broker.subscribe(&channel()).await.unwrap();

        broker.publish(&channel(), b"x".to_vec()).await.unwrap();

        assert_eq!(a.recv().await, Some(b"x".to_vec()));
        assert_eq!(b.recv().await, Some(b"x".to_vec()));
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let broker = InMemoryBroker::default();
        let other = SessionCode::parse("ZZ99").unwrap().message_channel();
        let mut sub = broker.subscribe(&channel()).await.unwrap();
        let mut other_sub = broker.subscribe(&other).await.unwrap();

        broker.publish(&channel(), b"one".to_vec()).await.unwrap();
        broker.publish(&other, b"two".to_vec()).await.unwrap();

        assert_eq!(sub.recv().await, Some(b"one".to_vec()));
        assert_eq!(other_sub.recv().await, Some(b"two".to_vec()));
    }

    #[tokio::test]
    async fn publish_order_is_preserved_per_publisher() {
        let broker = InMemoryBroker::default();
        let mut sub = broker.subscribe(&channel()).await.unwrap();

        for i in 0..5u8 {
            broker.publish(&channel(), vec![i]).await.unwrap();
        }
        for i in 0..5u8 {
            assert_eq!(sub.recv().await, Some(vec![i]));
        }
    }

    #[tokio::test]
    async fn dropped_subscription_is_pruned() {
        let broker = InMemoryBroker::default();
        let sub = broker.subscribe(&channel()).await.unwrap();
        assert_eq!(broker.subscriber_count(&channel()).await, 1);

        drop(sub);
        broker.publish(&channel(), b"x".to_vec()).await.unwrap();
        assert_eq!(broker.subscriber_count(&channel()).await, 0);
    }

    #[tokio::test]
    async fn publish_to_channel_without_subscribers_is_noop() {
        let broker = InMemoryBroker::default();
        broker.publish(&channel(), b"x".to_vec()).await.unwrap();
    }
}
