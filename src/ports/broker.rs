//! MessageBroker port - publish/subscribe fan-out between gateway processes.
//!
//! The gateway never talks to a concrete bus; it publishes to and
//! subscribes from room channels through this port. The Redis adapter
//! carries events across processes; the in-memory adapter serves tests and
//! single-process deployments.
//!
//! Ordering guarantee: within one channel, delivery preserves publish
//! order for a single publisher. No total order is guaranteed across
//! concurrent publishers, and none across channels.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{ChannelKey, GatewayError};

/// Errors from broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// Bus backend unreachable.
    #[error("broker unavailable: {0}")]
    Unavailable(String),
}

impl From<BrokerError> for GatewayError {
    fn from(err: BrokerError) -> Self {
        GatewayError::StoreUnavailable(err.to_string())
    }
}

/// A live subscription to one channel.
///
/// Dropping the subscription unsubscribes: adapters detect the closed
/// receiver and release the underlying resources. There is no explicit
/// unsubscribe call, so cleanup cannot be forgotten on any exit path.
#[derive(Debug)]
pub struct Subscription {
    channel: ChannelKey,
    receiver: mpsc::Receiver<Vec<u8>>,
}

impl Subscription {
    pub fn new(channel: ChannelKey, receiver: mpsc::Receiver<Vec<u8>>) -> Self {
        Self { channel, receiver }
    }

    pub fn channel(&self) -> &ChannelKey {
        &self.channel
    }

    /// Next event on the channel; `None` once the publisher side is gone.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.receiver.recv().await
    }
}

/// Port for the shared publish/subscribe bus.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish raw payload bytes on a channel.
    async fn publish(&self, channel: &ChannelKey, payload: Vec<u8>) -> Result<(), BrokerError>;

    /// Subscribe to a channel, receiving every payload published after the
    /// subscription is established (by this process or any other sharing
    /// the bus).
    async fn subscribe(&self, channel: &ChannelKey) -> Result<Subscription, BrokerError>;
}
