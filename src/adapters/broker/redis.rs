//! Redis pub/sub broker for multi-server deployments.
//!
//! Publishing goes through a shared multiplexed connection. Each
//! subscription owns a dedicated pub/sub connection plus a forwarding
//! task; dropping the subscription ends the task and closes the
//! connection, which is the only unsubscribe path.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::ChannelKey;
use crate::ports::{BrokerError, MessageBroker, Subscription};

const SUBSCRIPTION_QUEUE_CAPACITY: usize = 128;

/// Redis-backed pub/sub bus.
#[derive(Clone)]
pub struct RedisBroker {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl RedisBroker {
    /// Connect to Redis and prepare the shared publish connection.
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client =
            redis::Client::open(url).map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        Ok(Self { client, conn })
    }
}

#[async_trait]
impl MessageBroker for RedisBroker {
    async fn publish(&self, channel: &ChannelKey, payload: Vec<u8>) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        redis::cmd("PUBLISH")
            .arg(channel.as_str())
            .arg(payload)
            .query_async::<_, i64>(&mut conn)
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(&self, channel: &ChannelKey) -> Result<Subscription, BrokerError> {
        let mut pubsub = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?
            .into_pubsub();
        pubsub
            .subscribe(channel.as_str())
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_QUEUE_CAPACITY);
        let forwarded_channel = channel.clone();

        tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload = msg.get_payload_bytes().to_vec();
                match tx.try_send(payload) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(channel = %forwarded_channel, "subscriber queue full, dropping event");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
            debug!(channel = %forwarded_channel, "pub/sub forwarding task ended");
        });

        Ok(Subscription::new(channel.clone(), rx))
    }
}

impl std::fmt::Debug for RedisBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroker").finish_non_exhaustive()
    }
}
