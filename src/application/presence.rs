//! Presence tracking: the authoritative tenant set plus count fan-out.
//!
//! Joins and leaves mutate the shared tenant set first, then publish the
//! new count on the room's count channel — but only when the set actually
//! changed. Duplicate joins and repeated leaves are absorbed without
//! emitting anything, so every published count reflects a real membership
//! transition.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{GatewayError, ServerPayload, SessionCode, TenantId};
use crate::ports::{MessageBroker, PresenceChange, PresenceStore};

/// Application service owning room membership.
#[derive(Clone)]
pub struct PresenceTracker {
    store: Arc<dyn PresenceStore>,
    broker: Arc<dyn MessageBroker>,
}

impl PresenceTracker {
    pub fn new(store: Arc<dyn PresenceStore>, broker: Arc<dyn MessageBroker>) -> Self {
        Self { store, broker }
    }

    /// Add a tenant to the room, publishing the new count if membership
    /// actually changed.
    ///
    /// A join is denied as a whole or not at all: if the count cannot be
    /// published, the membership write is undone before the error goes out,
    /// so a denied join never leaves the tenant in the shared set.
    pub async fn join(
        &self,
        code: &SessionCode,
        tenant: &TenantId,
    ) -> Result<PresenceChange, GatewayError> {
        let change = self.store.join(code, tenant).await?;
        if change.changed {
            debug!(code = %code, tenant = %tenant, count = change.count, "tenant joined");
            if let Err(e) = self.publish_count(code, change.count).await {
                if let Err(undo) = self.store.leave(code, tenant).await {
                    warn!(code = %code, tenant = %tenant, error = %undo, "join rollback failed");
                }
                return Err(e);
            }
        }
        Ok(change)
    }

    /// Remove a tenant from the room, publishing the new count if
    /// membership actually changed.
    pub async fn leave(
        &self,
        code: &SessionCode,
        tenant: &TenantId,
    ) -> Result<PresenceChange, GatewayError> {
        let change = self.store.leave(code, tenant).await?;
        if change.changed {
            debug!(code = %code, tenant = %tenant, count = change.count, "tenant left");
            self.publish_count(code, change.count).await?;
        }
        Ok(change)
    }

    /// Current tenant count for a room.
    pub async fn count(&self, code: &SessionCode) -> Result<u64, GatewayError> {
        Ok(self.store.count(code).await?)
    }

    /// Drop the room's whole tenant set. Used when a room closes.
    pub async fn clear(&self, code: &SessionCode) -> Result<(), GatewayError> {
        self.store.clear(code).await?;
        Ok(())
    }

    /// Reachability of the backing store.
    pub async fn ping(&self) -> Result<(), GatewayError> {
        self.store.ping().await?;
        Ok(())
    }

    async fn publish_count(&self, code: &SessionCode, count: u64) -> Result<(), GatewayError> {
        let event = serde_json::to_vec(&ServerPayload::TenantCount { value: count })
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        self.broker
            .publish(&code.tenant_count_channel(), event)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceTracker").finish_non_exhaustive()
    }
}
