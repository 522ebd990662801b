//! PresenceStore port - authoritative tenant set per room.
//!
//! The tenant set lives in the shared store under the room's
//! `room:<code>:tenants` key and is the single source of truth across
//! however many gateway processes are running. Membership is idempotent
//! and count updates are commutative, so no consensus is needed; staleness
//! between a local view and the store is bounded by pub/sub latency and is
//! an accepted inconsistency window.

use async_trait::async_trait;

use crate::domain::{GatewayError, SessionCode, TenantId};

/// Errors from presence operations.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// Store backend unreachable.
    #[error("presence store unavailable: {0}")]
    Unavailable(String),
}

impl From<PresenceError> for GatewayError {
    fn from(err: PresenceError) -> Self {
        GatewayError::StoreUnavailable(err.to_string())
    }
}

/// Outcome of a join or leave mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceChange {
    /// Whether the set actually changed. Joining an already-present
    /// identity (or leaving an absent one) reports `false`.
    pub changed: bool,

    /// Tenant count after the operation. Never negative by construction.
    pub count: u64,
}

/// Port for the shared tenant set.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Add a tenant to the room's set. Idempotent.
    async fn join(
        &self,
        code: &SessionCode,
        tenant: &TenantId,
    ) -> Result<PresenceChange, PresenceError>;

    /// Remove a tenant from the room's set. Idempotent.
    async fn leave(
        &self,
        code: &SessionCode,
        tenant: &TenantId,
    ) -> Result<PresenceChange, PresenceError>;

    /// Current tenant count for the room.
    async fn count(&self, code: &SessionCode) -> Result<u64, PresenceError>;

    /// Drop the whole tenant set. Used when a room closes.
    async fn clear(&self, code: &SessionCode) -> Result<(), PresenceError>;

    /// Reachability probe for the backing store. Health checks use this
    /// instead of touching any room key.
    async fn ping(&self) -> Result<(), PresenceError>;
}
