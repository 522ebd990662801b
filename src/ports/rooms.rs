//! RoomRepository port - registry of live rooms.
//!
//! The relational store for host-owned session history is an external
//! collaborator; this registry only answers "is this code live right now"
//! (collision checks, join validation) and "which live rooms does this
//! host own".

use async_trait::async_trait;

use crate::domain::{GatewayError, Room, SessionCode, TenantId};

/// Errors from room registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomRepositoryError {
    /// Registry backend unreachable.
    #[error("room registry unavailable: {0}")]
    Unavailable(String),
}

impl From<RoomRepositoryError> for GatewayError {
    fn from(err: RoomRepositoryError) -> Self {
        GatewayError::StoreUnavailable(err.to_string())
    }
}

/// Port for the live-room registry.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Insert a room if its code is free. Returns `false` on collision so
    /// the creation flow can re-roll.
    async fn insert(&self, room: &Room) -> Result<bool, RoomRepositoryError>;

    /// Look up a live room by code.
    async fn find(&self, code: &SessionCode) -> Result<Option<Room>, RoomRepositoryError>;

    /// Remove a room from the registry.
    async fn remove(&self, code: &SessionCode) -> Result<(), RoomRepositoryError>;

    /// All live rooms owned by a host identity.
    async fn list_by_host(&self, host: &TenantId) -> Result<Vec<Room>, RoomRepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn RoomRepository) {}

    #[test]
    fn repository_error_converts_to_store_unavailable() {
        let err: GatewayError = RoomRepositoryError::Unavailable("down".to_string()).into();
        assert_eq!(err.code(), "storeUnavailable");
    }
}
