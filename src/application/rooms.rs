//! Room lifecycle: code issue, lookup, host-only close, session listing.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{CodeGenerator, Room, ServerPayload, SessionCode, TenantId};
use crate::ports::{BrokerError, MessageBroker, PresenceError, RoomRepository, RoomRepositoryError};

use super::presence::PresenceTracker;

/// Errors from room lifecycle operations.
#[derive(Debug, Error)]
pub enum RoomServiceError {
    /// Every generation attempt collided with a live code.
    #[error("could not allocate a unique session code")]
    CodeSpaceExhausted,

    /// No live room under the supplied code.
    #[error("no live room for code \"{0}\"")]
    NotFound(String),

    /// Close requested by an identity that is not the room's host.
    #[error("only the host may close the room")]
    NotHost,

    /// Registry, presence store, or bus unreachable.
    #[error("room service unavailable: {0}")]
    Unavailable(String),
}

impl From<RoomRepositoryError> for RoomServiceError {
    fn from(err: RoomRepositoryError) -> Self {
        RoomServiceError::Unavailable(err.to_string())
    }
}

impl From<PresenceError> for RoomServiceError {
    fn from(err: PresenceError) -> Self {
        RoomServiceError::Unavailable(err.to_string())
    }
}

impl From<BrokerError> for RoomServiceError {
    fn from(err: BrokerError) -> Self {
        RoomServiceError::Unavailable(err.to_string())
    }
}

/// Application service owning the room lifecycle.
#[derive(Clone)]
pub struct RoomService {
    rooms: Arc<dyn RoomRepository>,
    broker: Arc<dyn MessageBroker>,
    presence: PresenceTracker,
    generator: CodeGenerator,
    max_code_attempts: u32,
}

impl RoomService {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        broker: Arc<dyn MessageBroker>,
        presence: PresenceTracker,
        generator: CodeGenerator,
        max_code_attempts: u32,
    ) -> Self {
        Self {
            rooms,
            broker,
            presence,
            generator,
            max_code_attempts,
        }
    }

    /// Create a room for a host, re-rolling the code on collision.
    pub async fn create(&self, host: TenantId) -> Result<Room, RoomServiceError> {
        for attempt in 1..=self.max_code_attempts {
            let code = self.generator.generate();
            let room = Room::new(code, host.clone());
            if self.rooms.insert(&room).await? {
                info!(code = %room.code, host = %room.host, "room created");
                return Ok(room);
            }
            warn!(code = %room.code, attempt, "session code collision, re-rolling");
        }
        Err(RoomServiceError::CodeSpaceExhausted)
    }

    /// Look up a live room.
    pub async fn find(&self, code: &SessionCode) -> Result<Room, RoomServiceError> {
        self.rooms
            .find(code)
            .await?
            .ok_or_else(|| RoomServiceError::NotFound(code.to_string()))
    }

    /// Close a room. Host-only: the close is broadcast as an `end` payload
    /// so every connection can shut down, then the registry entry and the
    /// tenant set are dropped.
    pub async fn close(
        &self,
        code: &SessionCode,
        requester: &TenantId,
    ) -> Result<(), RoomServiceError> {
        let room = self.find(code).await?;
        if !room.is_host(requester) {
            return Err(RoomServiceError::NotHost);
        }

        let end = ServerPayload::Broadcast {
            from: room.host.to_string(),
            payload: serde_json::json!({"kind": "end"}),
        };
        let bytes =
            serde_json::to_vec(&end).map_err(|e| RoomServiceError::Unavailable(e.to_string()))?;
        self.broker.publish(&code.message_channel(), bytes).await?;

        self.rooms.remove(code).await?;
        self.presence
            .clear(code)
            .await
            .map_err(|e| RoomServiceError::Unavailable(e.to_string()))?;

        info!(code = %code, "room closed");
        Ok(())
    }

    /// All live rooms owned by a host.
    pub async fn list_by_host(&self, host: &TenantId) -> Result<Vec<Room>, RoomServiceError> {
        Ok(self.rooms.list_by_host(host).await?)
    }
}

impl std::fmt::Debug for RoomService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomService")
            .field("max_code_attempts", &self.max_code_attempts)
            .finish_non_exhaustive()
    }
}
