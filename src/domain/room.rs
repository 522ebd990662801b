//! Room aggregate: a live group session addressed by its code.

use serde::{Deserialize, Serialize};

use super::{SessionCode, TenantId, Timestamp};

/// A live group session.
///
/// The tenant set and count are not stored here; they live in the shared
/// store under the room's derived keys and are owned by the presence
/// tracker. A `Room` only carries the registry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Identifying code; immutable for the room's lifetime.
    pub code: SessionCode,

    /// Identity authorized to send role-restricted payload kinds.
    pub host: TenantId,

    /// When the room was created.
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(code: SessionCode, host: TenantId) -> Self {
        Self {
            code,
            host,
            created_at: Timestamp::now(),
        }
    }

    /// Whether the given identity is this room's host.
    ///
    /// Host-only actions require this to hold at the moment the action is
    /// processed; the result is never cached across payloads.
    pub fn is_host(&self, identity: &TenantId) -> bool {
        &self.host == identity
    }
}
