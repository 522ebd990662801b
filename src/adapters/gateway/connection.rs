//! Local connection registry.
//!
//! Tracks the WebSocket connections owned by this process, keyed by a
//! generated id. Connections are addressed by id only, never by raw task
//! or socket references. The authoritative room membership lives in the
//! shared presence store; this registry exists for local bookkeeping
//! (logging, shutdown).

use std::collections::HashMap;
use std::fmt;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{SessionCode, TenantId};

/// Identifier of one WebSocket connection on this process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct ConnectionInfo {
    code: SessionCode,
    identity: TenantId,
}

/// Registry of this process's live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionInfo>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: ConnectionId, code: SessionCode, identity: TenantId) {
        let mut connections = self.connections.write().await;
        connections.insert(id, ConnectionInfo { code, identity });
    }

    /// Idempotent; unknown ids are ignored.
    pub async fn unregister(&self, id: &ConnectionId) {
        let mut connections = self.connections.write().await;
        connections.remove(id);
    }

    /// Total live connections on this process.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Identities connected to a room through this process.
    pub async fn identities_in(&self, code: &SessionCode) -> Vec<TenantId> {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|info| &info.code == code)
            .map(|info| info.identity.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> SessionCode {
        SessionCode::parse(s).unwrap()
    }

    fn tenant(s: &str) -> TenantId {
        TenantId::new(s).unwrap()
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[tokio::test]
    async fn register_and_unregister() {
        let registry = ConnectionRegistry::new();
        let id = ConnectionId::new();

        registry
            .register(id.clone(), code("AB12"), tenant("alice"))
            .await;
        assert_eq!(registry.len().await, 1);

        registry.unregister(&id).await;
        assert!(registry.is_empty().await);

        // Unknown ids are ignored.
        registry.unregister(&id).await;
    }

    #[tokio::test]
    async fn identities_filtered_by_room() {
        let registry = ConnectionRegistry::new();
        registry
            .register(ConnectionId::new(), code("AB12"), tenant("alice"))
            .await;
        registry
            .register(ConnectionId::new(), code("AB12"), tenant("bob"))
            .await;
        registry
            .register(ConnectionId::new(), code("ZZ99"), tenant("carol"))
            .await;

        let mut in_room = registry.identities_in(&code("AB12")).await;
        in_room.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(in_room, vec![tenant("alice"), tenant("bob")]);
    }
}
