//! In-memory presence store for testing and single-process deployments.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{SessionCode, TenantId};
use crate::ports::{PresenceChange, PresenceError, PresenceStore};

/// Presence store backed by a process-local map of tenant sets.
#[derive(Debug, Default)]
pub struct InMemoryPresenceStore {
    rooms: RwLock<HashMap<SessionCode, HashSet<TenantId>>>,
}

impl InMemoryPresenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceStore for InMemoryPresenceStore {
    async fn join(
        &self,
        code: &SessionCode,
        tenant: &TenantId,
    ) -> Result<PresenceChange, PresenceError> {
        let mut rooms = self.rooms.write().await;
        let set = rooms.entry(code.clone()).or_default();
        let changed = set.insert(tenant.clone());
        Ok(PresenceChange {
            changed,
            count: set.len() as u64,
        })
    }

    async fn leave(
        &self,
        code: &SessionCode,
        tenant: &TenantId,
    ) -> Result<PresenceChange, PresenceError> {
        let mut rooms = self.rooms.write().await;
        let Some(set) = rooms.get_mut(code) else {
            return Ok(PresenceChange {
                changed: false,
                count: 0,
            });
        };
        let changed = set.remove(tenant);
        let count = set.len() as u64;
        if set.is_empty() {
            rooms.remove(code);
        }
        Ok(PresenceChange { changed, count })
    }

    async fn count(&self, code: &SessionCode) -> Result<u64, PresenceError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(code).map(|s| s.len() as u64).unwrap_or(0))
    }

    async fn clear(&self, code: &SessionCode) -> Result<(), PresenceError> {
        let mut rooms = self.rooms.write().await;
        rooms.remove(code);
        Ok(())
    }

    async fn ping(&self) -> Result<(), PresenceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> SessionCode {
        SessionCode::parse("AB12").unwrap()
    }

    fn tenant(name: &str) -> TenantId {
        TenantId::new(name).unwrap()
    }

    #[tokio::test]
    async fn join_grows_count_once_per_identity() {
        let store = InMemoryPresenceStore::new();

        let first = store.join(&code(), &tenant("alice")).await.unwrap();
        assert!(first.changed);
        assert_eq!(first.count, 1);

        // Same identity again: no change, count stable.
        let again = store.join(&code(), &tenant("alice")).await.unwrap();
        assert!(!again.changed);
        assert_eq!(again.count, 1);

        let second = store.join(&code(), &tenant("bob")).await.unwrap();
        assert!(second.changed);
        assert_eq!(second.count, 2);
    }

    #[tokio::test]
    async fn leave_is_idempotent() {
        let store = InMemoryPresenceStore::new();
        store.join(&code(), &tenant("alice")).await.unwrap();
        store.join(&code(), &tenant("bob")).await.unwrap();

        let first = store.leave(&code(), &tenant("alice")).await.unwrap();
        assert!(first.changed);
        assert_eq!(first.count, 1);

        let again = store.leave(&code(), &tenant("alice")).await.unwrap();
        assert!(!again.changed);
        assert_eq!(again.count, 1);
    }

    #[tokio::test]
    async fn leave_from_unknown_room_reports_no_change() {
        let store = InMemoryPresenceStore::new();
        let change = store.leave(&code(), &tenant("ghost")).await.unwrap();
        assert!(!change.changed);
        assert_eq!(change.count, 0);
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let store = InMemoryPresenceStore::new();
        let other = SessionCode::parse("ZZ99").unwrap();

        store.join(&code(), &tenant("alice")).await.unwrap();
        store.join(&other, &tenant("bob")).await.unwrap();

        assert_eq!(store.count(&code()).await.unwrap(), 1);
        assert_eq!(store.count(&other).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn clear_drops_the_whole_set() {
        let store = InMemoryPresenceStore::new();
        store.join(&code(), &tenant("alice")).await.unwrap();
        store.join(&code(), &tenant("bob")).await.unwrap();

        store.clear(&code()).await.unwrap();
        assert_eq!(store.count(&code()).await.unwrap(), 0);
    }
}
