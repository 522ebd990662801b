//! In-memory live-room registry for testing and single-process deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Room, SessionCode, TenantId};
use crate::ports::{RoomRepository, RoomRepositoryError};

/// Live-room registry backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<SessionCode, Room>>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn insert(&self, room: &Room) -> Result<bool, RoomRepositoryError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room.code) {
            return Ok(false);
        }
        rooms.insert(room.code.clone(), room.clone());
        Ok(true)
    }

    async fn find(&self, code: &SessionCode) -> Result<Option<Room>, RoomRepositoryError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(code).cloned())
    }

    async fn remove(&self, code: &SessionCode) -> Result<(), RoomRepositoryError> {
        let mut rooms = self.rooms.write().await;
        rooms.remove(code);
        Ok(())
    }

    async fn list_by_host(&self, host: &TenantId) -> Result<Vec<Room>, RoomRepositoryError> {
        let rooms = self.rooms.read().await;
        let mut owned: Vec<Room> = rooms.values().filter(|r| r.is_host(host)).cloned().collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(code: &str, host: &str) -> Room {
        Room::new(
            SessionCode::parse(code).unwrap(),
            TenantId::new(host).unwrap(),
        )
    }

    #[tokio::test]
    async fn insert_then_find() {
        let repo = InMemoryRoomRepository::new();
        let room = room("AB12", "alice");

        assert!(repo.insert(&room).await.unwrap());
        let found = repo.find(&room.code).await.unwrap();
        assert_eq!(found, Some(room));
    }

    #[tokio::test]
    async fn insert_reports_collision() {
        let repo = InMemoryRoomRepository::new();
        let first = room("AB12", "alice");
        let second = room("AB12", "bob");

        assert!(repo.insert(&first).await.unwrap());
        assert!(!repo.insert(&second).await.unwrap());

        // Collision leaves the original untouched.
        let found = repo.find(&first.code).await.unwrap().unwrap();
        assert_eq!(found.host, first.host);
    }

    #[tokio::test]
    async fn remove_frees_the_code() {
        let repo = InMemoryRoomRepository::new();
        let room = room("AB12", "alice");

        repo.insert(&room).await.unwrap();
        repo.remove(&room.code).await.unwrap();

        assert_eq!(repo.find(&room.code).await.unwrap(), None);
        assert!(repo.insert(&room).await.unwrap());
    }

    #[tokio::test]
    async fn list_by_host_filters_ownership() {
        let repo = InMemoryRoomRepository::new();
        repo.insert(&room("AB12", "alice")).await.unwrap();
        repo.insert(&room("CD34", "alice")).await.unwrap();
        repo.insert(&room("EF56", "bob")).await.unwrap();

        let owned = repo
            .list_by_host(&TenantId::new("alice").unwrap())
            .await
            .unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|r| r.host.as_str() == "alice"));
    }
}
