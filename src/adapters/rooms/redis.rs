//! Redis live-room registry for multi-server deployments.
//!
//! Each room is a JSON blob under `rooms:<code>`, claimed with SET NX so
//! code collisions are detected atomically across gateway processes. A
//! per-host set `rooms:host:<identity>` indexes ownership for listing.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::{Room, SessionCode, TenantId};
use crate::ports::{RoomRepository, RoomRepositoryError};

/// Live-room registry backed by Redis.
#[derive(Clone)]
pub struct RedisRoomRepository {
    conn: MultiplexedConnection,
}

impl RedisRoomRepository {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    fn room_key(code: &SessionCode) -> String {
        format!("rooms:{}", code)
    }

    fn host_key(host: &TenantId) -> String {
        format!("rooms:host:{}", host)
    }
}

#[async_trait]
impl RoomRepository for RedisRoomRepository {
    async fn insert(&self, room: &Room) -> Result<bool, RoomRepositoryError> {
        let json = serde_json::to_string(room)
            .map_err(|e| RoomRepositoryError::Unavailable(e.to_string()))?;
        let mut conn = self.conn.clone();

        let claimed: bool = redis::cmd("SET")
            .arg(Self::room_key(&room.code))
            .arg(&json)
            .arg("NX")
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(|e| RoomRepositoryError::Unavailable(e.to_string()))?
            .is_some();

        if claimed {
            conn.sadd::<_, _, ()>(Self::host_key(&room.host), room.code.as_str())
                .await
                .map_err(|e: redis::RedisError| RoomRepositoryError::Unavailable(e.to_string()))?;
        }

        Ok(claimed)
    }

    async fn find(&self, code: &SessionCode) -> Result<Option<Room>, RoomRepositoryError> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn
            .get(Self::room_key(code))
            .await
            .map_err(|e: redis::RedisError| RoomRepositoryError::Unavailable(e.to_string()))?;

        match json {
            Some(json) => {
                let room = serde_json::from_str(&json)
                    .map_err(|e| RoomRepositoryError::Unavailable(e.to_string()))?;
                Ok(Some(room))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, code: &SessionCode) -> Result<(), RoomRepositoryError> {
        // Fetch first so the host index entry can be dropped too.
        let room = self.find(code).await?;
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(Self::room_key(code))
            .await
            .map_err(|e: redis::RedisError| RoomRepositoryError::Unavailable(e.to_string()))?;

        if let Some(room) = room {
            conn.srem::<_, _, ()>(Self::host_key(&room.host), room.code.as_str())
                .await
                .map_err(|e: redis::RedisError| RoomRepositoryError::Unavailable(e.to_string()))?;
        }

        Ok(())
    }

    async fn list_by_host(&self, host: &TenantId) -> Result<Vec<Room>, RoomRepositoryError> {
        let mut conn = self.conn.clone();
        let codes: Vec<String> = conn
            .smembers(Self::host_key(host))
            .await
            .map_err(|e: redis::RedisError| RoomRepositoryError::Unavailable(e.to_string()))?;

        let mut rooms = Vec::with_capacity(codes.len());
        for raw in codes {
            let Ok(code) = SessionCode::parse(&raw) else {
                continue;
            };
            // Index entries can outlive rooms briefly; skip the stale ones.
            if let Some(room) = self.find(&code).await? {
                rooms.push(room);
            }
        }
        rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rooms)
    }
}

impl std::fmt::Debug for RedisRoomRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRoomRepository").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    // Redis integration tests require a running Redis instance and are
    // typically run separately from unit tests.
}
