//! Redis presence store for multi-server deployments.
//!
//! The tenant set lives under `room:<code>:tenants` as a Redis set, so
//! every gateway process sees the same membership. SADD/SREM return
//! whether the set actually changed, which drives the idempotent
//! join/leave semantics.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::{SessionCode, TenantId};
use crate::ports::{PresenceChange, PresenceError, PresenceStore};

/// Presence store backed by Redis sets.
#[derive(Clone)]
pub struct RedisPresenceStore {
    conn: MultiplexedConnection,
}

impl RedisPresenceStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl PresenceStore for RedisPresenceStore {
    async fn join(
        &self,
        code: &SessionCode,
        tenant: &TenantId,
    ) -> Result<PresenceChange, PresenceError> {
        let key = code.tenant_set_key();
        let mut conn = self.conn.clone();

        let added: i64 = conn
            .sadd(key.as_str(), tenant.as_str())
            .await
            .map_err(|e: redis::RedisError| PresenceError::Unavailable(e.to_string()))?;
        let count: u64 = conn
            .scard(key.as_str())
            .await
            .map_err(|e: redis::RedisError| PresenceError::Unavailable(e.to_string()))?;

        Ok(PresenceChange {
            changed: added > 0,
            count,
        })
    }

    async fn leave(
        &self,
        code: &SessionCode,
        tenant: &TenantId,
    ) -> Result<PresenceChange, PresenceError> {
        let key = code.tenant_set_key();
        let mut conn = self.conn.clone();

        let removed: i64 = conn
            .srem(key.as_str(), tenant.as_str())
            .await
            .map_err(|e: redis::RedisError| PresenceError::Unavailable(e.to_string()))?;
        let count: u64 = conn
            .scard(key.as_str())
            .await
            .map_err(|e: redis::RedisError| PresenceError::Unavailable(e.to_string()))?;

        Ok(PresenceChange {
            changed: removed > 0,
            count,
        })
    }

    async fn count(&self, code: &SessionCode) -> Result<u64, PresenceError> {
        let mut conn = self.conn.clone();
        conn.scard(code.tenant_set_key().as_str())
            .await
            .map_err(|e: redis::RedisError| PresenceError::Unavailable(e.to_string()))
    }

    async fn clear(&self, code: &SessionCode) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(code.tenant_set_key().as_str())
            .await
            .map_err(|e: redis::RedisError| PresenceError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| PresenceError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisPresenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPresenceStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    // Redis integration tests require a running Redis instance and are
    // typically run separately from unit tests.
}
