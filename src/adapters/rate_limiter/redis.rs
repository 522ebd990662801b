//! Redis-backed rate limiter implementation for production deployments.
//!
//! Uses a simple fixed-window counter algorithm with Redis INCR + EXPIRE.
//! Suitable for multi-server deployments.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::config::RateLimitConfig;
use crate::domain::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

/// Redis-backed rate limiter for production multi-server deployments.
///
/// Uses a fixed-window counter algorithm:
/// 1. INCR the key to increment the counter
/// 2. If count is 1, set EXPIRE for the window duration
/// 3. If count > limit, deny the request
///
/// Requests can briefly exceed the budget at window boundaries; that is a
/// known property of fixed windows and accepted here.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    config: RateLimitConfig,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, config: RateLimitConfig) -> Self {
        Self { conn, config }
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let storage_key = key.storage_key();
        let budget = self.config.budget_for(key.route);
        let (limit, window_secs) = (budget.requests_per_window, budget.window_secs);

        let mut conn = self.conn.clone();

        // Atomic increment
        let count: i64 = conn
            .incr(&storage_key, 1_i64)
            .await
            .map_err(|e: redis::RedisError| RateLimitError::Unavailable(e.to_string()))?;

        // Set expiry on first request in window
        if count == 1 {
            conn.expire::<_, ()>(&storage_key, window_secs as i64)
                .await
                .map_err(|e: redis::RedisError| RateLimitError::Unavailable(e.to_string()))?;
        }

        // Get TTL for reset time
        let ttl: i64 = conn
            .ttl(&storage_key)
            .await
            .map_err(|e: redis::RedisError| RateLimitError::Unavailable(e.to_string()))?;

        let now = Timestamp::now().as_unix_secs();
        let reset_secs = if ttl > 0 { ttl as u64 } else { window_secs as u64 };
        let reset_at = Timestamp::from_unix_secs(now + reset_secs);

        if count as u32 > limit {
            let retry_after = (reset_secs as u32).max(1);
            return Ok(RateLimitResult::Denied(RateLimitDenied {
                limit,
                retry_after_secs: Some(retry_after),
            }));
        }

        let remaining = limit.saturating_sub(count as u32);

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit,
            remaining,
            reset_at,
            window_secs,
        }))
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        let storage_key = key.storage_key();
        let budget = self.config.budget_for(key.route);
        let (limit, window_secs) = (budget.requests_per_window, budget.window_secs);

        let mut conn = self.conn.clone();

        let count: Option<i64> = conn
            .get(&storage_key)
            .await
            .map_err(|e: redis::RedisError| RateLimitError::Unavailable(e.to_string()))?;
        let count = count.unwrap_or(0) as u32;
        let remaining = limit.saturating_sub(count);

        let ttl: i64 = conn
            .ttl(&storage_key)
            .await
            .map_err(|e: redis::RedisError| RateLimitError::Unavailable(e.to_string()))?;

        let now = Timestamp::now().as_unix_secs();
        let reset_secs = if ttl > 0 { ttl as u64 } else { window_secs as u64 };
        let reset_at = Timestamp::from_unix_secs(now + reset_secs);

        Ok(RateLimitStatus {
            limit,
            remaining,
            reset_at,
            window_secs,
        })
    }

    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&key.storage_key())
            .await
            .map_err(|e: redis::RedisError| RateLimitError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
