//! RateLimiter port - request budgets per identity and route.
//!
//! Both adapters implement a fixed-window counter: the first request in a
//! window starts it, the (N+1)-th request within the window is denied with
//! a retry hint, and a fresh window restores the full budget. The
//! window-boundary burst inherent to fixed windows is a documented,
//! accepted trade-off.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{rate_limit_message, GatewayError, Timestamp};

/// Write paths guarded by the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Publishing an accepted payload to a room's message channel.
    Publish,
    /// Issuing a fresh session code (room creation).
    CreateRoom,
    /// HTTP-style query endpoints (session listing and the like).
    Query,
}

impl Route {
    pub const fn as_str(self) -> &'static str {
        match self {
            Route::Publish => "publish",
            Route::CreateRoom => "create_room",
            Route::Query => "query",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key identifying one counter: an identity on a route.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub identity: String,
    pub route: Route,
}

impl RateLimitKey {
    pub fn new(identity: impl Into<String>, route: Route) -> Self {
        Self {
            identity: identity.into(),
            route,
        }
    }

    /// Storage key for the counter, shared by both adapters.
    pub fn storage_key(&self) -> String {
        format!("ratelimit:{}:{}", self.route, self.identity)
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request allowed; a token was consumed.
    Allowed(RateLimitStatus),
    /// Request denied; retry after the hint elapses.
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, RateLimitResult::Denied(_))
    }
}

/// Current window state for an allowed request.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: Timestamp,
    /// Window duration in seconds.
    pub window_secs: u32,
}

/// Details of a denial.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    /// The budget that was exceeded.
    pub limit: u32,
    /// Seconds until the client should retry; absent when the backend
    /// could not determine the window horizon.
    pub retry_after_secs: Option<u32>,
}

impl RateLimitDenied {
    /// The human-readable denial text surfaced to callers.
    pub fn message(&self) -> String {
        rate_limit_message(self.retry_after_secs)
    }
}

impl From<RateLimitDenied> for GatewayError {
    fn from(denied: RateLimitDenied) -> Self {
        GatewayError::RateLimited {
            retry_after_secs: denied.retry_after_secs,
        }
    }
}

/// Errors from rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Limiter backend unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}

/// Port for rate limiting. Checks are synchronous with respect to the bus
/// and run before any state mutation, so denied payloads never partially
/// apply.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check whether a request is allowed, consuming a token if so.
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError>;

    /// Current window state without consuming a token.
    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError>;

    /// Clear the counter for a key, restoring the full budget.
    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError>;
}
