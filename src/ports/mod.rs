//! Ports: async trait seams between the core and its adapters.
//!
//! Each port has an in-memory adapter (tests, single-process runs) and a
//! Redis adapter (production, multi-process) in `crate::adapters`.

mod broker;
mod presence;
mod rate_limiter;
mod rooms;

pub use broker::{BrokerError, MessageBroker, Subscription};
pub use presence::{PresenceChange, PresenceError, PresenceStore};
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
    Route,
};
pub use rooms::{RoomRepository, RoomRepositoryError};
