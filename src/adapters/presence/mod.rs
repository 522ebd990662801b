//! Presence store adapters: process-local sets and Redis sets.

mod in_memory;
mod redis;

pub use in_memory::InMemoryPresenceStore;
pub use redis::RedisPresenceStore;
