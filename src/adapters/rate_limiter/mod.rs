//! Rate limiter adapters: fixed-window counters, in-memory and Redis.

mod in_memory;
mod redis;

pub use in_memory::InMemoryRateLimiter;
pub use redis::RedisRateLimiter;
