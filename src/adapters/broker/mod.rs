//! Message broker adapters: in-memory fan-out and Redis pub/sub.

mod in_memory;
mod redis;

pub use in_memory::InMemoryBroker;
pub use redis::RedisBroker;
