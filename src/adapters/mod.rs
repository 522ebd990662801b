//! Adapters implementing the ports, plus the HTTP/WebSocket edge.

pub mod broker;
pub mod gateway;
pub mod http;
pub mod presence;
pub mod rate_limiter;
pub mod rooms;
