//! Huddle - code-addressable live group sessions
//!
//! A host opens a short-code room; participants join over a persistent
//! WebSocket and receive membership and chat updates through a shared
//! publish/subscribe bus, with server-enforced authorization and rate
//! limiting on every write path.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
