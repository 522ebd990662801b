//! Connection gateway: per-connection WebSockets bridged to the shared
//! pub/sub bus.

mod connection;
mod handler;
mod session;

pub use connection::{ConnectionId, ConnectionRegistry};
pub use handler::ws_handler;
pub use session::{
    forces_disconnect, GatewayContext, JoinStreams, JoinedSession, PayloadDisposition,
    PendingSession,
};
