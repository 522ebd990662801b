//! Domain types and pure decisions: codes, the room namespace, payloads,
//! the authorization gate and the gateway error taxonomy.

mod authorization;
mod code;
mod errors;
mod payload;
mod room;
mod tenant;
mod timestamp;

pub use authorization::is_authorized;
pub use code::{ChannelKey, CodeError, CodeGenerator, SessionCode};
pub use errors::{rate_limit_message, GatewayError};
pub use payload::{ClientPayload, PayloadKind, ServerPayload};
pub use room::Room;
pub use tenant::{TenantId, TenantIdError};
pub use timestamp::Timestamp;
