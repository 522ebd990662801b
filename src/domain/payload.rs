//! Wire payloads exchanged between clients and the gateway.
//!
//! Every client-to-server payload carries an explicit `kind` tag; the tag
//! is what the authorization gate decides on. Unknown tags fail to parse
//! and are never processed (fail closed).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Client → server payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClientPayload {
    /// Enter the room addressed by the connection. No prior auth required.
    Join { identity: String },

    /// Leave the room and close the connection.
    Leave,

    /// Chat content broadcast to every tenant in the room.
    Message { body: String },

    /// Host command: eject the targeted tenant.
    #[serde(rename_all = "camelCase")]
    Kick { target: String },

    /// Host command: end the session for everyone.
    End,
}

impl ClientPayload {
    /// The kind tag used by the authorization gate.
    pub fn kind(&self) -> PayloadKind {
        match self {
            ClientPayload::Join { .. } => PayloadKind::Join,
            ClientPayload::Leave => PayloadKind::Leave,
            ClientPayload::Message { .. } => PayloadKind::Message,
            ClientPayload::Kick { .. } => PayloadKind::Kick,
            ClientPayload::End => PayloadKind::End,
        }
    }
}

/// Closed set of recognized client payload kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadKind {
    Join,
    Leave,
    Message,
    Kick,
    End,
}

impl PayloadKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            PayloadKind::Join => "join",
            PayloadKind::Leave => "leave",
            PayloadKind::Message => "message",
            PayloadKind::Kick => "kick",
            PayloadKind::End => "end",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server → client payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ServerPayload {
    /// Join acknowledgement with connection metadata.
    #[serde(rename_all = "camelCase")]
    Joined {
        code: String,
        identity: String,
        is_host: bool,
        connection_id: String,
    },

    /// An accepted client payload, relayed verbatim with its sender.
    Broadcast {
        from: String,
        payload: serde_json::Value,
    },

    /// Current tenant count after a membership change.
    TenantCount { value: u64 },

    /// Payload-level rejection. The connection stays open.
    #[serde(rename_all = "camelCase")]
    Error {
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        retry_after_secs: Option<u32>,
    },
}
