//! Gateway error taxonomy.
//!
//! All payload-level errors are recovered at the gateway boundary: the
//! sender is notified, the connection stays open, and no other connection
//! is affected. Infrastructure failures (`StoreUnavailable`) are not
//! locally recoverable — the affected operation is failed outward rather
//! than proceeding with local-only state.

use thiserror::Error;

use super::{PayloadKind, ServerPayload};

/// Errors raised while handling a connection or an inbound payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Payload carried an unrecognized `kind` tag.
    #[error("unrecognized payload kind")]
    InvalidPayloadKind,

    /// Role-restricted kind sent by a non-host.
    #[error("payload kind \"{0}\" requires host privileges")]
    Unauthorized(PayloadKind),

    /// Sender exceeded its request budget.
    #[error("{}", rate_limit_message(*.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u32> },

    /// Supplied code has no corresponding live room.
    #[error("no live room for code \"{0}\"")]
    RoomNotFound(String),

    /// Underlying connection dropped; treated as an implicit leave.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Shared store unreachable; deny the operation, never go stale.
    #[error("shared store unavailable: {0}")]
    StoreUnavailable(String),
}

impl GatewayError {
    /// Stable machine-readable code for the wire and for logs.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::InvalidPayloadKind => "invalidPayloadKind",
            GatewayError::Unauthorized(_) => "unauthorized",
            GatewayError::RateLimited { .. } => "rateLimited",
            GatewayError::RoomNotFound(_) => "roomNotFound",
            GatewayError::Transport(_) => "transportFailure",
            GatewayError::StoreUnavailable(_) => "storeUnavailable",
        }
    }

    /// Wire representation sent to the offending connection.
    pub fn to_payload(&self) -> ServerPayload {
        let retry_after_secs = match self {
            GatewayError::RateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        };
        ServerPayload::Error {
            code: self.code().to_string(),
            message: self.to_string(),
            retry_after_secs,
        }
    }
}

/// Human-readable rate-limit denial, with correct singular/plural.
pub fn rate_limit_message(retry_after_secs: Option<u32>) -> String {
    match retry_after_secs {
        None => "You're sending too many requests. Try again soon".to_string(),
        Some(1) => "You're sending too many requests. Try again in 1 second".to_string(),
        Some(n) => format!("You're sending too many requests. Try again in {n} seconds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_message_singular() {
        assert_eq!(
            rate_limit_message(Some(1)),
            "You're sending too many requests. Try again in 1 second"
        );
    }

    #[test]
    fn rate_limit_message_plural() {
        assert_eq!(
            rate_limit_message(Some(5)),
            "You're sending too many requests. Try again in 5 seconds"
        );
    }

    #[test]
    fn rate_limit_message_without_hint() {
        assert_eq!(
            rate_limit_message(None),
            "You're sending too many requests. Try again soon"
        );
    }

    #[test]
    fn rate_limited_error_displays_the_hint_message() {
        let err = GatewayError::RateLimited {
            retry_after_secs: Some(5),
        };
        assert_eq!(
            err.to_string(),
            "You're sending too many requests. Try again in 5 seconds"
        );
    }

    #[test]
    fn error_payload_carries_code_and_retry_hint() {
        let err = GatewayError::RateLimited {
            retry_after_secs: Some(3),
        };
        match err.to_payload() {
            ServerPayload::Error {
                code,
                retry_after_secs,
                ..
            } => {
                assert_eq!(code, "rateLimited");
                assert_eq!(retry_after_secs, Some(3));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn unauthorized_names_the_offending_kind() {
        let err = GatewayError::Unauthorized(PayloadKind::Kick);
        assert_eq!(err.code(), "unauthorized");
        assert!(err.to_string().contains("kick"));
    }
}
