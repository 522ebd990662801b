//! Per-connection session state machine.
//!
//! A connection moves `Connecting -> Joined -> Closed`. The machine is
//! transport-agnostic: the WebSocket handler feeds it inbound text and
//! forwards what it returns, which keeps the full payload pipeline
//! (parse, authorize, rate-limit, publish) testable over the in-memory
//! adapters without sockets.
//!
//! Host status is recomputed from the live room on every inbound payload;
//! it is never cached across payloads.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::application::{PresenceTracker, RoomService, RoomServiceError};
use crate::domain::{
    is_authorized, ClientPayload, GatewayError, PayloadKind, Room, ServerPayload, SessionCode,
    TenantId,
};
use crate::ports::{
    MessageBroker, RateLimitKey, RateLimitResult, RateLimiter, Route, Subscription,
};

use super::connection::{ConnectionId, ConnectionRegistry};

/// Shared collaborators handed to every session.
#[derive(Clone)]
pub struct GatewayContext {
    pub broker: Arc<dyn MessageBroker>,
    pub presence: PresenceTracker,
    pub rooms: RoomService,
    pub limiter: Arc<dyn RateLimiter>,
    pub registry: Arc<ConnectionRegistry>,
    pub shutdown: watch::Receiver<bool>,
}

impl GatewayContext {
    /// Tear down a connection's shared state. Safe to call more than once
    /// and from any exit path.
    pub async fn disconnect(&self, code: &SessionCode, identity: &TenantId, id: &ConnectionId) {
        if let Err(e) = self.presence.leave(code, identity).await {
            warn!(code = %code, identity = %identity, error = %e, "presence cleanup failed");
        }
        self.registry.unregister(id).await;
        debug!(code = %code, identity = %identity, connection = %id, "connection closed");
    }

    /// Resolves once the process starts shutting down. Every live
    /// connection treats this as an implicit leave.
    pub async fn shutting_down(&self) {
        let mut shutdown = self.shutdown.clone();
        while !*shutdown.borrow() {
            // A dropped sender means the process is already exiting.
            if shutdown.changed().await.is_err() {
                break;
            }
        }
    }
}

impl std::fmt::Debug for GatewayContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayContext").finish_non_exhaustive()
    }
}

/// What the transport should do with an inbound payload's result.
#[derive(Debug)]
pub enum PayloadDisposition {
    /// Send this to the offending sender only; the connection stays open.
    Reply(ServerPayload),
    /// Accepted; fan-out happens through the subscriptions.
    Accepted,
    /// Explicit leave; the transport closes the connection.
    Leave,
}

/// Streams a joined connection consumes.
pub struct JoinStreams {
    pub messages: Subscription,
    pub counts: Subscription,
}

/// A connection that has upgraded but not yet joined.
pub struct PendingSession {
    ctx: GatewayContext,
    room: Room,
    connection_id: ConnectionId,
}

impl PendingSession {
    /// Open a session against a live room. Fails with `RoomNotFound` when
    /// the code is not registered.
    pub async fn open(ctx: GatewayContext, code: SessionCode) -> Result<Self, GatewayError> {
        let room = ctx.rooms.find(&code).await.map_err(map_room_error)?;
        Ok(Self {
            ctx,
            room,
            connection_id: ConnectionId::new(),
        })
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    /// Join the room: record presence, subscribe to the room's channels,
    /// register the connection locally.
    pub async fn join(
        self,
        identity: TenantId,
    ) -> Result<(JoinedSession, JoinStreams), GatewayError> {
        let code = self.room.code.clone();
        let is_host = self.room.is_host(&identity);

        // Subscribe before the presence mutation so this connection sees
        // its own count update.
        let messages = self.ctx.broker.subscribe(&code.message_channel()).await?;
        let counts = self
            .ctx
            .broker
            .subscribe(&code.tenant_count_channel())
            .await?;

        self.ctx.presence.join(&code, &identity).await?;
        self.ctx
            .registry
            .register(self.connection_id.clone(), code.clone(), identity.clone())
            .await;

        debug!(code = %code, identity = %identity, is_host, connection = %self.connection_id, "tenant joined room");

        let session = JoinedSession {
            ctx: self.ctx,
            code,
            identity,
            is_host,
            connection_id: self.connection_id,
            closed: false,
        };
        Ok((session, JoinStreams { messages, counts }))
    }
}

/// A connection that has joined its room.
pub struct JoinedSession {
    ctx: GatewayContext,
    code: SessionCode,
    identity: TenantId,
    is_host: bool,
    connection_id: ConnectionId,
    closed: bool,
}

impl JoinedSession {
    /// The acknowledgement sent once after a successful join.
    pub fn ack(&self) -> ServerPayload {
        ServerPayload::Joined {
            code: self.code.to_string(),
            identity: self.identity.to_string(),
            is_host: self.is_host,
            connection_id: self.connection_id.to_string(),
        }
    }

    pub fn identity(&self) -> &TenantId {
        &self.identity
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    /// Run one inbound payload through the pipeline:
    /// parse, authorize, rate-limit, publish.
    ///
    /// Every rejection is payload-level: the sender is notified and the
    /// connection stays open. Nothing is published for a rejected payload.
    pub async fn handle_payload(&mut self, raw: &str) -> PayloadDisposition {
        let Ok(payload) = serde_json::from_str::<ClientPayload>(raw) else {
            return PayloadDisposition::Reply(GatewayError::InvalidPayloadKind.to_payload());
        };
        let kind = payload.kind();

        // Host status comes from the live room, not from join time.
        let room = match self.ctx.rooms.find(&self.code).await.map_err(map_room_error) {
            Ok(room) => room,
            Err(e) => return PayloadDisposition::Reply(e.to_payload()),
        };
        let is_host = room.is_host(&self.identity);

        if !is_authorized(is_host, kind) {
            debug!(code = %self.code, identity = %self.identity, kind = %kind, "payload rejected: unauthorized");
            return PayloadDisposition::Reply(GatewayError::Unauthorized(kind).to_payload());
        }

        match kind {
            // Leaving is always allowed; no budget is consumed.
            PayloadKind::Leave => {
                if let Err(e) = self.broadcast(raw).await {
                    return PayloadDisposition::Reply(e.to_payload());
                }
                PayloadDisposition::Leave
            }

            // Host ends the session: close the room through the lifecycle
            // service, which broadcasts the end for every connection.
            PayloadKind::End => {
                match self.ctx.rooms.close(&self.code, &self.identity).await {
                    Ok(()) => PayloadDisposition::Accepted,
                    Err(e) => PayloadDisposition::Reply(map_room_error(e).to_payload()),
                }
            }

            PayloadKind::Join | PayloadKind::Message | PayloadKind::Kick => {
                if let Some(denied) = self.check_rate_limit().await {
                    return PayloadDisposition::Reply(denied.to_payload());
                }
                match self.broadcast(raw).await {
                    Ok(()) => PayloadDisposition::Accepted,
                    Err(e) => PayloadDisposition::Reply(e.to_payload()),
                }
            }
        }
    }

    /// Release the connection's shared state. Runs once; later calls are
    /// no-ops.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.ctx
            .disconnect(&self.code, &self.identity, &self.connection_id)
            .await;
    }

    async fn check_rate_limit(&self) -> Option<GatewayError> {
        let key = RateLimitKey::new(self.identity.as_str(), Route::Publish);
        match self.ctx.limiter.check(key).await {
            Ok(RateLimitResult::Allowed(_)) => None,
            Ok(RateLimitResult::Denied(denied)) => {
                debug!(code = %self.code, identity = %self.identity, "payload rejected: rate limited");
                Some(denied.into())
            }
            Err(e) => Some(GatewayError::StoreUnavailable(e.to_string())),
        }
    }

    /// Relay the accepted payload verbatim on the room's message channel.
    async fn broadcast(&self, raw: &str) -> Result<(), GatewayError> {
        let original: serde_json::Value =
            serde_json::from_str(raw).map_err(|_| GatewayError::InvalidPayloadKind)?;
        let event = ServerPayload::Broadcast {
            from: self.identity.to_string(),
            payload: original,
        };
        let bytes =
            serde_json::to_vec(&event).map_err(|e| GatewayError::Transport(e.to_string()))?;
        self.ctx
            .broker
            .publish(&self.code.message_channel(), bytes)
            .await?;
        Ok(())
    }
}

/// Whether a relayed broadcast forces the receiving connection to
/// disconnect: the session ended, or this identity was kicked.
pub fn forces_disconnect(event: &ServerPayload, identity: &TenantId) -> bool {
    let ServerPayload::Broadcast { payload, .. } = event else {
        return false;
    };
    match payload.get("kind").and_then(|k| k.as_str()) {
        Some("end") => true,
        Some("kick") => {
            payload.get("target").and_then(|t| t.as_str()) == Some(identity.as_str())
        }
        _ => false,
    }
}

fn map_room_error(err: RoomServiceError) -> GatewayError {
    match err {
        RoomServiceError::NotFound(code) => GatewayError::RoomNotFound(code),
        RoomServiceError::NotHost => GatewayError::Unauthorized(PayloadKind::End),
        other => GatewayError::StoreUnavailable(other.to_string()),
    }
}
