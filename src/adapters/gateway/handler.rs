//! WebSocket upgrade handler for room connections.
//!
//! Handles the HTTP → WebSocket upgrade and drives the session state
//! machine for the connection's lifetime:
//! 1. Validate the session code and that the room is live
//! 2. Upgrade to WebSocket
//! 3. Require a `join` payload, ack it
//! 4. Pump payloads in and bus events out until disconnect
//! 5. Clean up presence and registry state on every exit path

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{ClientPayload, GatewayError, ServerPayload, SessionCode, TenantId};

use super::session::{
    forces_disconnect, GatewayContext, JoinStreams, PayloadDisposition, PendingSession,
};

/// Replies queued by the receive side for the single socket writer.
const OUTBOUND_QUEUE: usize = 32;

/// Handle WebSocket upgrade requests for a room.
///
/// Route: `GET /api/rooms/:code/live`
///
/// The room must be live before the upgrade is accepted; an unknown code
/// is a plain 404, never a WebSocket close frame.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(code): Path<String>,
    State(ctx): State<GatewayContext>,
) -> Response {
    let code = match SessionCode::parse(&code) {
        Ok(code) => code,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let pending = match PendingSession::open(ctx.clone(), code).await {
        Ok(pending) => pending,
        Err(GatewayError::RoomNotFound(code)) => {
            return (
                StatusCode::NOT_FOUND,
                format!("no live room for code \"{code}\""),
            )
                .into_response();
        }
        Err(e) => return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, ctx, pending))
}

async fn handle_socket(socket: WebSocket, ctx: GatewayContext, pending: PendingSession) {
    let (mut sender, mut receiver) = socket.split();

    // The first meaningful payload must be a join.
    let identity = loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientPayload>(&text) {
                Ok(ClientPayload::Join { identity }) => match TenantId::new(identity) {
                    Ok(identity) => break identity,
                    Err(_) => {
                        let _ = send_payload(
                            &mut sender,
                            &GatewayError::InvalidPayloadKind.to_payload(),
                        )
                        .await;
                        return;
                    }
                },
                _ => {
                    let _ = send_payload(
                        &mut sender,
                        &GatewayError::InvalidPayloadKind.to_payload(),
                    )
                    .await;
                    return;
                }
            },
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
            Some(Ok(_)) => continue,
        }
    };

    let (mut session, streams) = match pending.join(identity).await {
        Ok(joined) => joined,
        Err(e) => {
            let _ = send_payload(&mut sender, &e.to_payload()).await;
            return;
        }
    };

    if send_payload(&mut sender, &session.ack()).await.is_err() {
        session.close().await;
        return;
    }

    // Cleanup handles for the path where the send task dies first.
    let code = session.code().clone();
    let identity = session.identity().clone();
    let connection_id = session.connection_id().clone();

    let (out_tx, mut out_rx) = mpsc::channel::<ServerPayload>(OUTBOUND_QUEUE);

    let JoinStreams {
        mut messages,
        mut counts,
    } = streams;
    let forward_identity = identity.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                event = messages.recv() => {
                    let Some(raw) = event else { break };
                    let Ok(event) = serde_json::from_slice::<ServerPayload>(&raw) else { continue };
                    if send_payload(&mut sender, &event).await.is_err() {
                        break;
                    }
                    if forces_disconnect(&event, &forward_identity) {
                        debug!(identity = %forward_identity, "broadcast forces disconnect");
                        break;
                    }
                }
                event = counts.recv() => {
                    let Some(raw) = event else { break };
                    let Ok(event) = serde_json::from_slice::<ServerPayload>(&raw) else { continue };
                    if send_payload(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                reply = out_rx.recv() => {
                    let Some(reply) = reply else { break };
                    if send_payload(&mut sender, &reply).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match session.handle_payload(&text).await {
                    PayloadDisposition::Reply(payload) => {
                        if out_tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    PayloadDisposition::Accepted => {}
                    PayloadDisposition::Leave => break,
                },
                Ok(Message::Binary(_)) => {
                    debug!(identity = %session.identity(), "ignoring unsupported binary message");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    debug!(identity = %session.identity(), error = %e, "receive error");
                    break;
                }
            }
        }
        session.close().await;
    });

    tokio::select! {
        _ = &mut send_task => {
            // Writer gone (peer vanished, kick, or room end); the receive
            // task may never wake again, so clean up from here.
            recv_task.abort();
            ctx.disconnect(&code, &identity, &connection_id).await;
        }
        _ = &mut recv_task => {
            // Receive side closed the session already.
            send_task.abort();
        }
        _ = ctx.shutting_down() => {
            // Server shutdown is an implicit leave for every connection.
            debug!(identity = %identity, connection = %connection_id, "closing connection for shutdown");
            send_task.abort();
            recv_task.abort();
            ctx.disconnect(&code, &identity, &connection_id).await;
        }
    }
}

async fn send_payload(
    sender: &mut SplitSink<WebSocket, Message>,
    payload: &ServerPayload,
) -> Result<(), axum::Error> {
    let json =
        serde_json::to_string(payload).map_err(|e| axum::Error::new(e.to_string()))?;
    sender.send(Message::Text(json)).await
}
