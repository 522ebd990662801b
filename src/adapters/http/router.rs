//! REST handlers and router assembly.

use std::time::Duration;

use axum::{
    extract::{FromRef, Path, State},
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::gateway::{ws_handler, GatewayContext};
use crate::config::ServerConfig;
use crate::domain::{Room, SessionCode};

use super::error::ApiError;
use super::identity::Identity;
use super::middleware::{rate_limit_middleware, RateLimiterState};

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: GatewayContext,
}

impl FromRef<AppState> for GatewayContext {
    fn from_ref(state: &AppState) -> Self {
        state.gateway.clone()
    }
}

/// Wire representation of a room on the REST surface.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomResponse {
    code: String,
    host: String,
    created_at: String,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            code: room.code.to_string(),
            host: room.host.to_string(),
            created_at: room.created_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionListResponse {
    sessions: Vec<RoomResponse>,
}

/// `POST /api/rooms` — issue a code and open a room for the caller.
async fn create_room(
    State(state): State<AppState>,
    Identity(host): Identity,
) -> Result<(StatusCode, Json<RoomResponse>), ApiError> {
    let room = state.gateway.rooms.create(host).await?;
    Ok((StatusCode::CREATED, Json(room.into())))
}

/// `DELETE /api/rooms/:code` — host closes the room.
async fn close_room(
    State(state): State<AppState>,
    Identity(requester): Identity,
    Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
    let code = SessionCode::parse(&code).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state.gateway.rooms.close(&code, &requester).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/sessions` — live rooms owned by the caller.
async fn list_sessions(
    State(state): State<AppState>,
    Identity(host): Identity,
) -> Result<Json<SessionListResponse>, ApiError> {
    let rooms = state.gateway.rooms.list_by_host(&host).await?;
    Ok(Json(SessionListResponse {
        sessions: rooms.into_iter().map(RoomResponse::from).collect(),
    }))
}

/// `GET /health` — liveness plus shared-store reachability.
async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .gateway
        .presence
        .ping()
        .await
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;

    let connections = state.gateway.registry.len().await;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "connections": connections,
    })))
}

/// Assemble the full application router.
pub fn app_router(state: AppState, config: &ServerConfig) -> Router {
    let limiter: RateLimiterState = state.gateway.limiter.clone();

    let rest = Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/:code", delete(close_room))
        .route("/sessions", get(list_sessions))
        .route_layer(middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));

    let api = rest.route("/rooms/:code/live", get(ws_handler));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(cors_layer(config))
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins_list()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::broker::InMemoryBroker;
    use crate::adapters::gateway::ConnectionRegistry;
    use crate::adapters::http::identity::IDENTITY_HEADER;
    use crate::adapters::presence::InMemoryPresenceStore;
    use crate::adapters::rate_limiter::InMemoryRateLimiter;
    use crate::adapters::rooms::InMemoryRoomRepository;
    use crate::application::{PresenceTracker, RoomService};
    use crate::config::{RateLimitConfig, RoomConfig, RouteBudget};
    use crate::domain::{CodeGenerator, TenantId, Timestamp};
    use axum::body::{to_bytes, Body};
    use axum::response::Response;
    use http::Request;
    use std::sync::Arc;
    use tokio::sync::watch;
    use tower::ServiceExt;

    fn app_with(rate_limit: RateLimitConfig) -> Router {
        let broker = Arc::new(InMemoryBroker::default());
        let presence = PresenceTracker::new(Arc::new(InMemoryPresenceStore::new()), broker.clone());
        let rooms = RoomService::new(
            Arc::new(InMemoryRoomRepository::new()),
            broker.clone(),
            presence.clone(),
            CodeGenerator::new(&RoomConfig::default()),
            16,
        );
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = AppState {
            gateway: GatewayContext {
                broker,
                presence,
                rooms,
                limiter: Arc::new(InMemoryRateLimiter::new(rate_limit)),
                registry: Arc::new(ConnectionRegistry::new()),
                shutdown: shutdown_rx,
            },
        };
        app_router(state, &ServerConfig::default())
    }

    fn app() -> Router {
        app_with(RateLimitConfig::default())
    }

    fn request(method: &str, uri: &str, identity: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(identity) = identity {
            builder = builder.header(IDENTITY_HEADER, identity);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn room_response_is_camel_case() {
        let room = Room {
            code: SessionCode::parse("AB12").unwrap(),
            host: TenantId::new("alice").unwrap(),
            created_at: Timestamp::from_unix_secs(1_700_000_000),
        };
        let json = serde_json::to_value(RoomResponse::from(room)).unwrap();
        assert_eq!(json["code"], "AB12");
        assert_eq!(json["host"], "alice");
        assert!(json.get("createdAt").is_some());
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app()
            .oneshot(request("GET", "/health", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 0);
    }

    #[tokio::test]
    async fn room_lifecycle_over_rest() {
        let app = app();

        let response = app
            .clone()
            .oneshot(request("POST", "/api/rooms", Some("alice")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        let code = created["code"].as_str().unwrap().to_string();
        assert_eq!(created["host"], "alice");

        let response = app
            .clone()
            .oneshot(request("GET", "/api/sessions", Some("alice")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listed = json_body(response).await;
        assert_eq!(listed["sessions"][0]["code"], code.as_str());

        let response = app
            .clone()
            .oneshot(request("DELETE", &format!("/api/rooms/{code}"), Some("alice")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request("GET", "/api/sessions", Some("alice")))
            .await
            .unwrap();
        let listed = json_body(response).await;
        assert_eq!(listed["sessions"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn close_by_non_host_is_forbidden() {
        let app = app();

        let response = app
            .clone()
            .oneshot(request("POST", "/api/rooms", Some("alice")))
            .await
            .unwrap();
        let code = json_body(response).await["code"].as_str().unwrap().to_string();

        let response = app
            .oneshot(request("DELETE", &format!("/api/rooms/{code}"), Some("bob")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_identity_is_unauthorized() {
        let response = app()
            .oneshot(request("POST", "/api/rooms", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn allowed_requests_carry_rate_limit_headers() {
        let response = app()
            .oneshot(request("GET", "/api/sessions", Some("alice")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "120");
        assert_eq!(
            response.headers().get("x-ratelimit-remaining").unwrap(),
            "119"
        );
        assert!(response.headers().get("x-ratelimit-reset").is_some());
    }

    #[tokio::test]
    async fn exhausted_create_budget_is_rejected_with_retry_hint() {
        let app = app_with(RateLimitConfig {
            create_room: RouteBudget::new(1, 60),
            ..Default::default()
        });

        let response = app
            .clone()
            .oneshot(request("POST", "/api/rooms", Some("alice")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(request("POST", "/api/rooms", Some("alice")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().get("retry-after").is_some());
        assert_eq!(
            response.headers().get("x-ratelimit-remaining").unwrap(),
            "0"
        );
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "rateLimited");
    }
}
