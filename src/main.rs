//! Huddle server binary: configuration, adapter wiring, serve loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use huddle::adapters::broker::{InMemoryBroker, RedisBroker};
use huddle::adapters::gateway::{ConnectionRegistry, GatewayContext};
use huddle::adapters::http::{app_router, AppState};
use huddle::adapters::presence::{InMemoryPresenceStore, RedisPresenceStore};
use huddle::adapters::rate_limiter::{InMemoryRateLimiter, RedisRateLimiter};
use huddle::adapters::rooms::{InMemoryRoomRepository, RedisRoomRepository};
use huddle::application::{PresenceTracker, RoomService};
use huddle::config::AppConfig;
use huddle::domain::CodeGenerator;
use huddle::ports::{MessageBroker, PresenceStore, RateLimiter, RoomRepository};

type Adapters = (
    Arc<dyn MessageBroker>,
    Arc<dyn PresenceStore>,
    Arc<dyn RoomRepository>,
    Arc<dyn RateLimiter>,
);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(environment = ?config.server.environment, "starting huddle");

    let (broker, presence_store, room_repo, limiter) = build_adapters(&config).await?;

    // Live connections watch this channel and treat the signal as an
    // implicit leave, so presence entries never outlive a deploy.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let presence = PresenceTracker::new(presence_store, broker.clone());
    let rooms = RoomService::new(
        room_repo,
        broker.clone(),
        presence.clone(),
        CodeGenerator::new(&config.room),
        config.room.max_code_attempts,
    );
    let gateway = GatewayContext {
        broker,
        presence,
        rooms,
        limiter,
        registry: Arc::new(ConnectionRegistry::new()),
        shutdown: shutdown_rx,
    };

    let app = app_router(AppState { gateway }, &config.server);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    })
    .await?;

    info!("shut down cleanly");
    Ok(())
}

/// Wire the shared-store adapters: Redis when configured, otherwise the
/// in-memory set for a single-process deployment.
async fn build_adapters(config: &AppConfig) -> Result<Adapters, Box<dyn std::error::Error>> {
    match &config.redis {
        Some(redis_config) => {
            let broker = RedisBroker::connect(&redis_config.url).await?;
            let client = redis::Client::open(redis_config.url.as_str())?;
            let conn = tokio::time::timeout(
                redis_config.timeout(),
                client.get_multiplexed_tokio_connection(),
            )
            .await??;
            info!("shared store: redis");
            Ok((
                Arc::new(broker),
                Arc::new(RedisPresenceStore::new(conn.clone())),
                Arc::new(RedisRoomRepository::new(conn.clone())),
                Arc::new(RedisRateLimiter::new(conn, config.rate_limit.clone())),
            ))
        }
        None => {
            info!("shared store: in-memory (single process)");
            Ok((
                Arc::new(InMemoryBroker::default()),
                Arc::new(InMemoryPresenceStore::new()),
                Arc::new(InMemoryRoomRepository::new()),
                Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone())),
            ))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}
