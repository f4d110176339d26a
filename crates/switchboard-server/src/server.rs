//! `RelayServer` — Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use switchboard_core::{ConnectionId, PeerName, RoomCode};

use crate::config::RelayConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::connection::PeerConnection;
use crate::websocket::rooms::RoomRegistry;
use crate::websocket::session::{Heartbeat, run_ws_session};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Room registry for membership and fan-out.
    pub rooms: Arc<RoomRegistry>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Relay configuration.
    pub config: Arc<RelayConfig>,
    /// When the relay started (monotonic).
    pub start_time: Instant,
    /// When the relay started (wall clock).
    pub started_at: DateTime<Utc>,
    /// Prometheus render handle.
    pub metrics: PrometheusHandle,
}

/// The relay server.
pub struct RelayServer {
    config: Arc<RelayConfig>,
    rooms: Arc<RoomRegistry>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    started_at: DateTime<Utc>,
    metrics: PrometheusHandle,
}

impl RelayServer {
    /// Create a new relay server.
    pub fn new(config: RelayConfig, metrics: PrometheusHandle) -> Self {
        Self {
            config: Arc::new(config),
            rooms: Arc::new(RoomRegistry::new()),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            started_at: Utc::now(),
            metrics,
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            rooms: Arc::clone(&self.rooms),
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::clone(&self.config),
            start_time: self.start_time,
            started_at: self.started_at,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/ws/{room_code}", get(ws_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Bind and start serving. Returns the bound address and the accept
    /// loop's task handle; the loop drains when the shutdown token fires.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        let router = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(error = %e, "server task failed");
            }
        });

        info!(addr = %local_addr, "relay listening");
        Ok((local_addr, handle))
    }

    /// Get the room registry.
    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Identity the excluded HTTP form layer hands the relay.
#[derive(Debug, Deserialize)]
struct ConnectParams {
    /// Display name collected before the client was redirected here.
    #[serde(default)]
    peer: String,
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.rooms.connection_count();
    let rooms = state.rooms.room_count().await;
    Json(health::health_check(
        state.start_time,
        state.started_at,
        connections,
        rooms,
    ))
}

/// GET /metrics — Prometheus exposition format.
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}

/// GET /ws/{room_code}?peer=<name> — WebSocket upgrade into a room.
///
/// The room code is never validated for existence; an unknown code
/// implicitly creates the room on registration.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_code): Path<String>,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    if state.shutdown.is_shutting_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if state.rooms.connection_count() >= state.config.max_connections {
        warn!(
            max = state.config.max_connections,
            "connection cap reached, rejecting upgrade"
        );
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let peer = params.peer.trim();
    if peer.is_empty() {
        return (StatusCode::BAD_REQUEST, "missing peer identity").into_response();
    }

    let peer = PeerName::from(peer);
    let room = RoomCode::from(room_code);
    let heartbeat = Heartbeat {
        interval: Duration::from_secs(state.config.heartbeat_interval_secs),
        timeout: Duration::from_secs(state.config.heartbeat_timeout_secs),
    };
    let capacity = state.config.send_queue_capacity;
    let rooms = Arc::clone(&state.rooms);
    let cancel = state.shutdown.token();

    ws.max_message_size(state.config.max_frame_bytes)
        .on_upgrade(move |socket| {
            let (tx, rx) = mpsc::channel(capacity);
            let connection = Arc::new(PeerConnection::new(
                ConnectionId::generate(),
                peer,
                room,
                tx,
            ));
            run_ws_session(socket, connection, rx, rooms, heartbeat, cancel)
        })
}
