use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use soundpost_store::Database;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::broadcast::BroadcastCore;
use crate::config::ServerConfig;
use crate::handlers;
use crate::registry::ConnectionRegistry;
use crate::websocket::{self, ConnectionSettings};

/// Shared application state passed to axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<BroadcastCore>,
    pub db: Database,
    pub config: Arc<ServerConfig>,
    pub shutdown: CancellationToken,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig, db: Database, shutdown: CancellationToken) -> Self {
        let core = BroadcastCore::new(Arc::new(ConnectionRegistry::new()), config.write_timeout());
        Self {
            core: Arc::new(core),
            db,
            config: Arc::new(config),
            shutdown,
            start_time: Instant::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub uptime_secs: u64,
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    let api = Router::new()
        .route("/spotify/config", get(handlers::spotify_config))
        .route("/spotify/auth", post(handlers::spotify_auth))
        .route("/spotify/player", get(handlers::spotify_player))
        .route("/spotify/play", post(handlers::spotify_play))
        .route(
            "/audio/upload",
            post(handlers::upload_audio).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/audio/files", get(handlers::list_audio_files))
        .route("/audio/play/{file_id}", post(handlers::play_audio_file))
        .route("/audio/volume", post(handlers::set_volume))
        .route("/audio/stop", post(handlers::stop_audio))
        .route(
            "/announcements",
            get(handlers::list_announcements).post(handlers::create_announcement),
        )
        .route("/announcements/text-to-speech", post(handlers::text_to_speech))
        .route("/ws", get(ws_handler));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind, spawn the server task and return a handle to it.
///
/// The server stops accepting on `shutdown`; open sockets observe the same
/// token and close themselves.
pub async fn start(
    config: ServerConfig,
    db: Database,
    shutdown: CancellationToken,
) -> Result<ServerHandle, std::io::Error> {
    tokio::fs::create_dir_all(&config.uploads_dir).await?;

    let addr = config.bind_addr();
    let state = AppState::new(config, db, shutdown.clone());
    let core = Arc::clone(&state.core);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "soundpost server started");

    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;
        if let Err(e) = result {
            warn!(error = %e, "server exited with error");
        }
    });

    Ok(ServerHandle {
        addr: local_addr,
        core,
        server,
    })
}

/// Handle returned by [`start`].
pub struct ServerHandle {
    addr: SocketAddr,
    core: Arc<BroadcastCore>,
    server: JoinHandle<()>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The running broadcast core, for emitting events in-process.
    pub fn core(&self) -> &Arc<BroadcastCore> {
        &self.core
    }

    pub fn into_task(self) -> JoinHandle<()> {
        self.server
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let settings = ConnectionSettings::from(state.config.as_ref());
    let core = Arc::clone(&state.core);
    let shutdown = state.shutdown.clone();
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| websocket::handle_socket(socket, core, settings, shutdown))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.core.registry().len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
