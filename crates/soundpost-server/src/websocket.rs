//! Per-connection WebSocket lifecycle.
//!
//! On upgrade the connection is registered, a writer task drains its outbound
//! queue onto the socket, and the read loop hands every text frame to the
//! broadcast core. A write that outlasts the write timeout is only logged; the
//! connection ends on peer close, read error, a failed socket write or
//! shutdown, each followed by a single unregister.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::broadcast::BroadcastCore;
use crate::config::ServerConfig;
use crate::connection::{Connection, ConnectionId};

/// Per-connection knobs, taken from [`ServerConfig`].
#[derive(Clone, Copy, Debug)]
pub struct ConnectionSettings {
    pub max_send_queue: usize,
    pub write_timeout: Duration,
    pub heartbeat_interval: Duration,
}

impl From<&ServerConfig> for ConnectionSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_send_queue: config.max_send_queue,
            write_timeout: config.write_timeout(),
            heartbeat_interval: config.heartbeat_interval(),
        }
    }
}

/// Accept hook: run one upgraded socket until it closes.
pub async fn handle_socket(
    socket: WebSocket,
    core: Arc<BroadcastCore>,
    settings: ConnectionSettings,
    shutdown: CancellationToken,
) {
    let (conn, outbound) = Connection::channel(settings.max_send_queue);
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    core.registry().register(Arc::clone(&conn));
    info!(conn_id = %conn_id, connections = core.registry().len(), "client connected");

    let (ws_tx, ws_rx) = socket.split();
    let mut writer = tokio::spawn(write_loop(
        ws_tx,
        outbound,
        conn_id,
        settings,
        shutdown.clone(),
    ));

    let (reason, writer_done) = tokio::select! {
        reason = read_loop(ws_rx, &core, conn_id) => (reason, false),
        _ = &mut writer => ("writer stopped", true),
        () = shutdown.cancelled() => ("shutdown", false),
    };

    core.registry().unregister(conn_id);
    let connected_for = conn.connected_for();
    // Last sender gone once no snapshot holds it; the writer then drains and exits.
    drop(conn);
    if !writer_done
        && tokio::time::timeout(settings.write_timeout * 2, &mut writer)
            .await
            .is_err()
    {
        writer.abort();
    }

    info!(
        conn_id = %conn_id,
        reason,
        connected_secs = connected_for.as_secs(),
        connections = core.registry().len(),
        "client disconnected"
    );
}

async fn read_loop(
    mut ws_rx: SplitStream<WebSocket>,
    core: &BroadcastCore,
    conn_id: ConnectionId,
) -> &'static str {
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(WsMessage::Text(text)) => core.handle_inbound(conn_id, text.as_str()).await,
            Ok(WsMessage::Close(_)) => return "peer closed",
            Ok(WsMessage::Binary(bytes)) => {
                debug!(conn_id = %conn_id, len = bytes.len(), "ignoring binary frame");
            }
            // axum answers pings itself
            Ok(WsMessage::Ping(_) | WsMessage::Pong(_)) => {}
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "websocket read error");
                return "read error";
            }
        }
    }
    "stream ended"
}

async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, WsMessage>,
    mut outbound: mpsc::Receiver<Arc<str>>,
    conn_id: ConnectionId,
    settings: ConnectionSettings,
    shutdown: CancellationToken,
) {
    let mut heartbeat = tokio::time::interval(settings.heartbeat_interval);
    heartbeat.tick().await;

    loop {
        let frame = tokio::select! {
            next = outbound.recv() => match next {
                Some(text) => WsMessage::Text(text.as_ref().into()),
                None => break,
            },
            _ = heartbeat.tick() => {
                trace!(conn_id = %conn_id, "sending ping");
                WsMessage::Ping(vec![].into())
            }
            () = shutdown.cancelled() => {
                let _ = tokio::time::timeout(settings.write_timeout, ws_tx.send(WsMessage::Close(None))).await;
                break;
            }
        };

        // A slow peer keeps its connection; only a dead socket ends the writer.
        let started = Instant::now();
        let sent = tokio::select! {
            result = ws_tx.send(frame) => result,
            () = shutdown.cancelled() => break,
        };
        if let Err(e) = sent {
            debug!(conn_id = %conn_id, error = %e, "websocket write failed");
            break;
        }
        let elapsed = started.elapsed();
        if elapsed > settings.write_timeout {
            debug!(conn_id = %conn_id, elapsed_ms = elapsed.as_millis() as u64, "slow websocket write");
        }
    }
}
