//! # soundpost-server
//!
//! Real-time control plane for the playback station.
//!
//! - Connection registry and best-effort event fan-out ([`broadcast`])
//! - WebSocket lifecycle: register on upgrade, relay inbound frames, unregister on close
//! - HTTP glue that persists metadata and emits events through the core
//! - Graceful shutdown via `CancellationToken`

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use broadcast::BroadcastCore;
pub use config::{ConfigError, ServerConfig};
pub use server::{start, ServerHandle};
pub use shutdown::ShutdownCoordinator;
