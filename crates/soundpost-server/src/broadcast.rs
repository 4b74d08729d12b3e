//! Event fan-out to connected station clients.

use std::sync::Arc;
use std::time::Duration;

use soundpost_core::Event;
use tracing::{debug, instrument, warn};

use crate::connection::ConnectionId;
use crate::registry::ConnectionRegistry;

/// Outcome of one fan-out pass. Never surfaced past the core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FanOut {
    pub attempted: usize,
    pub failed: usize,
}

/// Delivers events to every registered connection and relays inbound
/// client frames.
///
/// Delivery is best-effort: a connection that is closed or too slow to accept
/// a frame within `write_timeout` is skipped, and the rest of the snapshot is
/// still attempted. Failing connections stay registered; only their own
/// lifecycle removes them.
pub struct BroadcastCore {
    registry: Arc<ConnectionRegistry>,
    write_timeout: Duration,
}

impl BroadcastCore {
    pub fn new(registry: Arc<ConnectionRegistry>, write_timeout: Duration) -> Self {
        Self {
            registry,
            write_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Request fan-out of an event after an action has been carried out.
    pub async fn emit(&self, event: Event) {
        self.broadcast(&event).await;
    }

    /// Serialize once and attempt delivery to every live connection.
    #[instrument(skip_all, fields(event_type = event.event_type()))]
    pub async fn broadcast(&self, event: &Event) {
        self.broadcast_event(event).await;
    }

    /// Handle one text frame received from `from`.
    ///
    /// `voice_data` is rewrapped as `voice_announcement`; `audio_stream` is
    /// relayed as the exact text received. Everything else is dropped, and a
    /// frame that does not parse never affects the sending connection.
    #[instrument(skip(self, raw), fields(conn_id = %from))]
    pub async fn handle_inbound(&self, from: ConnectionId, raw: &str) {
        self.dispatch_inbound(from, raw).await;
    }

    async fn broadcast_event(&self, event: &Event) -> Option<FanOut> {
        let wire = match event.to_wire() {
            Ok(wire) => wire,
            Err(e) => {
                warn!(event_type = event.event_type(), error = %e, "refusing to broadcast event");
                return None;
            }
        };
        Some(self.fan_out(Arc::from(wire), event.event_type()).await)
    }

    async fn dispatch_inbound(&self, from: ConnectionId, raw: &str) -> Option<FanOut> {
        let event = match Event::parse(raw) {
            Ok(event) => event,
            Err(e) => {
                debug!(
                    conn_id = %from,
                    error_kind = e.error_kind(),
                    error = %e,
                    "dropping malformed inbound message"
                );
                return None;
            }
        };

        match event {
            Event::VoiceData { data } => {
                self.broadcast_event(&Event::VoiceAnnouncement { data }).await
            }
            Event::AudioStream { .. } => Some(self.fan_out(Arc::from(raw), "audio_stream").await),
            other => {
                debug!(conn_id = %from, event_type = other.event_type(), "ignoring inbound event");
                None
            }
        }
    }

    /// Enqueue `frame` on each connection in a fresh snapshot, in order.
    pub(crate) async fn fan_out(&self, frame: Arc<str>, event_type: &'static str) -> FanOut {
        let snapshot = self.registry.snapshot();
        let mut stats = FanOut {
            attempted: snapshot.len(),
            failed: 0,
        };

        for conn in &snapshot {
            if let Err(e) = conn.deliver(Arc::clone(&frame), self.write_timeout).await {
                stats.failed += 1;
                debug!(conn_id = %conn.id(), event_type, error = %e, "delivery failed");
            }
        }

        debug!(
            event_type,
            recipients = stats.attempted,
            failed = stats.failed,
            "broadcast complete"
        );
        stats
    }
}
