use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection identifier. Never reused while the process lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a single delivery attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("send queue full past write timeout")]
    Timeout,
    #[error("connection writer has gone away")]
    Closed,
}

/// The sending half of one live client session.
///
/// Frames are pushed onto a bounded queue that the connection's writer task
/// drains onto the socket, so a slow peer only ever stalls its own queue.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::Sender<Arc<str>>,
    connected_at: Instant,
}

impl Connection {
    /// Create a connection with a fresh id and its outbound queue.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let conn = Self {
            id: ConnectionId::next(),
            tx,
            connected_at: Instant::now(),
        };
        (conn, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Enqueue one text frame, waiting at most `timeout` for queue space.
    pub async fn deliver(&self, frame: Arc<str>, timeout: Duration) -> Result<(), DeliveryError> {
        self.tx.send_timeout(frame, timeout).await.map_err(|e| match e {
            SendTimeoutError::Timeout(_) => DeliveryError::Timeout,
            SendTimeoutError::Closed(_) => DeliveryError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
