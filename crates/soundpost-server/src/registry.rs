use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::connection::{Connection, ConnectionId};

/// Set of currently live connections.
///
/// Membership changes and snapshots may run concurrently from any task; a
/// snapshot is an owned copy and never observes a half-applied change.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection.
    ///
    /// # Panics
    ///
    /// Registering the same id twice is a lifecycle bug and panics.
    pub fn register(&self, conn: Arc<Connection>) {
        match self.connections.entry(conn.id()) {
            Entry::Occupied(_) => panic!("connection {} registered twice", conn.id()),
            Entry::Vacant(slot) => {
                slot.insert(conn);
            }
        }
    }

    /// Remove a connection. Returns whether it was present; removing an
    /// absent id is a no-op.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        self.connections.remove(&id).is_some()
    }

    /// Owned point-in-time copy of every live connection.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
