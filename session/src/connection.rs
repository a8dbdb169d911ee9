use crate::error::Error;
use dashmap::DashMap;
use log::*;
use tokio::sync::mpsc::UnboundedSender;

/// Opaque client identifier taken from the connection path. Not unique:
/// several live connections may share one.
pub type ClientId = String;

/// Sending half of a connection's outbound text channel. The socket itself
/// is owned by the connection task draining the other half.
pub type Outbound = UnboundedSender<String>;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub client_id: ClientId,
    pub sender: Outbound,
}

/// Registry of live sessions with two indices.
///
/// `connections` is keyed by the server-generated [`ConnectionId`] and is what
/// registration, cleanup and broadcast work against. `client_index` keeps, per
/// client id, the connection ids in the order they registered so a targeted
/// send can pick the earliest live one.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionInfo>,
    client_index: DashMap<ClientId, Vec<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            client_index: DashMap::new(),
        }
    }

    /// Register a new connection. Duplicate client ids are accepted and keep
    /// their insertion order.
    pub fn register(&self, client_id: ClientId, sender: Outbound) -> ConnectionId {
        let connection_id = ConnectionId::new();

        self.connections.insert(
            connection_id.clone(),
            ConnectionInfo {
                client_id: client_id.clone(),
                sender,
            },
        );

        self.client_index
            .entry(client_id)
            .or_default()
            .push(connection_id.clone());

        connection_id
    }

    /// Remove a connection. Unknown or already removed ids are ignored.
    pub fn unregister(&self, connection_id: &ConnectionId) {
        if let Some((_, info)) = self.connections.remove(connection_id) {
            let client_id = info.client_id;

            if let Some(mut entry) = self.client_index.get_mut(&client_id) {
                entry.retain(|id| id != connection_id);
            }

            // Drop the index entry only if nobody re-registered in between
            self.client_index
                .remove_if(&client_id, |_, ids| ids.is_empty());
        }
    }

    /// Deliver `text` to the earliest registered open connection for
    /// `client_id`. Connections whose channel turns out to be closed are
    /// unregistered on the way and the next match is tried.
    pub fn send_to_client(&self, client_id: &str, text: &str) -> Result<ConnectionId, Error> {
        let candidates = match self.client_index.get(client_id) {
            Some(ids) => ids.clone(),
            None => return Err(Error::session_not_found(client_id)),
        };

        for conn_id in candidates {
            let outcome = match self.connections.get(&conn_id) {
                Some(info) => info.sender.send(text.to_owned()),
                None => continue,
            };

            match outcome {
                Ok(()) => return Ok(conn_id),
                Err(e) => {
                    warn!(
                        "Failed to send to connection {} for client {}: {}. Removing it.",
                        conn_id.as_str(),
                        client_id,
                        e
                    );
                    self.unregister(&conn_id);
                }
            }
        }

        Err(Error::session_not_found(client_id))
    }

    /// Deliver `text` to every registered connection. A failed delivery does
    /// not stop the others; failed connections are unregistered afterwards.
    /// Returns how many connections were reached.
    pub fn broadcast(&self, text: &str) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for entry in self.connections.iter() {
            match entry.value().sender.send(text.to_owned()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        "Failed to send broadcast to connection {}: {}",
                        entry.key().as_str(),
                        e
                    );
                    closed.push(entry.key().clone());
                }
            }
        }

        for conn_id in &closed {
            self.unregister(conn_id);
        }

        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn client_count(&self) -> usize {
        self.client_index.len()
    }

    pub fn is_registered(&self, client_id: &str) -> bool {
        self.client_index
            .get(client_id)
            .is_some_and(|ids| !ids.is_empty())
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
