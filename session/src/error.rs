//! Error types for the `session` crate.

use crate::connection::{ClientId, ConnectionId};
use std::fmt;

/// Errors raised while routing frames to live sessions. None of these are
/// fatal to the registry; callers decide whether to log or drop them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A targeted send found no open session for the client id.
    SessionNotFound { client_id: ClientId },

    /// The peer closed or dropped the connection, or the socket failed.
    /// The connection is deregistered when this is observed.
    TransportDisconnect {
        connection_id: ConnectionId,
        reason: String,
    },
}

impl Error {
    pub fn session_not_found(client_id: &str) -> Self {
        Error::SessionNotFound {
            client_id: client_id.to_string(),
        }
    }

    pub fn transport_disconnect(connection_id: &ConnectionId, reason: impl fmt::Display) -> Self {
        Error::TransportDisconnect {
            connection_id: connection_id.clone(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SessionNotFound { client_id } => {
                write!(f, "No open session for client {client_id}")
            }
            Error::TransportDisconnect {
                connection_id,
                reason,
            } => write!(f, "Connection {connection_id} disconnected: {reason}"),
        }
    }
}

impl std::error::Error for Error {}
