use crate::connection::ClientId;
use std::fmt;

/// Text frames this gateway pushes to connected clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Acknowledges a frame received from the client.
    Echo { text: String },
    /// Announces that a client disconnected.
    Departure { client_id: ClientId },
}

impl Notice {
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::Echo { .. } => "echo",
            Notice::Departure { .. } => "departure",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Echo { text } => write!(f, "You wrote: {text}"),
            Notice::Departure { client_id } => write!(f, "Client #{client_id} left the chat"),
        }
    }
}

/// A notice together with where it should go.
#[derive(Debug, Clone)]
pub struct Message {
    pub notice: Notice,
    pub scope: MessageScope,
}

#[derive(Debug, Clone)]
pub enum MessageScope {
    /// Send to the earliest open connection of one client
    Client { client_id: ClientId },
    /// Send to every open connection
    Broadcast,
}
