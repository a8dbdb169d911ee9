use crate::connection::{ClientId, ConnectionId, ConnectionRegistry, Outbound};
use crate::error::Error;
use crate::message::{Message, MessageScope, Notice};
use log::*;
use std::sync::Arc;

/// Where a message ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered to exactly this connection
    Connection(ConnectionId),
    /// Broadcast reached this many connections
    Broadcast { recipients: usize },
}

pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register a newly opened connection and return its unique ID
    pub fn register_connection(&self, client_id: ClientId, sender: Outbound) -> ConnectionId {
        let connection_id = self.registry.register(client_id.clone(), sender);
        info!(
            "Registered connection {} for client {}",
            connection_id.as_str(),
            client_id
        );
        connection_id
    }

    /// Unregister a connection by ID. Safe to call more than once.
    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        info!("Unregistering connection {}", connection_id.as_str());
        self.registry.unregister(connection_id);
    }

    /// Send a message based on its scope. A client-scoped message goes to
    /// the earliest open connection of that client only; a broadcast is best
    /// effort and never fails.
    pub fn send_message(&self, message: Message) -> Result<Delivery, Error> {
        match message.scope {
            MessageScope::Client { client_id } => self
                .send_to_client(&client_id, &message.notice)
                .map(Delivery::Connection),
            MessageScope::Broadcast => Ok(Delivery::Broadcast {
                recipients: self.broadcast(&message.notice),
            }),
        }
    }

    fn send_to_client(&self, client_id: &str, notice: &Notice) -> Result<ConnectionId, Error> {
        let connection_id = self
            .registry
            .send_to_client(client_id, &notice.to_string())?;
        debug!(
            "Sent {} to client {client_id} on connection {}",
            notice.kind(),
            connection_id.as_str()
        );
        Ok(connection_id)
    }

    fn broadcast(&self, notice: &Notice) -> usize {
        let recipients = self.registry.broadcast(&notice.to_string());
        debug!("Broadcast {} to {recipients} connection(s)", notice.kind());
        recipients
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    pub fn client_count(&self) -> usize {
        self.registry.client_count()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
