//! Chat behaviour on top of the session registry: acknowledging frames and
//! announcing departures.

use crate::error::Error;
use log::*;
use session::message::{Message, MessageScope, Notice};
use session::{ConnectionId, Delivery, Manager};

/// Acknowledge a frame received from `client_id` with `"You wrote: {text}"`.
///
/// The acknowledgement goes through the registry, so it lands on the
/// earliest open connection registered for that client id.
pub fn acknowledge(manager: &Manager, client_id: &str, text: &str) -> Result<Delivery, Error> {
    let message = Message {
        notice: Notice::Echo {
            text: text.to_string(),
        },
        scope: MessageScope::Client {
            client_id: client_id.to_string(),
        },
    };
    Ok(manager.send_message(message)?)
}

/// Remove a closed connection and tell everyone still connected that its
/// client left. The connection is unregistered first, so the departing
/// connection never receives its own notice.
pub fn depart(
    manager: &Manager,
    connection_id: &ConnectionId,
    client_id: &str,
) -> Result<Delivery, Error> {
    manager.unregister_connection(connection_id);

    let delivery = manager.send_message(Message {
        notice: Notice::Departure {
            client_id: client_id.to_string(),
        },
        scope: MessageScope::Broadcast,
    })?;
    debug!("Client {client_id} departure announced: {delivery:?}");
    Ok(delivery)
}
