//! Registry of live bidirectional client sessions.
//!
//! Each WebSocket connection registers under the client id taken from its
//! path and gets a server-generated [`ConnectionId`]. Client ids are not
//! unique: a targeted send goes to the earliest registered open connection
//! for that id, never to more than one.
//!
//! The registry never owns a socket. It holds the sending half of each
//! connection's outbound channel; the connection task owns the socket and
//! drains the channel, which keeps frames for one connection in send order.
//!
//! # Modules
//!
//! - `connection`: `ConnectionRegistry` and the `ConnectionId` handle
//! - `manager`: scope-based routing on top of the registry
//! - `message`: the text notices pushed to clients
//! - `error`: `SessionNotFound` and `TransportDisconnect`

pub mod connection;
pub mod error;
pub mod manager;
pub mod message;

pub use connection::{ClientId, ConnectionId};
pub use error::Error;
pub use manager::{Delivery, Manager};
