//! Domain layer of the gateway.
//!
//! - `chat`: acknowledging client frames and announcing departures through
//!   the `session` registry
//! - `relay`: bridging one inbound request to one streaming upstream call
//! - `gateway`: HTTP clients for the services the gateway talks to
//! - `error`: the layered domain error type consumed by `web`

pub mod chat;
pub mod error;
pub mod gateway;
pub mod relay;

pub use gateway::inference::InferenceClient;
pub use relay::{ChunkStream, RelayRequest, RelayStream};
