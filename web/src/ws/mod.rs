//! WebSocket HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for chat sessions. The registry
//! itself lives in the `session` crate and the chat behaviour in `domain::chat`.

pub mod handler;
