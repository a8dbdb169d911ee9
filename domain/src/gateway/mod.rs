//! Clients for services this gateway talks to.

pub mod inference;
