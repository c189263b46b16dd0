//! agentctl-client: async transport layer for the agent control client.
//!
//! Bridges the pure state core in `agentctl-core` to the backend's two
//! boundaries: the REST surface (snapshot fetch + control commands) and the
//! push channel (WebSocket). All state mutation is funneled through one
//! serialized event queue consumed by [`session::Session`], which publishes
//! complete read-model snapshots over a `tokio::sync::watch` channel for the
//! presentation layer.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod supervisor;

pub use agentctl_core::types;
