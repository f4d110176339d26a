//! # switchboard-server
//!
//! Axum HTTP + `WebSocket` relay server for room-scoped signaling.
//!
//! - `WebSocket` gateway: one task per connection, per-connection bounded
//!   outbound queues, ping/pong liveness
//! - Room registry: the single authoritative room → members map, and the
//!   only path through which broadcasts occur
//! - Frame routing: `join` notices and verbatim signal pass-through,
//!   always excluding the sender
//! - HTTP endpoints: health check, Prometheus metrics
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::RelayConfig;
pub use server::RelayServer;
