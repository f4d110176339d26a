//! WebSocket connection management, room membership, and frame routing.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `connection` | Per-connection state: identity, outbound queue, liveness |
//! | `rooms` | Room registry: membership map + room-scoped broadcast fan-out |
//! | `handler` | Inbound frame classification and broadcast dispatch |
//! | `session` | Connection lifecycle: upgrade through teardown |
//!
//! ## Data Flow
//!
//! `session` (read loop) → `handler` (classify) → `rooms` (fan-out,
//! excluding the sender) → each recipient's `connection` queue → that
//! recipient's `session` writer task.

pub mod connection;
pub mod handler;
pub mod rooms;
pub mod session;
