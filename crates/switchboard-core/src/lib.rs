//! # switchboard-core
//!
//! Shared protocol types for the switchboard signaling relay.
//!
//! - Branded ID newtypes for rooms, peers, and connections
//! - Inbound frame classification (`join` vs. opaque signal pass-through)
//! - Synthesized room notices (`join`/`leave`) in wire format
//! - Protocol error taxonomy

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod protocol;

pub use errors::ProtocolError;
pub use ids::{ConnectionId, PeerName, RoomCode};
pub use protocol::{InboundFrame, RoomNotice};
