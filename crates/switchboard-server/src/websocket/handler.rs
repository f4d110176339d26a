//! Inbound frame dispatch — classifies each frame and turns it into a
//! room-scoped broadcast, always excluding the sender.
//!
//! A `join` frame becomes a synthesized join notice carrying the
//! *payload-declared* peer name (which may disagree with the sender's
//! session identity; the relay does not reconcile the two). Every other
//! frame is an opaque signal relayed verbatim. A frame that fails to parse
//! is dropped and the connection stays open.

use std::sync::Arc;

use tracing::debug;

use switchboard_core::{InboundFrame, ProtocolError, RoomNotice};

use super::connection::PeerConnection;
use super::rooms::RoomRegistry;

/// Classify one inbound frame and perform the matching broadcast.
pub async fn handle_frame(
    text: &str,
    connection: &Arc<PeerConnection>,
    rooms: &RoomRegistry,
) -> Result<(), ProtocolError> {
    match InboundFrame::parse(text)? {
        InboundFrame::Join { peer } => {
            debug!(room = %connection.room(), declared = %peer, "relaying join notice");
            rooms
                .broadcast_notice(
                    connection.room(),
                    Some(&connection.id),
                    &RoomNotice::Join { peer },
                )
                .await;
        }
        InboundFrame::Signal(payload) => {
            rooms
                .broadcast_signal(connection.room(), Some(&connection.id), &payload)
                .await;
        }
    }
    Ok(())
}
