//! Wire protocol: inbound frame classification and synthesized room notices.
//!
//! Inbound frames are JSON objects discriminated by an `action` field:
//!
//! ```json
//! { "action": "join" | <any other string>, "peer": "<string>", ... }
//! ```
//!
//! Only `"join"` is special. Every other action (offer, answer, candidate,
//! anything a client invents) is an opaque signal relayed verbatim — the
//! relay never inspects its shape beyond the structural parse.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ProtocolError;
use crate::ids::PeerName;

/// Discriminator field every inbound frame must carry.
const ACTION_FIELD: &str = "action";

/// Discriminator value that triggers a join notice.
const JOIN_ACTION: &str = "join";

/// Payload field naming the joining peer.
const PEER_FIELD: &str = "peer";

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// `action == "join"` — announce the payload-declared peer to the room.
    Join {
        /// The name the client declared in the payload. Unverified; may
        /// disagree with the connection's session identity.
        peer: PeerName,
    },
    /// Any other discriminator — relay the whole payload verbatim.
    Signal(Value),
}

impl InboundFrame {
    /// Classify a raw inbound frame.
    ///
    /// The discriminator must be present, but only the string `"join"` is
    /// interpreted; a non-string `action` still classifies as a signal
    /// because the relay has no opinion about payload shapes it relays.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let Some(object) = value.as_object() else {
            return Err(ProtocolError::NotAnObject);
        };
        let Some(action) = object.get(ACTION_FIELD) else {
            return Err(ProtocolError::MissingDiscriminator);
        };

        if action.as_str() == Some(JOIN_ACTION) {
            let peer = object
                .get(PEER_FIELD)
                .and_then(Value::as_str)
                .ok_or(ProtocolError::MissingPeer)?;
            Ok(Self::Join {
                peer: PeerName::from(peer),
            })
        } else {
            Ok(Self::Signal(value))
        }
    }
}

/// A relay-synthesized room notice, broadcast on membership changes.
///
/// Serializes to the exact shape clients expect:
/// `{"peer": "<name>", "action": "join"}` / `{"peer": "<name>", "action": "leave"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RoomNotice {
    /// Someone else joined the room. The name comes from the join payload.
    Join {
        /// Declared name of the joining peer.
        peer: PeerName,
    },
    /// Someone else left the room. The name is the leaver's session identity.
    Leave {
        /// Session identity of the departed peer.
        peer: PeerName,
    },
}
