//! Branded ID newtypes for type safety.
//!
//! Rooms, peers, and connections are all identified by strings on the wire;
//! distinct newtypes prevent passing a room code where a peer name is
//! expected. Room codes and peer names are opaque, externally supplied
//! values — the relay never generates or validates them. Connection IDs are
//! relay-generated UUID v7 values (time-ordered).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! branded_str {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_str! {
    /// Opaque room code, supplied by the client in the connection URI.
    RoomCode
}

branded_str! {
    /// Peer display name. A connection's own copy is its session identity;
    /// copies inside frame payloads are client-declared and unverified.
    PeerName
}

branded_str! {
    /// Unique identifier for one active connection.
    ConnectionId
}

impl ConnectionId {
    /// Generate a fresh connection ID (`conn_<uuid-v7>`, time-ordered).
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("conn_{}", Uuid::now_v7()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_connection_ids_are_unique() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn generated_connection_id_is_uuid_v7() {
        let id = ConnectionId::generate();
        let raw = id.as_str().strip_prefix("conn_").expect("conn_ prefix");
        let parsed = Uuid::parse_str(raw).expect("should be valid UUID");
        assert_eq!(parsed.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn room_code_from_str() {
        let room = RoomCode::from("lobby42");
        assert_eq!(room.as_str(), "lobby42");
    }

    #[test]
    fn deref_to_str() {
        let peer = PeerName::from("alice");
        let s: &str = &peer;
        assert_eq!(s, "alice");
    }

    #[test]
    fn display() {
        let room = RoomCode::from("abc");
        assert_eq!(format!("{room}"), "abc");
    }

    #[test]
    fn into_string() {
        let peer = PeerName::from("bob");
        let s: String = peer.into();
        assert_eq!(s, "bob");
    }

    #[test]
    fn into_inner() {
        let room = RoomCode::from("inner");
        assert_eq!(room.into_inner(), "inner");
    }

    #[test]
    fn serde_is_transparent() {
        let peer = PeerName::from("alice");
        let json = serde_json::to_string(&peer).unwrap();
        assert_eq!(json, "\"alice\"");
        let back: PeerName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, peer);
    }

    #[test]
    fn hash_and_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        let id = ConnectionId::from("same");
        let _ = set.insert(id.clone());
        let _ = set.insert(id);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn distinct_types_do_not_compare() {
        // Compile-time property: RoomCode and PeerName are different types.
        // Runtime check that equal strings still produce equal values per type.
        assert_eq!(RoomCode::from("x"), RoomCode::from("x"));
        assert_eq!(PeerName::from("x"), PeerName::from("x"));
    }
}
