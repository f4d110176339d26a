//! Room registry — the single authoritative room → members map, and the
//! only path through which broadcasts occur.
//!
//! Rooms are created implicitly on first join and dropped when membership
//! reaches zero. All mutation goes through [`RoomRegistry::add_member`] and
//! [`RoomRegistry::close_member`]; all reads go through the broadcast
//! methods. One `RwLock` over the whole map is the mutual-exclusion
//! boundary — broadcasts take the read side, membership changes the write
//! side, so a leave can never race a fan-out to the leaving member.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metrics::{counter, gauge};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use switchboard_core::{ConnectionId, RoomCode, RoomNotice};

use super::connection::PeerConnection;

/// Maximum lifetime message drops before a slow member is evicted.
const MAX_TOTAL_DROPS: u64 = 100;

type MemberMap = HashMap<ConnectionId, Arc<PeerConnection>>;

/// Tracks which connections belong to which room and fans out messages.
pub struct RoomRegistry {
    /// Room code → members, keyed by connection ID (duplicate-free).
    rooms: RwLock<HashMap<RoomCode, MemberMap>>,
    /// Atomic counter tracking total members (avoids read-locking for
    /// count queries).
    active_count: AtomicUsize,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Insert a connection into its room, creating the room if absent.
    pub async fn add_member(&self, connection: Arc<PeerConnection>) {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(connection.room().clone()).or_default();
        if members.insert(connection.id.clone(), connection).is_none() {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
        gauge!("relay_rooms_active").set(rooms.len() as f64);
    }

    /// Remove a connection from its room and announce the departure to the
    /// remaining members, as one atomic step. The leave notice carries the
    /// connection's *session* identity.
    ///
    /// Runs at most once per connection regardless of how many callers race
    /// here (client close, socket drop, eviction, relay shutdown); later
    /// callers return `false` without side effects. Removing a connection
    /// that was never registered is a benign no-op apart from consuming the
    /// close guard.
    pub async fn close_member(&self, connection: &Arc<PeerConnection>) -> bool {
        if !connection.begin_close() {
            return false;
        }

        let mut rooms = self.rooms.write().await;
        let room = connection.room();
        let Some(members) = rooms.get_mut(room) else {
            debug!(%room, connection_id = %connection.id, "close for absent room");
            return false;
        };
        let removed = members.remove(&connection.id).is_some();
        if removed {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);

            let notice = RoomNotice::Leave {
                peer: connection.peer().clone(),
            };
            match serde_json::to_string(&notice) {
                Ok(json) => {
                    let json = Arc::new(json);
                    let mut recipients = 0u32;
                    for member in members.values() {
                        recipients += 1;
                        if !member.send(Arc::clone(&json)) {
                            counter!("relay_broadcast_drops_total").increment(1);
                        }
                    }
                    debug!(%room, peer = %connection.peer(), recipients, "broadcast leave");
                }
                Err(e) => warn!(error = %e, "failed to serialize leave notice"),
            }
        } else {
            debug!(%room, connection_id = %connection.id, "close for unregistered member");
        }

        if members.is_empty() {
            let _ = rooms.remove(room);
        }
        gauge!("relay_rooms_active").set(rooms.len() as f64);
        removed
    }

    /// Broadcast a synthesized room notice to every member of `room`
    /// except `exclude`.
    pub async fn broadcast_notice(
        &self,
        room: &RoomCode,
        exclude: Option<&ConnectionId>,
        notice: &RoomNotice,
    ) {
        match serde_json::to_string(notice) {
            Ok(json) => self.broadcast_raw(room, exclude, Arc::new(json), "notice").await,
            Err(e) => warn!(error = %e, "failed to serialize room notice"),
        }
    }

    /// Broadcast an opaque signal payload, verbatim, to every member of
    /// `room` except `exclude`.
    pub async fn broadcast_signal(
        &self,
        room: &RoomCode,
        exclude: Option<&ConnectionId>,
        payload: &Value,
    ) {
        match serde_json::to_string(payload) {
            Ok(json) => self.broadcast_raw(room, exclude, Arc::new(json), "signal").await,
            Err(e) => warn!(error = %e, "failed to serialize signal payload"),
        }
    }

    /// Fan out a pre-serialized message, then evict members whose lifetime
    /// drop count crossed the threshold.
    async fn broadcast_raw(
        &self,
        room: &RoomCode,
        exclude: Option<&ConnectionId>,
        json: Arc<String>,
        label: &'static str,
    ) {
        let mut to_evict: Vec<Arc<PeerConnection>> = Vec::new();
        {
            let rooms = self.rooms.read().await;
            let Some(members) = rooms.get(room) else {
                debug!(%room, label, "broadcast to absent room ignored");
                return;
            };
            let mut recipients = 0u32;
            for (id, member) in members {
                if exclude == Some(id) {
                    continue;
                }
                recipients += 1;
                if !member.send(Arc::clone(&json)) {
                    counter!("relay_broadcast_drops_total").increment(1);
                    let drops = member.drop_count();
                    if drops >= MAX_TOTAL_DROPS {
                        warn!(%room, connection_id = %id, drops, "evicting slow member");
                        to_evict.push(Arc::clone(member));
                    } else {
                        warn!(%room, connection_id = %id, drops, "dropped message for slow member");
                    }
                }
            }
            debug!(%room, label, recipients, "broadcast");
        }
        for member in to_evict {
            let _ = self.close_member(&member).await;
        }
    }

    /// Number of registered connections across all rooms.
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Number of rooms with at least one member.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Number of members in `room` (0 if the room does not exist).
    pub async fn member_count(&self, room: &RoomCode) -> usize {
        self.rooms.read().await.get(room).map_or(0, MemberMap::len)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
