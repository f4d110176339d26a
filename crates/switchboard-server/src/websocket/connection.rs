//! Per-connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use switchboard_core::{ConnectionId, PeerName, RoomCode};

/// One connected signaling peer.
///
/// A connection belongs to exactly one room for its entire lifetime and
/// holds no references to other connections — only its own outbound queue.
/// All fan-out goes through the room registry.
pub struct PeerConnection {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Session identity, fixed at accept time. Leave notices use this name.
    peer: PeerName,
    /// The room this connection belongs to, fixed at accept time.
    room: RoomCode,
    /// Send channel to the connection's WebSocket writer task.
    tx: mpsc::Sender<Arc<String>>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Whether the client has responded since the last ping.
    pub is_alive: AtomicBool,
    /// When the last Pong (or any activity) was received.
    last_pong: Mutex<Instant>,
    /// Count of messages dropped due to a full or closed queue.
    dropped_messages: AtomicU64,
    /// Set once teardown has begun; guards the leave pair.
    closed: AtomicBool,
}

impl PeerConnection {
    /// Create a new connection.
    pub fn new(id: ConnectionId, peer: PeerName, room: RoomCode, tx: mpsc::Sender<Arc<String>>) -> Self {
        let now = Instant::now();
        Self {
            id,
            peer,
            room,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// The session identity this connection authenticated with.
    pub fn peer(&self) -> &PeerName {
        &self.peer
    }

    /// The room this connection belongs to.
    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    /// Enqueue a text message for delivery.
    ///
    /// Never blocks. Returns `false` if the queue is full or closed — the
    /// message is dropped and counted; a recipient that stays in that state
    /// is cleaned up through its own close path.
    pub fn send(&self, message: Arc<String>) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Mark the teardown as begun.
    ///
    /// Returns `true` exactly once; later (or concurrent) callers get
    /// `false`. Whoever wins performs the leave broadcast + registry
    /// removal pair.
    pub fn begin_close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Whether teardown has begun.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Mark the connection as alive (pong or inbound activity).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag for the ping loop.
    ///
    /// Returns `true` if the connection was alive since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
