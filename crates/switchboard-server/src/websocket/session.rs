//! Connection lifecycle — drives a single client from upgrade through
//! teardown.
//!
//! A connection moves `CONNECTING -> JOINED -> CLOSED`: it is JOINED the
//! moment the registry add completes (no join frame is required), and
//! CLOSED is terminal. Whatever ends the session — client close frame,
//! abrupt socket drop, pong timeout, registry eviction, relay shutdown —
//! the teardown pair (leave broadcast + registry removal) runs exactly
//! once, guarded by the connection's close-once flag.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::connection::PeerConnection;
use super::handler::handle_frame;
use super::rooms::RoomRegistry;

/// Ping/pong liveness settings for one session.
#[derive(Clone, Copy, Debug)]
pub struct Heartbeat {
    /// Interval between server-initiated Ping frames.
    pub interval: Duration,
    /// Disconnect after this long without a pong.
    pub timeout: Duration,
}

/// Run a WebSocket session for a connected peer.
///
/// 1. Registers the connection with the room registry
/// 2. Spawns the writer task: drains the outbound queue, sends periodic
///    Ping frames, disconnects unresponsive clients, closes on shutdown
/// 3. Reads inbound frames and dispatches them through the frame handler
/// 4. Tears down (leave broadcast + registry removal) on every exit path
#[instrument(skip_all, fields(connection_id = %connection.id, room = %connection.room()))]
pub async fn run_ws_session(
    ws: WebSocket,
    connection: Arc<PeerConnection>,
    send_rx: mpsc::Receiver<Arc<String>>,
    rooms: Arc<RoomRegistry>,
    heartbeat: Heartbeat,
    cancel: CancellationToken,
) {
    let (ws_tx, ws_rx) = ws.split();

    info!(peer = %connection.peer(), "client connected");
    counter!("relay_connections_total").increment(1);
    gauge!("relay_connections_active").increment(1.0);

    rooms.add_member(Arc::clone(&connection)).await;

    let mut writer = tokio::spawn(write_loop(
        ws_tx,
        send_rx,
        Arc::clone(&connection),
        heartbeat,
        cancel,
    ));
    let mut reader = tokio::spawn(read_loop(ws_rx, Arc::clone(&connection), Arc::clone(&rooms)));

    // Either half ending means the session is over.
    tokio::select! {
        _ = &mut writer => {},
        _ = &mut reader => {},
    }
    writer.abort();
    reader.abort();

    info!(peer = %connection.peer(), "client disconnected");
    counter!("relay_disconnections_total").increment(1);
    gauge!("relay_connections_active").decrement(1.0);
    histogram!("relay_connection_duration_seconds").record(connection.age().as_secs_f64());

    let _ = rooms.close_member(&connection).await;
}

/// Forward queued messages to the socket, with periodic Ping frames and
/// shutdown handling.
async fn write_loop(
    mut ws_tx: futures::stream::SplitSink<WebSocket, Message>,
    mut send_rx: mpsc::Receiver<Arc<String>>,
    connection: Arc<PeerConnection>,
    heartbeat: Heartbeat,
    cancel: CancellationToken,
) {
    let mut ping_interval = tokio::time::interval(heartbeat.interval);
    // Skip the immediate first tick
    let _ = ping_interval.tick().await;

    loop {
        tokio::select! {
            msg = send_rx.recv() => {
                match msg {
                    Some(text) => {
                        if ws_tx.send(Message::Text(text.as_str().into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = ping_interval.tick() => {
                if !connection.check_alive()
                    && connection.last_pong_elapsed() > heartbeat.timeout
                {
                    warn!("client unresponsive for {:?}, disconnecting", heartbeat.timeout);
                    break;
                }
                if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }
            () = cancel.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
        }
    }
}

/// Read inbound frames and dispatch them until the socket ends.
async fn read_loop(
    mut ws_rx: futures::stream::SplitStream<WebSocket>,
    connection: Arc<PeerConnection>,
    rooms: Arc<RoomRegistry>,
) {
    while let Some(Ok(msg)) = ws_rx.next().await {
        if connection.is_closed() {
            // Evicted by the registry; stop reading.
            break;
        }

        // Accept text, and binary frames that carry UTF-8 JSON
        let text = match msg {
            Message::Text(ref t) => Some(t.to_string()),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => Some(s.to_owned()),
                Err(_) => {
                    debug!(len = data.len(), "ignoring non-UTF8 binary frame");
                    None
                }
            },
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                None
            }
        };
        let Some(text) = text else { continue };

        connection.mark_alive();
        counter!("relay_frames_total").increment(1);

        if let Err(err) = handle_frame(&text, &connection, &rooms).await {
            counter!("relay_protocol_errors_total").increment(1);
            warn!(kind = err.error_kind(), error = %err, "dropping malformed frame");
        }
    }
}

#[cfg(test)]
mod tests {
    // Session behavior needs a live socket on both ends and is covered by
    // tests/integration.rs. Unit tests here pin the heartbeat math.

    use super::*;

    #[test]
    fn heartbeat_is_copyable() {
        let hb = Heartbeat {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(90),
        };
        let hb2 = hb;
        assert_eq!(hb2.interval, hb.interval);
        assert_eq!(hb2.timeout, hb.timeout);
    }

    #[test]
    fn heartbeat_debug_output() {
        let hb = Heartbeat {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(3),
        };
        let debug = format!("{hb:?}");
        assert!(debug.contains("interval"));
    }
}
