//! WebSocket transport for the session.
//!
//! Provides [`ConnectedRoom`], a handle to one live connection per
//! (room, user) pair. This is a thin layer that just moves text frames
//! between channels and the socket; decoding and all protocol logic remain
//! in the Sans-IO [`Session`](crate::Session).

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use url::Url;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint URL could not be built.
    #[error("invalid endpoint: {reason}")]
    Endpoint {
        /// What was wrong with the URL.
        reason: String,
    },

    /// The WebSocket handshake failed.
    #[error("websocket handshake failed: {reason}")]
    Handshake {
        /// Handshake diagnostic.
        reason: String,
    },
}

/// Something the transport observed on the live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// An inbound text frame, forwarded raw. The session owns decoding.
    Frame(String),

    /// The connection closed or errored. No more events will follow.
    Closed,
}

/// Handle to one live room connection.
///
/// Encoded outbound frames go into `to_room`; inbound traffic arrives on
/// `from_room`. An internal task owns the socket I/O.
pub struct ConnectedRoom {
    /// Send encoded frames to the room.
    pub to_room: mpsc::Sender<String>,
    /// Receive frames and closure notifications from the room.
    pub from_room: mpsc::Receiver<TransportEvent>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedRoom {
    /// Stop the connection task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Open the live transport for a (room, user) pair.
///
/// The connection path is `/ws/{room}/{user}` with both segments
/// percent-encoded. `base` may use an `http`/`https` scheme, which is
/// rewritten to `ws`/`wss`. Returns once the handshake completes.
pub async fn connect(base: &Url, room: &str, user: &str) -> Result<ConnectedRoom, TransportError> {
    let endpoint = room_endpoint(base, room, user)?;

    let (socket, _response) = connect_async(endpoint.as_str())
        .await
        .map_err(|err| TransportError::Handshake { reason: err.to_string() })?;

    let (to_room_tx, to_room_rx) = mpsc::channel::<String>(32);
    let (from_room_tx, from_room_rx) = mpsc::channel::<TransportEvent>(32);

    let handle = tokio::spawn(run_connection(socket, to_room_rx, from_room_tx));

    Ok(ConnectedRoom {
        to_room: to_room_tx,
        from_room: from_room_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Build the WebSocket endpoint for a (room, user) pair.
fn room_endpoint(base: &Url, room: &str, user: &str) -> Result<Url, TransportError> {
    let mut endpoint = base.clone();

    let scheme = match base.scheme() {
        "ws" | "wss" => None,
        "http" => Some("ws"),
        "https" => Some("wss"),
        other => {
            return Err(TransportError::Endpoint {
                reason: format!("unsupported scheme {other:?}"),
            });
        },
    };
    if let Some(scheme) = scheme {
        endpoint.set_scheme(scheme).map_err(|()| TransportError::Endpoint {
            reason: format!("cannot set scheme on {base}"),
        })?;
    }

    endpoint
        .path_segments_mut()
        .map_err(|()| TransportError::Endpoint { reason: format!("{base} cannot be a base") })?
        .pop_if_empty()
        .extend(["ws", room, user]);

    Ok(endpoint)
}

/// Run the connection, bridging between channels and the socket.
///
/// Binary, ping, and pong frames are ignored; close, read error, or a
/// dropped outbound sender ends the loop. A final [`TransportEvent::Closed`]
/// is always emitted so the driver can flag the disconnect.
async fn run_connection(
    socket: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    mut outbound: mpsc::Receiver<String>,
    events: mpsc::Sender<TransportEvent>,
) {
    let (mut writer, mut reader) = socket.split();

    loop {
        tokio::select! {
            maybe_frame = outbound.recv() => {
                let Some(raw) = maybe_frame else { break };
                if let Err(err) = writer.send(Message::text(raw)).await {
                    tracing::warn!("websocket send failed: {err}");
                    break;
                }
            }

            maybe_message = reader.next() => {
                match maybe_message {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(TransportEvent::Frame(text.to_string())).await.is_err() {
                            break;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {},
                    Some(Err(err)) => {
                        tracing::warn!("websocket receive failed: {err}");
                        break;
                    },
                }
            }
        }
    }

    let _ = events.send(TransportEvent::Closed).await;
}
