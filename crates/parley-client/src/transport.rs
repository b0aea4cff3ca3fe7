//! WebSocket transport for the rendezvous channel.
//!
//! Provides [`ConnectedChannel`] which handles the WebSocket I/O for event
//! transport. This is a thin layer that just encodes/decodes event frames -
//! protocol logic remains in the Sans-IO [`Coordinator`].
//!
//! [`Coordinator`]: crate::Coordinator

use futures_util::{SinkExt, StreamExt};
use parley_proto::{ClientEvent, ServerEvent};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, warn};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Handle to a connected rendezvous channel.
///
/// Provides channels for event transport. Events are sent/received via
/// the channels, and an internal task handles the WebSocket I/O.
pub struct ConnectedChannel {
    /// Send events to the server.
    pub to_server: mpsc::Sender<ClientEvent>,
    /// Receive events from the server.
    pub from_server: mpsc::Receiver<ServerEvent>,
    /// Abort handle to stop the channel task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedChannel {
    /// Close the channel. Idempotent.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Connect to a rendezvous server via WebSocket.
///
/// Returns a [`ConnectedChannel`] with channels for event transport.
pub async fn connect(url: &str) -> Result<ConnectedChannel, TransportError> {
    let (stream, _response) = connect_async(url)
        .await
        .map_err(|e| TransportError::Connection(format!("connect failed: {e}")))?;

    let (to_server_tx, to_server_rx) = mpsc::channel::<ClientEvent>(32);
    let (from_server_tx, from_server_rx) = mpsc::channel::<ServerEvent>(32);

    let handle = tokio::spawn(run_channel(stream, to_server_rx, from_server_tx));

    Ok(ConnectedChannel {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Run the channel, bridging between the mpsc pair and the WebSocket.
///
/// Malformed inbound frames are logged and skipped; one bad frame must not
/// take the whole channel down.
async fn run_channel<S>(
    stream: tokio_tungstenite::WebSocketStream<S>,
    mut to_server: mpsc::Receiver<ClientEvent>,
    from_server: mpsc::Sender<ServerEvent>,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            outbound = to_server.recv() => {
                let Some(event) = outbound else {
                    // Coordinator side dropped its sender; close politely.
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                };
                match event.encode() {
                    Ok(text) => {
                        if let Err(e) = sink.send(WsMessage::Text(text.into())).await {
                            warn!(error = %e, "send failed; closing channel");
                            break;
                        }
                    },
                    Err(e) => warn!(error = %e, "dropping unencodable event"),
                }
            },
            inbound = source.next() => {
                let Some(message) = inbound else {
                    debug!("server closed the channel");
                    break;
                };
                match message {
                    Ok(WsMessage::Text(text)) => match ServerEvent::decode(&text) {
                        Ok(event) => {
                            if from_server.send(event).await.is_err() {
                                // Receiver gone; nothing left to deliver to.
                                break;
                            }
                        },
                        Err(e) => warn!(error = %e, "skipping malformed frame"),
                    },
                    Ok(WsMessage::Ping(_) | WsMessage::Pong(_)) => {},
                    Ok(WsMessage::Close(_)) => {
                        debug!("server closed the channel");
                        break;
                    },
                    Ok(_) => debug!("skipping non-text frame"),
                    Err(e) => {
                        warn!(error = %e, "stream error; closing channel");
                        break;
                    },
                }
            },
        }
    }
}
