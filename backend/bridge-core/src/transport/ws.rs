//! WebSocket transport to a localhost backend.
//!
//! The bridge is the connecting side: the backend process listens on a
//! loopback port and the UI process dials it. Binary frames carry the JSON
//! envelopes; text frames are accepted too for backends that prefer them.

use crate::bridge::ReplyRouter;
use crate::error::CoreError;
use crate::error::transport::TransportError;
use crate::transport::Transport;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Send half of a WebSocket connection to the backend.
pub struct WsTransport {
    write: Arc<Mutex<WsSink>>,
}

impl WsTransport {
    /// Connect to a backend WebSocket endpoint.
    ///
    /// Returns the transport (hand it to [`Bridge::new`]) and the reader
    /// (spawn [`WsReader::run`] with the bridge's router).
    ///
    /// # Errors
    ///
    /// - [`TransportError::InvalidUrl`] - `url` is not a parseable URL
    /// - [`TransportError::Handshake`] - TCP connect or WebSocket upgrade
    ///   failed
    ///
    /// [`Bridge::new`]: crate::bridge::Bridge::new
    pub async fn connect(url: &str) -> Result<(Self, WsReader), TransportError> {
        let parsed = url::Url::parse(url).map_err(|e| TransportError::InvalidUrl {
            message: format!("{url}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let (ws_stream, _) =
            connect_async(parsed.as_str())
                .await
                .map_err(|e| TransportError::Handshake {
                    message: format!("WebSocket handshake with {url} failed: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                })?;

        info!("Connected to backend at {url}");

        let (write, read) = ws_stream.split();
        Ok((
            Self {
                write: Arc::new(Mutex::new(write)),
            },
            WsReader { read },
        ))
    }
}

impl Transport for WsTransport {
    fn send(&self, frame: Vec<u8>) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            let mut write = self.write.lock().await;
            write
                .send(Message::Binary(frame.into()))
                .await
                .map_err(|e| TransportError::Send {
                    message: format!("Failed to send frame: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                })
        })
    }
}

/// Receive half of the WebSocket connection.
pub struct WsReader {
    read: WsStream,
}

impl WsReader {
    /// Pump inbound frames into the router until the connection ends.
    ///
    /// Usually spawned as a background task. Returns cleanly when the
    /// backend closes the connection.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::ProtocolViolation`] - an unparseable frame poisoned
    ///   the channel; the loop stops because nothing further can be
    ///   correlated
    /// - [`TransportError::Read`] - the socket failed mid-read
    ///
    /// [`BridgeError::ProtocolViolation`]: crate::error::BridgeError::ProtocolViolation
    pub async fn run(mut self, router: ReplyRouter) -> Result<(), CoreError> {
        while let Some(msg) = self.read.next().await {
            match msg {
                Ok(Message::Binary(data)) => router.on_frame(&data).await?,
                Ok(Message::Text(text)) => router.on_frame(text.as_bytes()).await?,
                Ok(Message::Close(_)) => {
                    info!("Backend closed the connection");
                    return Ok(());
                }
                Ok(_) => {
                    // Ping/pong handled by tungstenite
                }
                Err(e) => {
                    warn!("WebSocket read failed: {e}");
                    return Err(TransportError::Read {
                        message: format!("Error reading frame: {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    }
                    .into());
                }
            }
        }

        info!("Backend connection ended");
        Ok(())
    }
}
