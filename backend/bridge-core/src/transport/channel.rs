//! In-process transport over a tokio mpsc channel.

use crate::error::transport::TransportError;
use crate::transport::Transport;

use common::ErrorLocation;

use std::panic::Location;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;

/// Transport whose backend lives in the same process.
///
/// [`pair`](Self::pair) yields the transport and the backend's inbox; the
/// backend consumes raw request frames from the receiver and answers by
/// feeding response frames into the bridge's router. Dropping the receiver
/// closes the channel, after which every send fails with
/// [`TransportError::Closed`].
#[derive(Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelTransport {
    /// Create a transport and the matching backend inbox.
    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, frame: Vec<u8>) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            self.tx
                .send(frame)
                .await
                .map_err(|_| TransportError::Closed {
                    message: "backend inbox was dropped".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })
        })
    }
}
