//! Duplex channel implementations.
//!
//! The transport is the only truly shared I/O resource of the bridge. It
//! accepts opaque request frames and the host wires whatever it delivers
//! back into [`ReplyRouter::on_frame`](crate::bridge::ReplyRouter::on_frame).
//! Delivery may fail, and replies to different requests may arrive in any
//! order - the bridge promises nothing about cross-request ordering.
//!
//! Two implementations ship with the crate:
//!
//! - [`ChannelTransport`] - in-process `mpsc` pair, used by tests and hosts
//!   that embed the backend in the same process
//! - [`WsTransport`] - WebSocket client to a localhost backend

mod channel;
mod ws;

pub use channel::ChannelTransport;
pub use ws::{WsReader, WsTransport};

use crate::error::transport::TransportError;

use futures_util::future::BoxFuture;

/// One direction of the duplex channel: UI process to backend.
///
/// `send` either accepts the frame for delivery or fails; it never retries.
/// A failed send means the request was never seen by the backend and the
/// dispatcher surfaces `TransportUnavailable` without registering it.
pub trait Transport: Send + Sync {
    fn send(&self, frame: Vec<u8>) -> BoxFuture<'_, Result<(), TransportError>>;
}
