use crate::error::transport::TransportError;

use common::{ErrorLocation, HandleId};

use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors surfaced to bridge callers.
///
/// Per-request failures (`StaleHandle`, `Backend`, `Timeout`, `Cancelled`)
/// resolve through the same continuation path as success and leave the
/// channel healthy. Only `ProtocolViolation` is fatal to the channel: once
/// raised, the bridge refuses new dispatches until the host resets it.
#[derive(Debug, ThisError)]
pub enum BridgeError {
    /// The transport refused the outbound frame; the request was never
    /// registered and no reply will ever arrive.
    #[error("Transport Unavailable: {message} {location}")]
    TransportUnavailable {
        message: String,
        location: ErrorLocation,
    },

    /// Malformed or unidentifiable inbound frame. Fatal to the channel:
    /// no further replies can be safely correlated.
    #[error("Protocol Violation: {message} {location}")]
    ProtocolViolation {
        message: String,
        location: ErrorLocation,
    },

    /// A page fetch targeted a handle that is unknown, released, or already
    /// exhausted. Rejected client-side without contacting the transport.
    #[error("Stale Handle: {handle} is unknown or exhausted {location}")]
    StaleHandle {
        handle: HandleId,
        location: ErrorLocation,
    },

    /// The backend explicitly reported failure for this request. The
    /// channel remains healthy.
    #[error("Backend Error: {message}")]
    Backend { message: String },

    /// The pending reply was cancelled before a reply arrived.
    #[error("Cancelled: request {request_id} was cancelled before a reply arrived {location}")]
    Cancelled {
        request_id: u64,
        location: ErrorLocation,
    },

    /// Host-layered deadline elapsed; the request was cancelled and any
    /// late reply will be discarded.
    #[error("Timeout: request {request_id} did not complete within the deadline {location}")]
    Timeout {
        request_id: u64,
        location: ErrorLocation,
    },

    /// The backend answered with a reply shape the typed surface did not
    /// ask for (e.g. a page in response to a one-shot command).
    #[error("Unexpected Reply: expected a {expected} reply {location}")]
    UnexpectedReply {
        expected: &'static str,
        location: ErrorLocation,
    },
}

impl From<TransportError> for BridgeError {
    #[track_caller]
    fn from(error: TransportError) -> Self {
        BridgeError::TransportUnavailable {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
