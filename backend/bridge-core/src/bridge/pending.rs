//! Pending reply handle returned by dispatch.

use crate::error::bridge::BridgeError;
use crate::protocol::Reply;

use common::ErrorLocation;

use std::panic::Location;

use tokio::sync::oneshot;

/// The eventual outcome of one dispatched command.
///
/// Resolved exactly once by the reply router, with either the backend's
/// reply or a typed failure. Never resolves synchronously: a caller must
/// await [`wait`](Self::wait) (or subscribe via the underlying receiver)
/// without blocking other traffic on the channel - any number of pending
/// replies may be outstanding concurrently.
#[derive(Debug)]
pub struct PendingReply {
    request_id: u64,
    receiver: oneshot::Receiver<Result<Reply, BridgeError>>,
}

impl PendingReply {
    pub(crate) fn new(
        request_id: u64,
        receiver: oneshot::Receiver<Result<Reply, BridgeError>>,
    ) -> Self {
        Self {
            request_id,
            receiver,
        }
    }

    /// Correlation id of the dispatched request, usable with
    /// [`Bridge::cancel`](crate::bridge::Bridge::cancel).
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Await the outcome.
    ///
    /// # Errors
    ///
    /// Any [`BridgeError`] the router resolved the request with, or
    /// [`BridgeError::Cancelled`] if the request was cancelled before a
    /// reply arrived.
    pub async fn wait(self) -> Result<Reply, BridgeError> {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(BridgeError::Cancelled {
                request_id: self.request_id,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
