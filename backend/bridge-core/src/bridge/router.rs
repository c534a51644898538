//! Inbound frame routing.

use crate::bridge::state::{BridgeState, StateCommand};
use crate::error::bridge::BridgeError;
use crate::protocol::{ResponseEnvelope, decode_response};

use common::ErrorLocation;

use std::panic::Location;

use log::{debug, error};

/// Receive-side endpoint of the bridge.
///
/// The host invokes [`on_frame`](Self::on_frame) for every frame the
/// transport delivers. Each frame resolves the correlation entry for its
/// embedded id at most once; frames for unknown or already-resolved ids are
/// logged and ignored.
#[derive(Clone)]
pub struct ReplyRouter {
    state: BridgeState,
}

impl ReplyRouter {
    pub(crate) fn new(state: BridgeState) -> Self {
        Self { state }
    }

    /// Route one raw inbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ProtocolViolation`] if the frame cannot be
    /// decoded. This is fatal to the channel, not per-request: the
    /// correlation id is unrecoverable, so no further replies can be safely
    /// attributed. The bridge is poisoned - every pending request fails and
    /// new dispatches are refused until the host resets the channel.
    pub async fn on_frame(&self, raw: &[u8]) -> Result<(), BridgeError> {
        match decode_response(raw) {
            Ok(envelope) => {
                self.on_reply(envelope).await;
                Ok(())
            }
            Err(e) => {
                let message = format!("Unparseable inbound frame: {e}");
                error!("{message}");
                self.state
                    .update(StateCommand::Poison {
                        message: message.clone(),
                    })
                    .await
                    .ok();
                Err(BridgeError::ProtocolViolation {
                    message,
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Route one decoded reply envelope.
    ///
    /// Hosts with an in-process backend can skip the byte codec and deliver
    /// typed envelopes directly.
    pub async fn on_reply(&self, envelope: ResponseEnvelope) {
        debug!("Routing reply for request {}", envelope.id);
        self.state
            .update(StateCommand::Resolve {
                id: envelope.id,
                outcome: envelope.outcome,
            })
            .await
            .ok();
    }
}
