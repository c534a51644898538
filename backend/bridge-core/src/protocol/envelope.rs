use crate::protocol::Command;

use common::HandleId;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound frame: a command paired with its correlation id.
///
/// The id is assigned by the dispatcher at send time and never reused while
/// the request is outstanding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub id: u64,
    pub command: Command,
}

/// Inbound frame: the outcome for one previously dispatched request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: u64,
    pub outcome: Outcome,
}

/// Exactly one of these resolves each request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Ok(Reply),
    Error { message: String },
}

/// Reply shapes a backend can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Reply {
    /// Acknowledges an `Initiate` command with a fresh resource handle.
    Handle { handle: HandleId },

    /// One batch of items for `handle`. `done = true` marks the handle
    /// exhausted; `cursor` is the backend's next iteration position,
    /// opaque to the bridge.
    Page {
        handle: HandleId,
        items: Vec<Value>,
        done: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cursor: Option<Value>,
    },

    /// Opaque reply to a `OneShot` command.
    Value { value: Value },
}

/// Encode an outbound request envelope as a JSON frame.
pub fn encode_request(envelope: &RequestEnvelope) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(envelope)
}

/// Decode an inbound response frame.
///
/// A frame that fails to decode - truncated, not JSON, or missing the
/// correlation id - cannot be attributed to any request. The router treats
/// that as fatal to the channel, not as a per-request error.
pub fn decode_response(raw: &[u8]) -> Result<ResponseEnvelope, serde_json::Error> {
    serde_json::from_slice(raw)
}

/// Decode an inbound request frame (backend side of the channel).
pub fn decode_request(raw: &[u8]) -> Result<RequestEnvelope, serde_json::Error> {
    serde_json::from_slice(raw)
}

/// Encode an outbound response envelope as a JSON frame (backend side).
pub fn encode_response(envelope: &ResponseEnvelope) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(envelope)
}
