//! Test helpers for bridge integration tests.
//!
//! This module provides utilities for playing the backend side of the
//! channel: decoding request frames from a `ChannelTransport` inbox,
//! building reply envelopes, and feeding them back through the router the
//! way a real transport would.

use bridge_core::bridge::ReplyRouter;
use bridge_core::protocol::{
    Outcome, Reply, RequestEnvelope, ResponseEnvelope, decode_request, encode_response,
};

use common::HandleId;

use serde_json::{Value, json};
use tokio::sync::mpsc;

/// Receive and decode the next request frame from the backend inbox.
pub async fn next_request(inbox: &mut mpsc::Receiver<Vec<u8>>) -> RequestEnvelope {
    let frame = inbox.recv().await.expect("backend inbox closed unexpectedly");
    decode_request(&frame).expect("request frame should decode")
}

/// Encode a response envelope and deliver it as an inbound frame.
pub async fn deliver(router: &ReplyRouter, envelope: &ResponseEnvelope) {
    let frame = encode_response(envelope).expect("response should encode");
    router
        .on_frame(&frame)
        .await
        .expect("well-formed frame should route");
}

/// Acknowledge an initiate command with a fresh handle token.
pub fn handle_ack(id: u64, token: &str) -> ResponseEnvelope {
    ResponseEnvelope {
        id,
        outcome: Outcome::Ok(Reply::Handle {
            handle: HandleId::new(token),
        }),
    }
}

/// A page of string items for `token`.
pub fn page_reply(
    id: u64,
    token: &str,
    items: &[&str],
    done: bool,
    cursor: Option<Value>,
) -> ResponseEnvelope {
    ResponseEnvelope {
        id,
        outcome: Outcome::Ok(Reply::Page {
            handle: HandleId::new(token),
            items: items.iter().map(|item| json!(item)).collect(),
            done,
            cursor,
        }),
    }
}

/// An opaque one-shot reply.
pub fn value_reply(id: u64, value: Value) -> ResponseEnvelope {
    ResponseEnvelope {
        id,
        outcome: Outcome::Ok(Reply::Value { value }),
    }
}

/// A backend-reported failure for one request.
pub fn error_reply(id: u64, message: &str) -> ResponseEnvelope {
    ResponseEnvelope {
        id,
        outcome: Outcome::Error {
            message: message.to_string(),
        },
    }
}
