//! Wire protocol for the bridge channel.
//!
//! Every outbound request travels as a [`RequestEnvelope`] `{ id, command }`
//! and every inbound reply as a [`ResponseEnvelope`] `{ id, outcome }`,
//! where the id is the correlation token pairing the two. The bridge logic
//! only ever sees these typed envelopes; the JSON codec at the bottom of
//! this module is the single place where bytes are produced or consumed.
//!
//! # Protocol
//!
//! - `Command` - closed set of command shapes (tagged `cmd`, camelCase)
//! - `Reply` - closed set of reply shapes (tagged `kind`, camelCase)
//! - `Outcome` - exactly one of `ok` / `error` resolves each request

mod command;
mod envelope;

pub use command::Command;
pub use envelope::{
    RequestEnvelope, ResponseEnvelope, Outcome, Reply, decode_request, decode_response,
    encode_request, encode_response,
};
