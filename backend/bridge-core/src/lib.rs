//! Transom bridge core.
//!
//! Asynchronous command bridge between a UI process and a native backend.
//! Callers dispatch commands and await correlated replies; backends that
//! expose paginated resources (directory listings, search results) hand out
//! opaque handles that are fetched incrementally, one page at a time.
//!
//! # Architecture
//!
//! - [`bridge::Bridge`] - dispatches commands, owns the shared bridge state
//! - [`bridge::ReplyRouter`] - routes inbound frames back to waiting callers
//! - [`transport`] - pluggable duplex channel (in-process or WebSocket)
//! - [`protocol`] - typed command/reply envelopes and their JSON codec
//!
//! The bridge never blocks the caller: every dispatch returns a pending
//! reply that resolves exactly once, success or error, regardless of the
//! order in which the backend answers.

pub mod bridge;
pub mod error;
pub mod protocol;
pub mod transport;

#[cfg(test)]
mod tests;

pub use bridge::{Bridge, PendingReply, ReplyRouter};
pub use error::CoreError;

/// Default capacity for in-process transport channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;
