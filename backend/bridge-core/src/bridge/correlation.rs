//! Correlation table: in-flight request id -> waiting continuation.

use crate::error::bridge::BridgeError;
use crate::protocol::Reply;

use std::collections::HashMap;

use log::warn;
use tokio::sync::oneshot;

/// The continuation resolved when a reply (or failure) arrives for a request.
pub type Continuation = oneshot::Sender<Result<Reply, BridgeError>>;

/// Maps each outstanding request id to the continuation of its caller.
///
/// The table exclusively owns pending entries for their lifetime: an entry
/// is inserted on dispatch and removed exactly once, either by a matching
/// reply ([`resolve`](Self::resolve)) or by explicit
/// [`cancel`](Self::cancel). Ids are allocated from an atomic counter, so
/// no two pending entries ever share an id.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    entries: HashMap<u64, Continuation>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a pending request.
    ///
    /// A collision would mean the id allocator handed out a duplicate while
    /// the first request was still pending; the stale continuation is
    /// dropped (its caller observes a cancellation) and the fresh one wins.
    pub fn register(&mut self, id: u64, continuation: Continuation) {
        if self.entries.insert(id, continuation).is_some() {
            warn!("Correlation id {id} was re-registered while still pending");
        }
    }

    /// Whether `id` is still pending.
    pub fn contains(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Resolve a pending request with its outcome.
    ///
    /// Returns false and performs no action if `id` is absent (already
    /// resolved, cancelled, or never registered) - this is the
    /// double-resolution guard: a continuation can never be invoked twice.
    /// A continuation whose caller has dropped interest is resolved into
    /// the void, which is fine.
    pub fn resolve(&mut self, id: u64, outcome: Result<Reply, BridgeError>) -> bool {
        match self.entries.remove(&id) {
            Some(continuation) => {
                if continuation.send(outcome).is_err() {
                    warn!("Request {id} resolved but its caller dropped interest");
                }
                true
            }
            None => false,
        }
    }

    /// Remove a pending request without invoking its continuation.
    ///
    /// Returns false if `id` was not pending. Dropping the continuation
    /// makes a caller still awaiting it observe `Cancelled`.
    pub fn cancel(&mut self, id: u64) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Remove and return every pending entry (channel-fatal shutdown path).
    pub fn drain(&mut self) -> Vec<(u64, Continuation)> {
        self.entries.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
