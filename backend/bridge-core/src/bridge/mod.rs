//! Request correlation and resource pagination.
//!
//! This module is the stateful core of the bridge. It provides:
//!
//! - [`Bridge`] - validates and dispatches commands, hands out pending replies
//! - [`ReplyRouter`] - resolves inbound frames against the correlation table
//! - [`CorrelationTable`] - maps in-flight request ids to waiting continuations
//! - [`ResourceRegistry`] - tracks cursor and exhaustion per resource handle
//!
//! # Architecture
//!
//! Two event sources touch the shared state: "caller wants to send" and
//! "transport delivered a frame". Both are serialized through a single state
//! actor ([`BridgeState`]) before they reach the correlation table or the
//! resource registry, so neither table ever sees concurrent mutation.
//!
//! # Guarantees
//!
//! - each registered request resolves at most once, and exactly once if a
//!   matching reply arrives
//! - replies with unknown or already-resolved ids are logged and ignored
//! - a handle that delivered a `done` page rejects further fetches with
//!   `StaleHandle` before the transport is contacted

mod correlation;
mod dispatcher;
mod pending;
mod registry;
mod router;
mod state;

pub use correlation::CorrelationTable;
pub use dispatcher::Bridge;
pub use pending::PendingReply;
pub use registry::{HandleStatus, ResourceRegistry};
pub use router::ReplyRouter;
pub use state::{BridgeState, StateCommand};
