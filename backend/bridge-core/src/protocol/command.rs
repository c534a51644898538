use common::HandleId;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Commands a caller can dispatch over the bridge.
///
/// The set is closed and statically typed: a command either exists as a
/// variant here or it cannot be dispatched at all, so there is no runtime
/// capability check before wiring a handler. Payloads stay opaque - the
/// bridge forwards `params` and `payload` values untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum Command {
    /// Open a paginated resource (listing, search, ...). The backend
    /// acknowledges with a fresh opaque handle.
    Initiate { params: Value },

    /// Fetch the next page of at most `amount` items from a previously
    /// opened resource. `cursor` is injected by the dispatcher from the
    /// resource registry; callers never supply it.
    FetchPage {
        handle: HandleId,
        amount: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cursor: Option<Value>,
    },

    /// Fire a single command with a single opaque reply.
    OneShot { payload: Value },
}
