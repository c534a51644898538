//! Caller-visible page of a paginated resource.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One batch of items from a paginated resource.
///
/// Items are opaque to the bridge - their shape depends entirely on the
/// backend command that created the resource. `done` is true iff no further
/// items remain for the handle this page was fetched from; once a `done`
/// page has been delivered, the handle is exhausted and no later page for
/// it may report additional items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Value>,
    pub done: bool,
}

impl Page {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
