//! Resource registry: opaque handle -> backend-side iteration state.

use common::HandleId;

use std::collections::HashMap;

use serde_json::Value;

/// Lifecycle position of a resource handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStatus {
    /// Never allocated, or released.
    Unknown,
    /// Allocated and still producing pages.
    Active,
    /// A `done` page was delivered; fetches against it are a client error.
    Exhausted,
}

#[derive(Debug)]
struct HandleEntry {
    /// Backend-internal position marker, opaque to the bridge. Forwarded
    /// verbatim on the next page fetch.
    cursor: Option<Value>,
    exhausted: bool,
}

/// Tracks iteration state for every live resource handle.
///
/// Entries are created when the backend acknowledges an initiating command
/// and live until the handle is explicitly released - exhaustion alone does
/// not remove an entry, so a fetch against an exhausted handle can be told
/// apart from a fetch against a handle that never existed. Entries are
/// otherwise unbounded; hosts that open many resources must release them.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: HashMap<HandleId, HandleEntry>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record a freshly acknowledged handle.
    ///
    /// Returns false on collision with a live handle. Handles are assigned
    /// by the backend and must be unique, so a collision is a backend
    /// protocol fault; the existing entry is kept untouched and the caller
    /// escalates.
    pub fn allocate(&mut self, handle: HandleId) -> bool {
        if self.entries.contains_key(&handle) {
            return false;
        }
        self.entries.insert(
            handle,
            HandleEntry {
                cursor: None,
                exhausted: false,
            },
        );
        true
    }

    /// Advance a handle to the cursor reported by a page reply.
    ///
    /// Idempotent with respect to exhaustion: once a handle is exhausted,
    /// further calls are no-ops, which guards against duplicate or late
    /// page replies. Returns false if the handle is unknown (e.g. a page
    /// arrived after the host released the handle).
    pub fn advance(&mut self, handle: &HandleId, cursor: Option<Value>, done: bool) -> bool {
        match self.entries.get_mut(handle) {
            Some(entry) => {
                if !entry.exhausted {
                    entry.cursor = cursor;
                    if done {
                        entry.exhausted = true;
                    }
                }
                true
            }
            None => false,
        }
    }

    pub fn status(&self, handle: &HandleId) -> HandleStatus {
        match self.entries.get(handle) {
            None => HandleStatus::Unknown,
            Some(entry) if entry.exhausted => HandleStatus::Exhausted,
            Some(_) => HandleStatus::Active,
        }
    }

    /// Current cursor for a handle, forwarded on the next page fetch.
    pub fn cursor(&self, handle: &HandleId) -> Option<Value> {
        self.entries.get(handle).and_then(|entry| entry.cursor.clone())
    }

    /// Discard registry state for a handle the host no longer needs.
    ///
    /// Returns false if the handle was not present.
    pub fn release(&mut self, handle: &HandleId) -> bool {
        self.entries.remove(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
