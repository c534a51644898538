//! Opaque resource handle tokens.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};

/// Opaque token identifying backend-side iteration state for a multi-item
/// resource (a directory listing, a search result set, ...).
///
/// The token is assigned by the backend when it acknowledges an initiating
/// command. Callers treat it as an unstructured capability: the bridge never
/// parses it, it only uses it as a lookup key. Serializes transparently as
/// the underlying string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(String);

impl HandleId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for HandleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}
