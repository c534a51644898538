use crate::{HandleId, Page};
use serde_json::json;

/// **VALUE**: Verifies that HandleId serializes transparently as its string token.
///
/// **WHY THIS MATTERS**: Handles travel over the wire inside command and reply
/// envelopes. The backend assigned the token as a plain string and must get the
/// same plain string back on every page fetch - any wrapping object would break
/// correlation with backend-side iteration state.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `#[serde(transparent)]` is removed and the token becomes `{"0": "..."}`
/// - Round-tripping a handle changes the token
#[test]
fn given_handle_when_serialized_then_is_plain_string_token() {
    // GIVEN: A backend-assigned handle token
    let handle = HandleId::new("H1");

    // WHEN: Serializing and deserializing
    let wire = serde_json::to_string(&handle).expect("handle should serialize");
    let back: HandleId = serde_json::from_str(&wire).expect("handle should deserialize");

    // THEN: The wire form is the bare token and the round trip is lossless
    assert_eq!(wire, "\"H1\"", "Should serialize as a bare string");
    assert_eq!(back, handle, "Round trip should preserve the token");
    assert_eq!(handle.as_str(), "H1");
}

/// **VALUE**: Verifies Page helpers report emptiness and length consistently.
///
/// **WHY THIS MATTERS**: Hosts drive their fetch loops off `done` and the item
/// count. If `len`/`is_empty` disagree with `items`, pagination loops misbehave.
#[test]
fn given_page_when_inspected_then_len_matches_items() {
    let page = Page {
        items: vec![json!("a"), json!("b")],
        done: false,
    };

    assert_eq!(page.len(), 2);
    assert!(!page.is_empty());

    let empty = Page {
        items: Vec::new(),
        done: true,
    };
    assert!(empty.is_empty());
}
