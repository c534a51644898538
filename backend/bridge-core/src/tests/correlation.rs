use crate::bridge::CorrelationTable;
use crate::error::BridgeError;
use crate::protocol::Reply;

use serde_json::json;
use tokio::sync::oneshot;

/// **VALUE**: Verifies that a registered continuation fires exactly once on resolve.
///
/// **WHY THIS MATTERS**: The at-most-once guarantee is the core contract of the
/// correlation table. A continuation invoked twice would double-complete a caller's
/// future; one invoked zero times on a matching reply would hang the caller forever.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - resolve stops removing the entry, allowing a second delivery
/// - resolve delivers to the wrong continuation
#[test]
fn given_registered_request_when_resolved_then_continuation_fires_exactly_once() {
    // GIVEN: A pending request
    let mut table = CorrelationTable::new();
    let (tx, mut rx) = oneshot::channel();
    table.register(7, tx);
    assert_eq!(table.len(), 1);

    // WHEN: Resolving it with a reply
    let resolved = table.resolve(
        7,
        Ok(Reply::Value {
            value: json!("pong"),
        }),
    );

    // THEN: The continuation observed exactly that outcome, once
    assert!(resolved, "First resolve should succeed");
    let outcome = rx.try_recv().expect("continuation should have fired");
    assert!(matches!(outcome, Ok(Reply::Value { .. })));
    assert!(table.is_empty(), "Entry should be removed after resolve");

    // AND: A duplicate resolve is refused without any effect
    assert!(
        !table.resolve(7, Err(BridgeError::Backend { message: "dup".into() })),
        "Second resolve must return false"
    );
}

/// **VALUE**: Verifies that resolving an unknown id performs no action.
///
/// **WHY THIS MATTERS**: Late replies for cancelled requests and duplicate replies
/// from a confused backend both land here. They must be ignored - never invoke a
/// continuation, never panic.
#[test]
fn given_unknown_id_when_resolved_then_returns_false() {
    let mut table = CorrelationTable::new();

    let resolved = table.resolve(
        99,
        Ok(Reply::Value {
            value: json!(null),
        }),
    );

    assert!(!resolved, "Unknown id should resolve to false");
}

/// **VALUE**: Verifies that cancel removes the entry without invoking the continuation.
///
/// **WHY THIS MATTERS**: Cancellation is how callers abandon interest (and how
/// timeouts are layered). If cancel invoked the continuation, a caller racing its
/// own cancel could observe a spurious outcome; if it left the entry behind, a
/// late reply would resurrect a dead request.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - cancel delivers an outcome instead of dropping the sender
/// - a reply after cancel still finds the entry
#[test]
fn given_pending_request_when_cancelled_then_continuation_never_fires() {
    // GIVEN: A pending request
    let mut table = CorrelationTable::new();
    let (tx, mut rx) = oneshot::channel();
    table.register(3, tx);

    // WHEN: Cancelling it
    assert!(table.cancel(3), "Cancel of a pending entry should succeed");

    // THEN: The caller observes a closed channel, not an outcome
    assert!(
        rx.try_recv().is_err(),
        "Continuation must not fire on cancel"
    );

    // AND: A late reply for the cancelled id is discarded
    assert!(!table.resolve(3, Ok(Reply::Value { value: json!(1) })));
    assert!(!table.cancel(3), "Second cancel should report absence");
}

/// **VALUE**: Verifies that drain hands back every pending entry and empties the table.
///
/// **WHY THIS MATTERS**: Drain is the channel-poisoning path: every pending caller
/// must be failed exactly once when the channel dies. Entries left behind would
/// hang their callers forever.
#[test]
fn given_pending_requests_when_drained_then_table_is_empty() {
    let mut table = CorrelationTable::new();
    let (tx1, _rx1) = oneshot::channel();
    let (tx2, _rx2) = oneshot::channel();
    table.register(1, tx1);
    table.register(2, tx2);

    let drained = table.drain();

    assert_eq!(drained.len(), 2);
    assert!(table.is_empty());
}
