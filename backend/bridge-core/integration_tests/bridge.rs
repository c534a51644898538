use crate::helpers::{
    deliver, error_reply, handle_ack, next_request, page_reply, value_reply,
};

use bridge_core::bridge::HandleStatus;
use bridge_core::error::BridgeError;
use bridge_core::protocol::Command;
use bridge_core::transport::ChannelTransport;
use bridge_core::{Bridge, DEFAULT_CHANNEL_CAPACITY};

use serde_json::json;

use std::sync::Arc;
use std::time::Duration;

fn channel_bridge() -> (Bridge, tokio::sync::mpsc::Receiver<Vec<u8>>) {
    let (transport, inbox) = ChannelTransport::pair(DEFAULT_CHANNEL_CAPACITY);
    (Bridge::new(Arc::new(transport)), inbox)
}

/// **VALUE**: Verifies the full pagination lifecycle of a resource handle.
///
/// **WHY THIS MATTERS**: This is the scenario the bridge exists for: initiate a
/// listing, page through it with backend-supplied cursors, observe exhaustion,
/// and get client-side StaleHandle errors afterwards without a wasted round-trip.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - the dispatcher stops forwarding the stored cursor on the second fetch
/// - a `done` page fails to exhaust the handle
/// - a fetch against an exhausted handle still reaches the transport
#[tokio::test]
async fn given_paginated_listing_when_fetched_to_exhaustion_then_stale_handle_is_client_side() {
    // GIVEN: A bridge over an in-process channel
    let (bridge, mut inbox) = channel_bridge();
    let router = bridge.router();

    let caller = async {
        // WHEN: Initiating a listing and paging through it
        let handle = bridge
            .initiate(json!({"pattern": "*.txt"}))
            .await
            .expect("initiate should succeed");
        assert_eq!(handle.as_str(), "H1");

        let first = bridge
            .fetch_page(&handle, 10)
            .await
            .expect("first page should arrive");
        assert_eq!(first.items, vec![json!("a"), json!("b"), json!("c")]);
        assert!(!first.done);
        assert_eq!(bridge.handle_status(&handle).await, HandleStatus::Active);

        let second = bridge
            .fetch_page(&handle, 10)
            .await
            .expect("second page should arrive");
        assert_eq!(second.items, vec![json!("d")]);
        assert!(second.done);

        // THEN: The handle is exhausted and further fetches fail client-side
        assert_eq!(bridge.handle_status(&handle).await, HandleStatus::Exhausted);
        let stale = bridge.fetch_page(&handle, 10).await;
        assert!(
            matches!(stale, Err(BridgeError::StaleHandle { .. })),
            "Fetch after exhaustion should fail with StaleHandle"
        );
        handle
    };

    let backend = async {
        let request = next_request(&mut inbox).await;
        assert!(matches!(request.command, Command::Initiate { .. }));
        deliver(&router, &handle_ack(request.id, "H1")).await;

        let request = next_request(&mut inbox).await;
        match &request.command {
            Command::FetchPage { cursor, amount, .. } => {
                assert!(cursor.is_none(), "First fetch carries no cursor");
                assert_eq!(*amount, 10);
            }
            other => panic!("Expected FetchPage, got {other:?}"),
        }
        deliver(
            &router,
            &page_reply(request.id, "H1", &["a", "b", "c"], false, Some(json!(3))),
        )
        .await;

        let request = next_request(&mut inbox).await;
        match &request.command {
            Command::FetchPage { cursor, .. } => {
                assert_eq!(
                    cursor,
                    &Some(json!(3)),
                    "Second fetch must forward the stored cursor"
                );
            }
            other => panic!("Expected FetchPage, got {other:?}"),
        }
        deliver(
            &router,
            &page_reply(request.id, "H1", &["d"], true, Some(json!(4))),
        )
        .await;
    };

    let (handle, _) = tokio::join!(caller, backend);

    // The stale fetch never produced a frame or a correlation entry
    assert!(
        inbox.try_recv().is_err(),
        "StaleHandle must be rejected without contacting the transport"
    );
    assert_eq!(
        bridge.pending_requests().await,
        0,
        "A failed dispatch must not leave a pending entry behind"
    );

    // Release discards the registry entry
    bridge.release(&handle).await.expect("release should succeed");
    assert_eq!(bridge.handle_status(&handle).await, HandleStatus::Unknown);
}

/// **VALUE**: Verifies that a dispatch on a closed transport fails immediately.
///
/// **WHY THIS MATTERS**: When the backend is gone, callers must get
/// TransportUnavailable right away - with no entry left behind in the correlation
/// table that would otherwise wait forever for a reply that can never arrive.
#[tokio::test]
async fn given_closed_transport_when_dispatching_then_transport_unavailable_and_table_empty() {
    // GIVEN: A bridge whose backend inbox is already gone
    let (bridge, inbox) = channel_bridge();
    drop(inbox);

    // WHEN: Dispatching a one-shot command
    let outcome = bridge.one_shot(json!({"ping": true})).await;

    // THEN: The caller observes TransportUnavailable and nothing is pending
    assert!(
        matches!(outcome, Err(BridgeError::TransportUnavailable { .. })),
        "Expected TransportUnavailable, got {outcome:?}"
    );
    assert_eq!(
        bridge.pending_requests().await,
        0,
        "Correlation table must remain empty"
    );
}

/// **VALUE**: Verifies that replies arriving out of order reach their own callers.
///
/// **WHY THIS MATTERS**: The channel promises no cross-request ordering. Two
/// outstanding requests whose replies arrive reversed must each resolve with
/// their own outcome - crossed replies would hand callers each other's data.
#[tokio::test]
async fn given_two_outstanding_requests_when_replies_reversed_then_each_caller_gets_its_own() {
    // GIVEN: Two outstanding one-shot requests
    let (bridge, mut inbox) = channel_bridge();
    let router = bridge.router();

    let first = bridge
        .dispatch(Command::OneShot {
            payload: json!("first"),
        })
        .await
        .expect("dispatch should succeed");
    let second = bridge
        .dispatch(Command::OneShot {
            payload: json!("second"),
        })
        .await
        .expect("dispatch should succeed");

    let request_one = next_request(&mut inbox).await;
    let request_two = next_request(&mut inbox).await;
    assert_eq!(request_one.id, first.request_id());
    assert_eq!(request_two.id, second.request_id());

    // WHEN: The backend answers in reverse order
    deliver(&router, &value_reply(request_two.id, json!("reply-second"))).await;
    deliver(&router, &value_reply(request_one.id, json!("reply-first"))).await;

    // THEN: Each pending reply resolved with its own outcome
    let outcome_one = first.wait().await.expect("first request should resolve");
    let outcome_two = second.wait().await.expect("second request should resolve");
    assert_eq!(outcome_one, bridge_core::protocol::Reply::Value {
        value: json!("reply-first")
    });
    assert_eq!(outcome_two, bridge_core::protocol::Reply::Value {
        value: json!("reply-second")
    });
}

/// **VALUE**: Verifies that duplicate and unknown-id replies are ignored entirely.
///
/// **WHY THIS MATTERS**: At-most-once resolution is the bridge's central
/// guarantee. A duplicate reply must not re-invoke a continuation, and a reply
/// for an id nobody registered must not touch the resource registry either.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - the resolve path stops removing correlation entries
/// - registry bookkeeping runs before the correlation lookup
#[tokio::test]
async fn given_duplicate_and_unknown_replies_when_routed_then_nothing_is_mutated() {
    // GIVEN: One resolved one-shot request
    let (bridge, mut inbox) = channel_bridge();
    let router = bridge.router();

    let pending = bridge
        .dispatch(Command::OneShot {
            payload: json!("once"),
        })
        .await
        .expect("dispatch should succeed");
    let request = next_request(&mut inbox).await;
    deliver(&router, &value_reply(request.id, json!("done"))).await;
    pending.wait().await.expect("request should resolve");

    // WHEN: The same reply arrives again
    deliver(&router, &value_reply(request.id, json!("again"))).await;

    // THEN: It is ignored - nothing pending, nothing resurrected
    assert_eq!(bridge.pending_requests().await, 0);

    // WHEN: A page reply arrives for an id nobody registered
    let ghost = common::HandleId::new("H9");
    deliver(&router, &page_reply(9999, "H9", &["x"], true, None)).await;

    // THEN: The registry was not touched
    assert_eq!(bridge.handle_status(&ghost).await, HandleStatus::Unknown);
}

/// **VALUE**: Verifies that a backend error resolves only its own request.
///
/// **WHY THIS MATTERS**: Backend failures are per-request, not channel-wide.
/// The failing caller must see a typed Backend error while the channel keeps
/// serving other requests.
#[tokio::test]
async fn given_backend_error_when_routed_then_only_that_request_fails() {
    let (bridge, mut inbox) = channel_bridge();
    let router = bridge.router();

    let caller = async {
        let failed = bridge.one_shot(json!("doomed")).await;
        assert!(
            matches!(failed, Err(BridgeError::Backend { ref message }) if message == "disk on fire"),
            "Expected Backend error, got {failed:?}"
        );

        // Channel still healthy afterwards
        let ok = bridge.one_shot(json!("fine")).await.expect("channel should stay healthy");
        assert_eq!(ok, json!("ok"));
    };

    let backend = async {
        let request = next_request(&mut inbox).await;
        deliver(&router, &error_reply(request.id, "disk on fire")).await;
        let request = next_request(&mut inbox).await;
        deliver(&router, &value_reply(request.id, json!("ok"))).await;
    };

    tokio::join!(caller, backend);
}

/// **VALUE**: Verifies cancellation semantics: the entry goes away, late replies
/// are discarded, and an abandoned caller observes `Cancelled`.
///
/// **WHY THIS MATTERS**: Cancel does not retract the request from the backend,
/// so its reply will still arrive - and must fall into the ignored path rather
/// than resolve a dead continuation.
#[tokio::test]
async fn given_cancelled_request_when_late_reply_arrives_then_it_is_discarded() {
    // GIVEN: An outstanding request the caller abandons
    let (bridge, mut inbox) = channel_bridge();
    let router = bridge.router();

    let pending = bridge
        .dispatch(Command::OneShot {
            payload: json!("slow"),
        })
        .await
        .expect("dispatch should succeed");
    let request = next_request(&mut inbox).await;

    // WHEN: Cancelling, then the reply arrives late
    bridge.cancel(pending.request_id()).await.expect("cancel should succeed");
    deliver(&router, &value_reply(request.id, json!("too late"))).await;

    // THEN: The table is empty and the abandoned caller sees Cancelled
    assert_eq!(bridge.pending_requests().await, 0);
    let outcome = pending.wait().await;
    assert!(
        matches!(outcome, Err(BridgeError::Cancelled { .. })),
        "Expected Cancelled, got {outcome:?}"
    );
}

/// **VALUE**: Verifies the channel-fatal ProtocolViolation path and host reset.
///
/// **WHY THIS MATTERS**: Once a frame cannot be attributed to a request, no
/// further reply on the channel can be trusted. Every pending caller must fail
/// fast, new dispatches must be refused, and a host-driven reset must bring the
/// bridge back.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - garbage frames were dropped silently, hanging pending callers forever
/// - the poison flag failed to stop new dispatches
/// - reset left the bridge poisoned
#[tokio::test]
async fn given_garbage_frame_when_routed_then_channel_poisons_and_reset_recovers() {
    // GIVEN: A bridge with one outstanding request
    let (bridge, mut inbox) = channel_bridge();
    let router = bridge.router();

    let pending = bridge
        .dispatch(Command::OneShot {
            payload: json!("doomed"),
        })
        .await
        .expect("dispatch should succeed");
    let _ = next_request(&mut inbox).await;

    // WHEN: An unparseable frame arrives
    let routed = router.on_frame(b"\x00\x01garbage").await;
    assert!(matches!(routed, Err(BridgeError::ProtocolViolation { .. })));

    // THEN: The pending caller fails with ProtocolViolation
    let outcome = pending.wait().await;
    assert!(
        matches!(outcome, Err(BridgeError::ProtocolViolation { .. })),
        "Pending request must fail on poisoning, got {outcome:?}"
    );

    // AND: New dispatches are refused while poisoned - without reaching the
    // transport and without leaving an entry in the correlation table
    assert!(bridge.poison_reason().await.is_some());
    let refused = bridge.one_shot(json!("nope")).await;
    assert!(matches!(refused, Err(BridgeError::ProtocolViolation { .. })));
    assert!(
        inbox.try_recv().is_err(),
        "A refused dispatch must not hand a frame to the transport"
    );
    assert_eq!(
        bridge.pending_requests().await,
        0,
        "A refused dispatch must not leave a pending entry behind"
    );

    // WHEN: The host resets the channel with a fresh transport
    let (transport, mut fresh_inbox) = ChannelTransport::pair(DEFAULT_CHANNEL_CAPACITY);
    bridge.reset(Arc::new(transport)).await.expect("reset should succeed");
    assert!(bridge.poison_reason().await.is_none());

    // THEN: Dispatches flow again
    let caller = async {
        bridge.one_shot(json!("hello again")).await.expect("channel should be healthy")
    };
    let backend = async {
        let request = next_request(&mut fresh_inbox).await;
        deliver(&router, &value_reply(request.id, json!("welcome back"))).await;
    };
    let (value, _) = tokio::join!(caller, backend);
    assert_eq!(value, json!("welcome back"));
}

/// **VALUE**: Verifies the host-layered timeout: cancel plus a synthesized
/// Timeout outcome, with the late reply discarded.
///
/// **WHY THIS MATTERS**: Timeouts are not intrinsic to the protocol; this is the
/// documented recipe for hosts that need one. It must leave the table clean so
/// the eventual reply finds nothing to resolve.
#[tokio::test]
async fn given_silent_backend_when_waiting_with_timeout_then_timeout_and_clean_table() {
    // GIVEN: A request the backend never answers
    let (bridge, mut inbox) = channel_bridge();
    let router = bridge.router();

    let pending = bridge
        .dispatch(Command::OneShot {
            payload: json!("void"),
        })
        .await
        .expect("dispatch should succeed");
    let request = next_request(&mut inbox).await;

    // WHEN: Waiting with a short deadline
    let outcome = bridge
        .wait_with_timeout(pending, Duration::from_millis(20))
        .await;

    // THEN: Timeout is synthesized and the entry is gone
    assert!(
        matches!(outcome, Err(BridgeError::Timeout { .. })),
        "Expected Timeout, got {outcome:?}"
    );
    assert_eq!(bridge.pending_requests().await, 0);

    // AND: The reply that eventually arrives is discarded quietly
    deliver(&router, &value_reply(request.id, json!("eventually"))).await;
    assert_eq!(bridge.pending_requests().await, 0);
}
