use crate::backend::DemoBackend;

use bridge_core::bridge::HandleStatus;
use bridge_core::error::BridgeError;
use bridge_core::transport::ChannelTransport;
use bridge_core::{Bridge, DEFAULT_CHANNEL_CAPACITY};

use serde_json::json;

use std::sync::Arc;

fn demo_bridge() -> (Bridge, tokio::task::JoinHandle<()>) {
    let (transport, inbox) = ChannelTransport::pair(DEFAULT_CHANNEL_CAPACITY);
    let bridge = Bridge::new(Arc::new(transport));
    let backend = DemoBackend::new(inbox, bridge.router());
    let task = tokio::spawn(backend.run());
    (bridge, task)
}

/// **VALUE**: Verifies the demo backend serves a filtered listing to exhaustion.
///
/// **WHY THIS MATTERS**: The demo backend is what development runs exercise
/// the bridge against. If its pattern filter or cursor arithmetic drifted,
/// every manual session would be debugging the fixture instead of the bridge.
#[tokio::test]
async fn given_md_pattern_when_paging_then_only_md_entries_arrive_in_order() {
    // GIVEN: A bridge wired to the demo backend
    let (bridge, _task) = demo_bridge();

    // WHEN: Opening a markdown listing and paging one item at a time
    let handle = bridge
        .initiate(json!({ "pattern": "*.md" }))
        .await
        .expect("initiate should succeed");

    let mut collected = Vec::new();
    loop {
        let page = bridge
            .fetch_page(&handle, 1)
            .await
            .expect("page should arrive");
        collected.extend(page.items);
        if page.done {
            break;
        }
    }

    // THEN: Exactly the markdown fixtures arrived, in fixture order
    assert_eq!(collected, vec![json!("report.md"), json!("readme.md")]);
    assert_eq!(bridge.handle_status(&handle).await, HandleStatus::Exhausted);
}

/// **VALUE**: Verifies one-shot replies carry the running greeting counter.
///
/// **WHY THIS MATTERS**: The counter is the visible proof that each one-shot
/// reached the backend exactly once; a duplicate-dispatch bug would show up
/// as a skipped number here.
#[tokio::test]
async fn given_repeated_one_shots_when_served_then_greeting_counter_increments() {
    let (bridge, _task) = demo_bridge();

    let first = bridge.one_shot(json!("hi")).await.expect("one-shot should resolve");
    let second = bridge.one_shot(json!("again")).await.expect("one-shot should resolve");

    assert_eq!(first["greeting"], json!(1));
    assert_eq!(first["echo"], json!("hi"));
    assert_eq!(second["greeting"], json!(2));
}

/// **VALUE**: Verifies that a fetch for a handle the backend never issued
/// comes back as a backend error, not a hang.
#[tokio::test]
async fn given_forged_handle_when_fetching_then_backend_error_is_reported() {
    let (bridge, _task) = demo_bridge();

    // A raw dispatch bypasses the registry's client-side staleness check,
    // so the forged token actually reaches the backend.
    let pending = bridge
        .dispatch(bridge_core::protocol::Command::FetchPage {
            handle: common::HandleId::new("forged"),
            amount: 1,
            cursor: None,
        })
        .await
        .expect("dispatch should succeed");

    let outcome = pending.wait().await;
    assert!(
        matches!(outcome, Err(BridgeError::Backend { ref message }) if message.contains("forged")),
        "Expected a backend error for the forged handle, got {outcome:?}"
    );
}
