use crate::bridge::{HandleStatus, ResourceRegistry};

use common::HandleId;

use serde_json::json;

/// **VALUE**: Verifies allocate/status/release lifecycle of a resource handle.
///
/// **WHY THIS MATTERS**: The registry is what lets the dispatcher reject fetches
/// against dead handles without a wasted round-trip. Status must move Unknown ->
/// Active -> Unknown (after release) precisely, or callers get either spurious
/// StaleHandle errors or leaked backend round-trips.
#[test]
fn given_fresh_registry_when_handle_allocated_and_released_then_status_tracks_lifecycle() {
    // GIVEN: An empty registry
    let mut registry = ResourceRegistry::new();
    let handle = HandleId::new("H1");
    assert_eq!(registry.status(&handle), HandleStatus::Unknown);

    // WHEN: Allocating the handle
    assert!(registry.allocate(handle.clone()), "Allocation should succeed");

    // THEN: It is active with no cursor yet
    assert_eq!(registry.status(&handle), HandleStatus::Active);
    assert_eq!(registry.cursor(&handle), None);

    // WHEN: Releasing it
    assert!(registry.release(&handle));

    // THEN: It is unknown again and a second release reports absence
    assert_eq!(registry.status(&handle), HandleStatus::Unknown);
    assert!(!registry.release(&handle));
}

/// **VALUE**: Verifies that a handle collision is refused and the live entry survives.
///
/// **WHY THIS MATTERS**: Handles are backend-assigned and must be unique. If a
/// confused backend reissues a live token, silently overwriting the entry would
/// cross two resources' cursors. The registry must refuse so the state actor can
/// escalate.
#[test]
fn given_live_handle_when_allocated_again_then_collision_is_refused() {
    let mut registry = ResourceRegistry::new();
    let handle = HandleId::new("H1");
    assert!(registry.allocate(handle.clone()));
    registry.advance(&handle, Some(json!(10)), false);

    // WHEN: The same token is allocated again
    let allocated = registry.allocate(handle.clone());

    // THEN: The collision is refused and the original cursor survives
    assert!(!allocated, "Collision must be refused");
    assert_eq!(registry.cursor(&handle), Some(json!(10)));
}

/// **VALUE**: Verifies cursor advancement and the exhaustion transition.
///
/// **WHY THIS MATTERS**: The dispatcher forwards the stored cursor on every page
/// fetch. A cursor that fails to advance would make the backend re-serve the same
/// page; a missed exhaustion transition would let stale fetches reach the backend.
#[test]
fn given_active_handle_when_advanced_with_done_then_handle_is_exhausted() {
    // GIVEN: An active handle mid-iteration
    let mut registry = ResourceRegistry::new();
    let handle = HandleId::new("H1");
    registry.allocate(handle.clone());
    assert!(registry.advance(&handle, Some(json!(3)), false));
    assert_eq!(registry.cursor(&handle), Some(json!(3)));
    assert_eq!(registry.status(&handle), HandleStatus::Active);

    // WHEN: A done page arrives
    assert!(registry.advance(&handle, Some(json!(4)), true));

    // THEN: The handle is exhausted, permanently
    assert_eq!(registry.status(&handle), HandleStatus::Exhausted);
}

/// **VALUE**: Verifies that advance is idempotent once a handle is exhausted.
///
/// **WHY THIS MATTERS**: Duplicate and late page replies are a fact of life on an
/// unordered channel. Applying advance twice after `done = true` must leave the
/// registry exactly as applying it once - in particular a late reply must not
/// revive the handle or move its cursor.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - a second advance clears the exhausted flag
/// - a late cursor overwrites the terminal cursor
#[test]
fn given_exhausted_handle_when_advanced_again_then_state_is_unchanged() {
    // GIVEN: An exhausted handle
    let mut registry = ResourceRegistry::new();
    let handle = HandleId::new("H1");
    registry.allocate(handle.clone());
    registry.advance(&handle, Some(json!(4)), true);
    let terminal_cursor = registry.cursor(&handle);

    // WHEN: A duplicate done reply advances it again with a different cursor
    assert!(registry.advance(&handle, Some(json!(99)), true));

    // THEN: Nothing changed
    assert_eq!(registry.status(&handle), HandleStatus::Exhausted);
    assert_eq!(registry.cursor(&handle), terminal_cursor);

    // AND: Even a non-done advance is a no-op
    assert!(registry.advance(&handle, Some(json!(0)), false));
    assert_eq!(registry.status(&handle), HandleStatus::Exhausted);
    assert_eq!(registry.cursor(&handle), terminal_cursor);
}

/// **VALUE**: Verifies that advancing an unknown handle reports absence.
///
/// **WHY THIS MATTERS**: A page reply can arrive after the host released its
/// handle. The registry must report the miss (so the router can log it) rather
/// than resurrecting state for a dead handle.
#[test]
fn given_unknown_handle_when_advanced_then_reports_absence() {
    let mut registry = ResourceRegistry::new();
    let handle = HandleId::new("gone");

    assert!(!registry.advance(&handle, Some(json!(1)), false));
    assert_eq!(registry.status(&handle), HandleStatus::Unknown);
    assert!(registry.is_empty());
}
