use crate::protocol::{
    Command, Outcome, Reply, RequestEnvelope, decode_request, decode_response, encode_request,
    encode_response, ResponseEnvelope,
};

use common::HandleId;

use serde_json::json;

/// **VALUE**: Verifies the wire shape of command envelopes.
///
/// **WHY THIS MATTERS**: The backend dispatches on the `cmd` tag with camelCase
/// names and correlates on `id`. A silent rename (e.g. a removed serde attribute)
/// would be a protocol break that the type system cannot see.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - the `cmd` tag or camelCase renaming is dropped
/// - an absent cursor starts serializing as `"cursor": null`
#[test]
fn given_fetch_page_command_when_encoded_then_wire_shape_is_stable() {
    // GIVEN: A page fetch with no cursor yet
    let envelope = RequestEnvelope {
        id: 42,
        command: Command::FetchPage {
            handle: HandleId::new("H1"),
            amount: 10,
            cursor: None,
        },
    };

    // WHEN: Encoding it
    let frame = encode_request(&envelope).expect("encoding should succeed");
    let wire: serde_json::Value = serde_json::from_slice(&frame).expect("frame should be JSON");

    // THEN: Tag, casing and id are as the backend expects; no null cursor
    assert_eq!(wire["id"], json!(42));
    assert_eq!(wire["command"]["cmd"], json!("fetchPage"));
    assert_eq!(wire["command"]["handle"], json!("H1"));
    assert_eq!(wire["command"]["amount"], json!(10));
    assert!(
        wire["command"].get("cursor").is_none(),
        "Absent cursor must be omitted, not null"
    );

    // AND: The backend-side decoder round-trips it
    let decoded = decode_request(&frame).expect("decoding should succeed");
    assert_eq!(decoded, envelope);
}

/// **VALUE**: Verifies that both outcome arms decode from their wire form.
///
/// **WHY THIS MATTERS**: Exactly one of `ok` / `error` resolves each request.
/// If the error arm stopped decoding, backend failures would surface as channel
/// poisoning instead of per-request errors.
#[test]
fn given_ok_and_error_outcomes_when_decoded_then_both_arms_round_trip() {
    // GIVEN: One success and one failure envelope
    let ok = ResponseEnvelope {
        id: 1,
        outcome: Outcome::Ok(Reply::Page {
            handle: HandleId::new("H1"),
            items: vec![json!("a"), json!("b")],
            done: false,
            cursor: Some(json!(2)),
        }),
    };
    let err = ResponseEnvelope {
        id: 2,
        outcome: Outcome::Error {
            message: "no such directory".to_string(),
        },
    };

    // WHEN/THEN: Both survive the codec
    for envelope in [ok, err] {
        let frame = encode_response(&envelope).expect("encoding should succeed");
        let decoded = decode_response(&frame).expect("decoding should succeed");
        assert_eq!(decoded, envelope);
    }
}

/// **VALUE**: Verifies that a frame without a correlation id fails to decode.
///
/// **WHY THIS MATTERS**: A reply that cannot name its request cannot be routed;
/// the router treats that decode failure as fatal to the channel. If such frames
/// decoded into some default id, they would resolve an unrelated caller.
#[test]
fn given_frame_without_id_when_decoded_then_decoding_fails() {
    let frame = br#"{"outcome":{"error":{"message":"lost"}}}"#;

    assert!(
        decode_response(frame).is_err(),
        "A frame missing its id must not decode"
    );
}

/// **VALUE**: Verifies that non-JSON garbage fails to decode.
///
/// **WHY THIS MATTERS**: This is the trigger for the ProtocolViolation path - the
/// one failure that poisons the channel instead of a single request.
#[test]
fn given_garbage_frame_when_decoded_then_decoding_fails() {
    assert!(decode_response(b"\x00\x01not json").is_err());
}
