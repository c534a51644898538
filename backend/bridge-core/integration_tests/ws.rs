//! Loopback WebSocket tests: a real tungstenite server on an ephemeral
//! port plays the backend, exercising the same codec and routing paths as
//! the channel tests but over an actual socket.

use bridge_core::Bridge;
use bridge_core::protocol::{
    Command, Outcome, Reply, ResponseEnvelope, decode_request, encode_response,
};
use bridge_core::transport::WsTransport;

use common::HandleId;

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::accept_async;
use uuid::Uuid;

/// Serve one connection: echo one-shots, mint a handle per initiate, and
/// page a fixed listing three items at a time.
async fn serve_connection(stream: TcpStream) {
    let mut ws = accept_async(stream).await.expect("handshake should succeed");
    let listing = ["alpha", "beta", "gamma", "delta"];
    let mut open_handle: Option<String> = None;

    while let Some(msg) = ws.next().await {
        let frame = match msg {
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };
        let request = decode_request(&frame).expect("request should decode");

        let outcome = match request.command {
            Command::OneShot { payload } => Outcome::Ok(Reply::Value {
                value: json!({ "echo": payload }),
            }),
            Command::Initiate { .. } => {
                let token = Uuid::new_v4().to_string();
                open_handle = Some(token.clone());
                Outcome::Ok(Reply::Handle {
                    handle: HandleId::new(token),
                })
            }
            Command::FetchPage {
                handle,
                amount,
                cursor,
            } => {
                if open_handle.as_deref() != Some(handle.as_str()) {
                    Outcome::Error {
                        message: format!("unknown handle {handle}"),
                    }
                } else {
                    let start = cursor.and_then(|c| c.as_u64()).unwrap_or(0) as usize;
                    let end = listing.len().min(start + amount as usize);
                    let items: Vec<Value> =
                        listing[start..end].iter().map(|item| json!(item)).collect();
                    Outcome::Ok(Reply::Page {
                        handle,
                        items,
                        done: end == listing.len(),
                        cursor: Some(json!(end)),
                    })
                }
            }
        };

        let response = encode_response(&ResponseEnvelope {
            id: request.id,
            outcome,
        })
        .expect("response should encode");
        if ws.send(Message::Binary(response.into())).await.is_err() {
            break;
        }
    }
}

async fn spawn_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("bound socket has an address");
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            serve_connection(stream).await;
        }
    });
    addr
}

/// **VALUE**: Verifies the bridge end to end over a real WebSocket.
///
/// **WHY THIS MATTERS**: The channel tests bypass the socket layer entirely.
/// This is the only test proving that frames survive the tungstenite round
/// trip - binary framing, the reader pump, and the codec all together.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - outbound frames were sent as text while the reader only took binary
/// - the reader pump dropped frames or exited before the close handshake
#[tokio::test]
async fn given_ws_backend_when_paging_over_socket_then_full_lifecycle_works() {
    // GIVEN: A loopback backend and a connected bridge
    let addr = spawn_backend().await;
    let (transport, reader) = WsTransport::connect(&format!("ws://{addr}"))
        .await
        .expect("loopback connect should succeed");
    let bridge = Bridge::new(Arc::new(transport));
    let pump = tokio::spawn(reader.run(bridge.router()));

    // WHEN: Running a one-shot and a full pagination
    let echoed = bridge
        .one_shot(json!("over the wire"))
        .await
        .expect("one-shot should resolve");
    assert_eq!(echoed, json!({ "echo": "over the wire" }));

    let handle = bridge
        .initiate(json!({ "listing": "fixtures" }))
        .await
        .expect("initiate should resolve");

    let mut collected = Vec::new();
    loop {
        let page = bridge
            .fetch_page(&handle, 3)
            .await
            .expect("page should resolve");
        collected.extend(page.items);
        if page.done {
            break;
        }
    }

    // THEN: Every item arrived exactly once, in order
    assert_eq!(
        collected,
        vec![json!("alpha"), json!("beta"), json!("gamma"), json!("delta")]
    );

    // AND: The reader pump ends cleanly when the bridge side goes away
    drop(bridge);
    pump.abort();
}

/// **VALUE**: Verifies that connecting to a dead endpoint surfaces a
/// handshake error instead of hanging.
#[tokio::test]
async fn given_no_listener_when_connecting_then_handshake_fails() {
    // GIVEN: A port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("bound socket has an address");
    drop(listener);

    // WHEN/THEN: The connect attempt fails with a transport error
    let connected = WsTransport::connect(&format!("ws://{addr}")).await;
    assert!(connected.is_err(), "Connect to a dead port must fail");
}
