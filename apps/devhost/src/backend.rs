//! In-process demo backend.
//!
//! Plays the backend side of the channel for development runs: it drains
//! request frames from a [`ChannelTransport`] inbox and feeds reply frames
//! straight back through the bridge's router. Useful for exercising the
//! whole dispatch/correlate/paginate path without a separate process.
//!
//! [`ChannelTransport`]: bridge_core::transport::ChannelTransport

use bridge_core::bridge::ReplyRouter;
use bridge_core::protocol::{
    Command, Outcome, Reply, ResponseEnvelope, decode_request, encode_response,
};

use common::HandleId;

use std::collections::HashMap;

use log::{debug, info, warn};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Fixture listing served by the demo backend.
const FIXTURE_ENTRIES: [&str; 7] = [
    "notes.txt",
    "todo.txt",
    "report.md",
    "sketch.svg",
    "minutes.txt",
    "budget.csv",
    "readme.md",
];

/// A scripted backend serving the fixture listing over the bridge protocol.
pub struct DemoBackend {
    inbox: mpsc::Receiver<Vec<u8>>,
    router: ReplyRouter,
    greetings_served: u64,
    listings: HashMap<String, Vec<Value>>,
}

impl DemoBackend {
    pub fn new(inbox: mpsc::Receiver<Vec<u8>>, router: ReplyRouter) -> Self {
        Self {
            inbox,
            router,
            greetings_served: 0,
            listings: HashMap::new(),
        }
    }

    /// Serve requests until the bridge side closes the channel.
    pub async fn run(mut self) {
        while let Some(frame) = self.inbox.recv().await {
            let request = match decode_request(&frame) {
                Ok(request) => request,
                Err(e) => {
                    warn!("Dropping undecodable request frame: {e}");
                    continue;
                }
            };

            debug!("Serving request {}", request.id);
            let outcome = self.serve(request.command);
            let envelope = ResponseEnvelope {
                id: request.id,
                outcome,
            };

            let response = match encode_response(&envelope) {
                Ok(response) => response,
                Err(e) => {
                    warn!("Failed to encode response for request {}: {e}", envelope.id);
                    continue;
                }
            };
            if let Err(e) = self.router.on_frame(&response).await {
                warn!("Router rejected response frame: {e}");
                return;
            }
        }

        info!("Demo backend shutting down: channel closed");
    }

    fn serve(&mut self, command: Command) -> Outcome {
        match command {
            Command::OneShot { payload } => {
                self.greetings_served += 1;
                Outcome::Ok(Reply::Value {
                    value: json!({
                        "greeting": self.greetings_served,
                        "echo": payload,
                    }),
                })
            }
            Command::Initiate { params } => {
                let pattern = params
                    .get("pattern")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .trim_start_matches('*');
                let items = FIXTURE_ENTRIES
                    .iter()
                    .filter(|entry| entry.ends_with(pattern))
                    .map(|entry| json!(entry))
                    .collect();

                let token = Uuid::new_v4().to_string();
                self.listings.insert(token.clone(), items);
                info!("Opened listing {token} for pattern {pattern:?}");
                Outcome::Ok(Reply::Handle {
                    handle: HandleId::new(token),
                })
            }
            Command::FetchPage {
                handle,
                amount,
                cursor,
            } => match self.listings.get(handle.as_str()) {
                Some(items) => {
                    let start = cursor.and_then(|c| c.as_u64()).unwrap_or(0) as usize;
                    let end = items.len().min(start.saturating_add(amount as usize));
                    Outcome::Ok(Reply::Page {
                        handle,
                        items: items[start.min(end)..end].to_vec(),
                        done: end == items.len(),
                        cursor: Some(json!(end)),
                    })
                }
                None => Outcome::Error {
                    message: format!("no listing open for handle {handle}"),
                },
            },
        }
    }
}
