//! Command dispatch and the caller-facing bridge surface.

use crate::bridge::pending::PendingReply;
use crate::bridge::registry::HandleStatus;
use crate::bridge::router::ReplyRouter;
use crate::bridge::state::{BridgeState, StateCommand};
use crate::error::bridge::BridgeError;
use crate::protocol::{Command, Reply, RequestEnvelope, encode_request};
use crate::transport::Transport;

use common::{ErrorLocation, HandleId, Page};

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, info};
use serde_json::Value;
use tokio::sync::{RwLock, oneshot};

/// Caller-side endpoint of the bridge.
///
/// Validates outbound commands, registers them for correlation, and hands
/// the encoded frame to the transport. Every dispatch yields a
/// [`PendingReply`] that resolves exactly once; the bridge itself never
/// blocks and never retries.
///
/// # Thread Safety
///
/// `Bridge` is `Clone`; all clones share the same state, transport, and id
/// allocator, so requests dispatched from different tasks get distinct
/// correlation ids and may be outstanding concurrently.
#[derive(Clone)]
pub struct Bridge {
    transport: Arc<RwLock<Arc<dyn Transport>>>,
    state: BridgeState,
    next_request_id: Arc<AtomicU64>,
}

impl Bridge {
    /// Create a bridge over the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport: Arc::new(RwLock::new(transport)),
            state: BridgeState::new(),
            next_request_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The router the host wires inbound frames into.
    pub fn router(&self) -> ReplyRouter {
        ReplyRouter::new(self.state.clone())
    }

    /// Dispatch a command and obtain its pending reply.
    ///
    /// For page fetches the dispatcher injects the current cursor from the
    /// resource registry; a fetch against an unknown or exhausted handle
    /// fails with [`BridgeError::StaleHandle`] before the transport is
    /// contacted.
    ///
    /// # Errors
    ///
    /// Immediate failures are returned directly instead of through the
    /// pending reply:
    ///
    /// - [`BridgeError::ProtocolViolation`] - the channel is poisoned
    /// - [`BridgeError::StaleHandle`] - fetch against a dead handle
    /// - [`BridgeError::TransportUnavailable`] - the transport refused the
    ///   frame; the request was deregistered and the correlation table is
    ///   left as if the dispatch never happened
    pub async fn dispatch(&self, command: Command) -> Result<PendingReply, BridgeError> {
        if let Some(reason) = self.state.poison_reason().await {
            return Err(BridgeError::ProtocolViolation {
                message: reason,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let command = self.prepare_command(command).await?;

        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);

        // Encode before registering: an encode failure must not leave a
        // dead continuation behind in the correlation table.
        let frame = encode_request(&RequestEnvelope { id, command }).map_err(|e| {
            BridgeError::ProtocolViolation {
                message: format!("Failed to encode request {id}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let (continuation, receiver) = oneshot::channel();

        // Registration is enqueued before the frame leaves, so the reply
        // can never race past it in the state actor's queue.
        self.state
            .update(StateCommand::Register { id, continuation })
            .await?;

        // A poison that landed since the pre-check above has already failed
        // this continuation in the actor; withdraw and skip the wasted send.
        if let Some(reason) = self.state.poison_reason().await {
            self.state.update(StateCommand::Cancel { id }).await.ok();
            return Err(BridgeError::ProtocolViolation {
                message: reason,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let transport = Arc::clone(&*self.transport.read().await);
        if let Err(e) = transport.send(frame).await {
            // Withdraw the registration; no reply will ever arrive.
            self.state.update(StateCommand::Cancel { id }).await.ok();
            return Err(BridgeError::from(e));
        }

        debug!("Dispatched request {id}");
        Ok(PendingReply::new(id, receiver))
    }

    /// Open a paginated resource and return its handle.
    ///
    /// # Errors
    ///
    /// Any dispatch failure, the backend's error outcome, or
    /// [`BridgeError::UnexpectedReply`] if the backend acknowledged with
    /// something other than a handle.
    pub async fn initiate(&self, params: Value) -> Result<HandleId, BridgeError> {
        let pending = self.dispatch(Command::Initiate { params }).await?;
        match pending.wait().await? {
            Reply::Handle { handle } => {
                info!("Initiated resource {handle}");
                Ok(handle)
            }
            _ => Err(BridgeError::UnexpectedReply {
                expected: "handle",
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Fetch the next page of at most `amount` items from `handle`.
    ///
    /// Ordering within one handle is the caller's responsibility: issuing
    /// two concurrent fetches against the same handle reuses the same
    /// cursor and the backend may interpret that as overlapping reads.
    /// Callers must serialize fetches per handle; fetches against distinct
    /// handles may overlap freely.
    ///
    /// # Errors
    ///
    /// [`BridgeError::StaleHandle`] once the handle is exhausted, released,
    /// or was never allocated; otherwise any dispatch or backend failure.
    pub async fn fetch_page(&self, handle: &HandleId, amount: u32) -> Result<Page, BridgeError> {
        let pending = self
            .dispatch(Command::FetchPage {
                handle: handle.clone(),
                amount,
                cursor: None,
            })
            .await?;
        match pending.wait().await? {
            Reply::Page { items, done, .. } => Ok(Page { items, done }),
            _ => Err(BridgeError::UnexpectedReply {
                expected: "page",
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Dispatch a one-shot command and await its opaque reply.
    pub async fn one_shot(&self, payload: Value) -> Result<Value, BridgeError> {
        let pending = self.dispatch(Command::OneShot { payload }).await?;
        match pending.wait().await? {
            Reply::Value { value } => Ok(value),
            _ => Err(BridgeError::UnexpectedReply {
                expected: "value",
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Drop interest in a pending request.
    ///
    /// The request is not retracted from the backend; a late reply is
    /// simply discarded by the router.
    pub async fn cancel(&self, request_id: u64) -> Result<(), BridgeError> {
        self.state
            .update(StateCommand::Cancel { id: request_id })
            .await
    }

    /// Discard registry state for a handle no longer needed.
    ///
    /// Registry entries are otherwise unbounded and would leak for the
    /// process lifetime.
    pub async fn release(&self, handle: &HandleId) -> Result<(), BridgeError> {
        self.state
            .update(StateCommand::Release {
                handle: handle.clone(),
            })
            .await
    }

    /// Await a pending reply with a host-layered deadline.
    ///
    /// On expiry the request is cancelled (a late reply will be discarded)
    /// and [`BridgeError::Timeout`] is synthesized. Timeouts are not
    /// intrinsic to the protocol; this is the supported way for a host to
    /// add one.
    pub async fn wait_with_timeout(
        &self,
        pending: PendingReply,
        deadline: Duration,
    ) -> Result<Reply, BridgeError> {
        let request_id = pending.request_id();
        match tokio::time::timeout(deadline, pending.wait()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.cancel(request_id).await.ok();
                Err(BridgeError::Timeout {
                    request_id,
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Current lifecycle status of a resource handle.
    pub async fn handle_status(&self, handle: &HandleId) -> HandleStatus {
        self.state.registry().read().await.status(handle)
    }

    /// Number of requests currently awaiting a reply.
    pub async fn pending_requests(&self) -> usize {
        self.state.pending_count().await
    }

    /// Why the channel is poisoned, or `None` while it is healthy.
    pub async fn poison_reason(&self) -> Option<String> {
        self.state.poison_reason().await
    }

    /// Reset a poisoned channel with a fresh transport.
    ///
    /// Pending requests were already failed when the channel was poisoned.
    /// Registry entries survive the reset - handles belong to backend-side
    /// state, so deciding their fate after a reconnect is up to the host.
    pub async fn reset(&self, transport: Arc<dyn Transport>) -> Result<(), BridgeError> {
        *self.transport.write().await = transport;
        self.state.update(StateCommand::Reset).await?;
        self.state.clear_poison().await;
        Ok(())
    }

    /// Inject the registry cursor into a page fetch and reject dead handles.
    async fn prepare_command(&self, command: Command) -> Result<Command, BridgeError> {
        match command {
            Command::FetchPage { handle, amount, .. } => {
                let registry = self.state.registry();
                let guard = registry.read().await;
                match guard.status(&handle) {
                    HandleStatus::Active => {
                        let cursor = guard.cursor(&handle);
                        Ok(Command::FetchPage {
                            handle,
                            amount,
                            cursor,
                        })
                    }
                    HandleStatus::Unknown | HandleStatus::Exhausted => {
                        Err(BridgeError::StaleHandle {
                            handle,
                            location: ErrorLocation::from(Location::caller()),
                        })
                    }
                }
            }
            other => Ok(other),
        }
    }
}
