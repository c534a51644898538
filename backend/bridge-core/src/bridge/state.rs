//! Bridge state management using actor pattern.
//!
//! The correlation table and the resource registry are shared mutable state
//! touched from two execution contexts: the dispatch path (caller sends) and
//! the routing path (transport delivered a frame). All mutations are
//! serialized through a single mpsc channel into a dedicated actor task, so
//! the two paths can never interleave inside the tables.
//!
//! # Why Actor Pattern?
//!
//! - **Race-free:** All mutations are serialized by design
//! - **Ordered:** a request's registration is enqueued before its frame is
//!   sent, so its resolution can never be processed first
//! - **Fast reads:** the registry sits behind an `Arc<RwLock>` written only
//!   by the actor, so stale-handle checks on the dispatch path read it
//!   without queueing

use crate::bridge::correlation::{Continuation, CorrelationTable};
use crate::bridge::registry::ResourceRegistry;
use crate::error::bridge::BridgeError;
use crate::protocol::{Outcome, Reply};

use common::{ErrorLocation, HandleId};

use std::panic::Location;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};

/// Commands that mutate or query bridge state.
///
/// All state changes go through the state actor via these commands. This
/// ensures serialized access and prevents race conditions between the send
/// path and the receive path.
pub enum StateCommand {
    /// Register a pending request before its frame is handed to the transport.
    Register { id: u64, continuation: Continuation },

    /// Resolve a pending request with the outcome carried by an inbound frame.
    Resolve { id: u64, outcome: Outcome },

    /// Drop a pending request without invoking its continuation.
    Cancel { id: u64 },

    /// Discard registry state for a handle the host no longer needs.
    Release { handle: HandleId },

    /// Mark the channel unusable and fail every pending request.
    Poison { message: String },

    /// Clear a poisoned channel after the host reset the transport.
    Reset,

    /// Query the number of pending requests (serialized with mutations).
    PendingCount { reply: oneshot::Sender<usize> },
}

/// Bridge state manager.
///
/// Uses an actor pattern to ensure all state mutations are serialized.
/// The correlation table lives inside the actor task (continuations are
/// single-use and never leave it); the resource registry is shared behind
/// a `RwLock` that only the actor writes.
///
/// # Thread Safety
///
/// This type is `Clone` and can be shared across tasks. All clones share
/// the same underlying state.
#[derive(Clone)]
pub struct BridgeState {
    /// Channel to send state commands to the actor
    command_tx: Arc<Mutex<Option<mpsc::Sender<StateCommand>>>>,

    /// Shared registry; written by the actor, read by the dispatcher
    registry: Arc<RwLock<ResourceRegistry>>,

    /// Why the channel is poisoned, if it is
    poison: Arc<RwLock<Option<String>>>,

    /// Track if actor has been initialized
    actor_init: Arc<Mutex<bool>>,
}

impl BridgeState {
    /// Create a new bridge state manager.
    ///
    /// The actor is lazily spawned on first use within an async context.
    pub fn new() -> Self {
        Self {
            command_tx: Arc::new(Mutex::new(None)),
            registry: Arc::new(RwLock::new(ResourceRegistry::new())),
            poison: Arc::new(RwLock::new(None)),
            actor_init: Arc::new(Mutex::new(false)),
        }
    }

    /// Send a state command.
    ///
    /// This will spawn the actor on first call (lazy initialization).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ProtocolViolation`] if the state actor has
    /// died - a channel-fatal condition that should never occur while any
    /// bridge handle is alive.
    pub async fn update(&self, cmd: StateCommand) -> Result<(), BridgeError> {
        self.ensure_actor().await;

        let tx_guard = self.command_tx.lock().await;
        let tx = tx_guard.as_ref().ok_or_else(|| BridgeError::ProtocolViolation {
            message: "State actor not initialized".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        tx.send(cmd).await.map_err(|e| BridgeError::ProtocolViolation {
            message: format!("State actor died: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Shared handle to the resource registry (read-side).
    pub fn registry(&self) -> Arc<RwLock<ResourceRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Why the channel is poisoned, or `None` while it is healthy.
    pub async fn poison_reason(&self) -> Option<String> {
        self.poison.read().await.clone()
    }

    /// Clear the poison marker immediately.
    ///
    /// The actor clears its own flag when it processes `Reset`; this makes
    /// the recovery visible to dispatchers without waiting on the queue.
    pub async fn clear_poison(&self) {
        *self.poison.write().await = None;
    }

    /// Number of requests currently pending.
    ///
    /// The query travels through the actor queue, so it observes every
    /// mutation enqueued before it.
    pub async fn pending_count(&self) -> usize {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .update(StateCommand::PendingCount { reply: reply_tx })
            .await
            .is_err()
        {
            return 0;
        }
        reply_rx.await.unwrap_or(0)
    }

    /// Ensure actor is spawned (called lazily from async context).
    async fn ensure_actor(&self) {
        let mut init_guard = self.actor_init.lock().await;
        if !*init_guard {
            let (tx, rx) = mpsc::channel(100);
            let registry_clone = Arc::clone(&self.registry);
            let poison_clone = Arc::clone(&self.poison);

            // Store tx BEFORE spawning to avoid race
            let mut tx_guard = self.command_tx.lock().await;
            *tx_guard = Some(tx);
            drop(tx_guard);

            tokio::spawn(state_actor(rx, registry_clone, poison_clone));
            *init_guard = true;
            info!("Bridge state actor spawned");
        }
    }
}

impl Default for BridgeState {
    fn default() -> Self {
        Self::new()
    }
}

/// The state actor task.
///
/// Owns the correlation table and processes commands sequentially until the
/// channel closes (which happens when all BridgeState handles are dropped).
async fn state_actor(
    mut command_rx: mpsc::Receiver<StateCommand>,
    registry: Arc<RwLock<ResourceRegistry>>,
    poison: Arc<RwLock<Option<String>>>,
) {
    info!("Bridge state actor started");

    let mut correlation = CorrelationTable::new();
    let mut poisoned = false;

    while let Some(cmd) = command_rx.recv().await {
        match cmd {
            StateCommand::Register { id, continuation } => {
                if poisoned {
                    let reason = poison
                        .read()
                        .await
                        .clone()
                        .unwrap_or_else(|| "channel poisoned".to_string());
                    let _ = continuation.send(Err(BridgeError::ProtocolViolation {
                        message: reason,
                        location: ErrorLocation::from(Location::caller()),
                    }));
                    continue;
                }
                correlation.register(id, continuation);
            }

            StateCommand::Resolve { id, outcome } => {
                if let Some(message) = resolve_reply(&mut correlation, &registry, id, outcome).await
                {
                    poisoned = true;
                    poison_channel(&mut correlation, &poison, message).await;
                }
            }

            StateCommand::Cancel { id } => {
                if correlation.cancel(id) {
                    info!("Cancelled pending request {id}");
                } else {
                    warn!("Cancel requested for unknown request {id}");
                }
            }

            StateCommand::Release { handle } => {
                if registry.write().await.release(&handle) {
                    info!("Released resource handle {handle}");
                } else {
                    warn!("Release requested for unknown handle {handle}");
                }
            }

            StateCommand::Poison { message } => {
                poisoned = true;
                poison_channel(&mut correlation, &poison, message).await;
            }

            StateCommand::Reset => {
                poisoned = false;
                *poison.write().await = None;
                info!("Bridge channel reset by host");
            }

            StateCommand::PendingCount { reply } => {
                let _ = reply.send(correlation.len());
            }
        }
    }

    warn!("Bridge state actor stopped - all bridge handles were dropped");
}

/// Resolve one inbound outcome against the correlation table.
///
/// Registry bookkeeping happens before the continuation fires, so a caller
/// that observed a `done` page is guaranteed to find its handle already
/// marked exhausted. Returns a poison message when the reply reveals a
/// backend protocol fault (a reissued live handle).
async fn resolve_reply(
    correlation: &mut CorrelationTable,
    registry: &Arc<RwLock<ResourceRegistry>>,
    id: u64,
    outcome: Outcome,
) -> Option<String> {
    // Unknown ids never invoke a continuation and never touch the registry.
    if !correlation.contains(id) {
        warn!("Ignoring reply for unknown or already resolved request {id}");
        return None;
    }

    let result = match outcome {
        Outcome::Ok(reply) => {
            match &reply {
                Reply::Handle { handle } => {
                    if !registry.write().await.allocate(handle.clone()) {
                        error!("Backend reissued live resource handle {handle}");
                        return Some(format!("backend reissued live resource handle {handle}"));
                    }
                    info!("Allocated resource handle {handle}");
                }
                Reply::Page {
                    handle,
                    cursor,
                    done,
                    ..
                } => {
                    if !registry.write().await.advance(handle, cursor.clone(), *done) {
                        warn!("Page reply for unknown handle {handle} - released mid-flight");
                    } else if *done {
                        info!("Resource handle {handle} exhausted");
                    }
                }
                Reply::Value { .. } => {}
            }
            Ok(reply)
        }
        Outcome::Error { message } => Err(BridgeError::Backend { message }),
    };

    correlation.resolve(id, result);
    None
}

/// Record the poison reason and fail every pending request.
async fn poison_channel(
    correlation: &mut CorrelationTable,
    poison: &Arc<RwLock<Option<String>>>,
    message: String,
) {
    error!("Channel poisoned: {message}");
    *poison.write().await = Some(message.clone());

    for (id, continuation) in correlation.drain() {
        warn!("Failing pending request {id}: channel poisoned");
        let _ = continuation.send(Err(BridgeError::ProtocolViolation {
            message: message.clone(),
            location: ErrorLocation::from(Location::caller()),
        }));
    }
}
