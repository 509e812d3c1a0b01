//! The shared drawing surface: history plus fan-out.
//!
//! All mutations of history and the matching broadcasts happen under one
//! lock, so every connection sees actions in the same order. Each peer has
//! its own unbounded queue; socket writes happen later, in the peer's
//! session task, after the lock is released.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use inkrelay_core::{Action, ActionStore, Clear};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::protocol::ServerEvent;

/// Identifier of one client connection.
pub type ConnectionId = String;

struct HubInner {
    store: ActionStore,
    /// Fan-out set: one event queue per connected peer.
    peers: HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
}

impl HubInner {
    /// Queue an event for every peer. Peers whose session has gone away are
    /// dropped from the set.
    fn broadcast(&mut self, event: &ServerEvent) {
        self.peers.retain(|conn_id, tx| {
            let alive = tx.send(event.clone()).is_ok();
            if !alive {
                debug!(conn_id = %conn_id, "Dropping closed peer");
            }
            alive
        });
    }
}

/// Owner of the action history and the set of connected peers.
pub struct Hub {
    inner: Mutex<HubInner>,
}

/// A freshly registered connection.
pub struct Subscription {
    pub conn_id: ConnectionId,
    /// History at the moment of joining, to be sent as `init`.
    pub snapshot: Vec<Action>,
    /// Every action broadcast after the snapshot was taken.
    pub events: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HubInner {
                store: ActionStore::new(),
                peers: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection. The snapshot and the subscription are taken
    /// together, so nothing is missed or duplicated between `init` and the
    /// live stream.
    pub fn connect(&self) -> Subscription {
        let conn_id = Uuid::new_v4().to_string();
        let (tx, events) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        inner.peers.insert(conn_id.clone(), tx);
        Subscription {
            conn_id,
            snapshot: inner.store.snapshot(),
            events,
        }
    }

    /// Remove a connection from the fan-out set.
    pub fn disconnect(&self, conn_id: &str) {
        self.lock().peers.remove(conn_id);
    }

    /// Process one inbound action. Returns the actions that were recorded
    /// and broadcast.
    pub fn submit(&self, mut action: Action) -> Vec<Action> {
        action.ensure_id();
        let mut inner = self.lock();

        let recorded = match action {
            Action::EraseStrokeRequest(request) => inner.store.erase(&request),
            action @ (Action::Stroke(_)
            | Action::Image(_)
            | Action::DeleteStroke(_)
            | Action::Clear(_)) => match inner.store.append(action.clone()) {
                Ok(()) => vec![action],
                Err(e) => {
                    warn!(error = %e, "Dropping action");
                    Vec::new()
                }
            },
        };

        for action in &recorded {
            inner.broadcast(&ServerEvent::Action(action.clone()));
        }
        debug!(
            recorded = recorded.len(),
            history = inner.store.len(),
            "Processed action"
        );
        recorded
    }

    /// Wipe the history and broadcast a `clear` marker.
    pub fn clear_history(&self) -> Action {
        let clear = Action::Clear(Clear::new());
        let mut inner = self.lock();
        inner.store.reset();
        inner.broadcast(&ServerEvent::Action(clear.clone()));
        clear
    }

    pub fn snapshot(&self) -> Vec<Action> {
        self.lock().store.snapshot()
    }

    pub fn peer_count(&self) -> usize {
        self.lock().peers.len()
    }

    pub fn history_len(&self) -> usize {
        self.lock().store.len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
