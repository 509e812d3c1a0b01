//! Append-only action history.

use std::collections::HashSet;

use thiserror::Error;

use crate::action::{Action, ActionId, EraseRequest, Stroke};
use crate::eraser;

/// Action store errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} action has no id")]
    MissingId { kind: &'static str },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Ordered, append-only history of accepted actions.
///
/// Nothing is ever removed or edited in place: a deleted stroke stays in
/// history and is hidden by a later `delete-stroke` tombstone. The only way
/// to shrink history is [`ActionStore::reset`].
#[derive(Debug, Clone, Default)]
pub struct ActionStore {
    history: Vec<Action>,
}

impl ActionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action to the end of history.
    pub fn append(&mut self, action: Action) -> StoreResult<()> {
        if action.id().is_empty() {
            return Err(StoreError::MissingId { kind: action.kind() });
        }
        self.history.push(action);
        Ok(())
    }

    /// Copy of the full history, in insertion order.
    pub fn snapshot(&self) -> Vec<Action> {
        self.history.clone()
    }

    /// Empty the history.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Resolve an erase request against the current history and append the
    /// resulting tombstones. Returns the appended tombstones in order.
    pub fn erase(&mut self, request: &EraseRequest) -> Vec<Action> {
        let tombstones: Vec<Action> = eraser::resolve(request, &self.history)
            .into_iter()
            .map(Action::DeleteStroke)
            .collect();
        self.history.extend(tombstones.iter().cloned());
        tombstones
    }

    pub fn history(&self) -> &[Action] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Ids of all strokes hidden by a tombstone.
    pub fn tombstoned_ids(&self) -> HashSet<&ActionId> {
        eraser::tombstoned_ids(&self.history)
    }

    /// Strokes not hidden by any tombstone, in history order.
    pub fn visible_strokes(&self) -> Vec<&Stroke> {
        let deleted = self.tombstoned_ids();
        self.history
            .iter()
            .filter_map(Action::as_stroke)
            .filter(|s| !deleted.contains(&s.id))
            .collect()
    }
}
