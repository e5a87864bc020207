#![deny(missing_docs)]
//! In-memory registry of observable execution states.
//!
//! One [`StateCell`] per [`CapabilityIdentity`], created lazily on first
//! access and never removed. Each cell wraps a `tokio::sync::watch`
//! channel, so UI layers can hold a receiver and redraw on every change
//! while the executor writes through the cell.
//!
//! The registry itself is a `HashMap` behind a `RwLock`; cells are cheap
//! clones sharing the same channel.

use relaycap_protocol::{CapabilityIdentity, ExecutionId, ExecutionState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

/// Observable state of one capability identity.
#[derive(Clone)]
pub struct StateCell {
    identity: CapabilityIdentity,
    sender: Arc<watch::Sender<ExecutionState>>,
}

impl StateCell {
    fn new(identity: CapabilityIdentity) -> Self {
        let (sender, _) = watch::channel(ExecutionState::idle(&identity));
        Self {
            identity,
            sender: Arc::new(sender),
        }
    }

    /// The identity this cell tracks.
    pub fn identity(&self) -> &CapabilityIdentity {
        &self.identity
    }

    /// Current value.
    pub fn snapshot(&self) -> ExecutionState {
        self.sender.borrow().clone()
    }

    /// A receiver that sees every future change.
    pub fn subscribe(&self) -> watch::Receiver<ExecutionState> {
        self.sender.subscribe()
    }

    /// Apply `f` and notify subscribers, whoever owns the state.
    pub fn update(&self, f: impl FnOnce(&mut ExecutionState)) {
        self.sender.send_modify(f);
    }

    /// Apply `f` only if `owner` is the execution that owns the state.
    /// Returns whether the update was applied.
    pub fn update_owned(&self, owner: &ExecutionId, f: impl FnOnce(&mut ExecutionState)) -> bool {
        self.sender.send_if_modified(|state| {
            if !state.is_owned_by(owner) {
                return false;
            }
            f(state);
            true
        })
    }

    /// Back to idle; see [`ExecutionState::reset`].
    pub fn reset(&self) {
        self.update(ExecutionState::reset);
    }
}

impl std::fmt::Debug for StateCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCell")
            .field("identity", &self.identity)
            .field("status", &self.sender.borrow().status)
            .finish()
    }
}

/// Process-wide registry of [`StateCell`]s, owned by the executor.
pub struct ExecutionStateStore {
    cells: RwLock<HashMap<CapabilityIdentity, StateCell>>,
}

impl ExecutionStateStore {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
        }
    }

    /// The cell for `identity`, created idle if it does not exist yet.
    pub async fn get(&self, identity: &CapabilityIdentity) -> StateCell {
        if let Some(cell) = self.cells.read().await.get(identity) {
            return cell.clone();
        }
        let mut cells = self.cells.write().await;
        cells
            .entry(identity.clone())
            .or_insert_with(|| StateCell::new(identity.clone()))
            .clone()
    }

    /// Current value for `identity`, if it has ever been accessed.
    pub async fn snapshot(&self, identity: &CapabilityIdentity) -> Option<ExecutionState> {
        self.cells.read().await.get(identity).map(StateCell::snapshot)
    }

    /// Reset one identity to idle. In-flight executions are not touched.
    /// Returns `false` if the identity is unknown.
    pub async fn reset(&self, identity: &CapabilityIdentity) -> bool {
        match self.cells.read().await.get(identity) {
            Some(cell) => {
                cell.reset();
                true
            }
            None => false,
        }
    }

    /// Reset every known identity to idle. No identity is removed.
    pub async fn reset_all(&self) {
        for cell in self.cells.read().await.values() {
            cell.reset();
        }
    }

    /// Every identity accessed so far, sorted.
    pub async fn identities(&self) -> Vec<CapabilityIdentity> {
        let mut ids: Vec<_> = self.cells.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of known identities.
    pub async fn len(&self) -> usize {
        self.cells.read().await.len()
    }

    /// Whether no identity has been accessed yet.
    pub async fn is_empty(&self) -> bool {
        self.cells.read().await.is_empty()
    }
}

impl Default for ExecutionStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaycap_protocol::{EventId, ExecutionStatus};

    #[tokio::test]
    async fn update_owned_rejects_other_executions() {
        let store = ExecutionStateStore::new();
        let cell = store.get(&CapabilityIdentity::tool("t")).await;
        cell.update(|s| s.begin(Some(EventId::new("a"))));

        assert!(!cell.update_owned(&EventId::new("b"), |s| s.fail("stale")));
        assert!(cell.update_owned(&EventId::new("a"), |s| s.succeed(serde_json::json!(1))));
        assert_eq!(cell.snapshot().status, ExecutionStatus::Success);
    }

    #[tokio::test]
    async fn debug_shows_status() {
        let store = ExecutionStateStore::new();
        let cell = store.get(&CapabilityIdentity::prompt("p")).await;
        assert!(format!("{cell:?}").contains("Idle"));
    }
}
