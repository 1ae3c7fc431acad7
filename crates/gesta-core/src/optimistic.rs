//! Optimistic update coordination
//!
//! Callers may show a tentative state change before the authoritative
//! service responds. The contract is snapshot / apply / reconcile:
//!
//! 1. `begin` snapshots the current state and records the speculative
//!    projection the caller wants to display.
//! 2. On authoritative success, `reconcile` adopts the authoritative state
//!    verbatim (it may differ from the projection).
//! 3. On authoritative failure or abandonment, `rollback` returns the
//!    snapshot exactly; the speculative state is discarded whole, never
//!    partially merged.
//!
//! At most one operation per key may be in flight; a second `begin` for the
//! same key fails with [`OptimisticError::InFlight`] until the first op is
//! resolved or dropped.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

/// Errors from the optimistic update contract
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptimisticError {
    /// Another operation for the same key has not been resolved yet
    #[error("an optimistic operation is already in flight for this key")]
    InFlight,
}

/// Tracks in-flight optimistic operations, one per key.
///
/// `K` is the entity key (user id, mandate id); `S` is the caller's local
/// view of that entity's state.
#[derive(Debug)]
pub struct OptimisticCoordinator<K, S> {
    in_flight: Arc<Mutex<HashSet<K>>>,
    _state: PhantomData<fn() -> S>,
}

impl<K, S> Default for OptimisticCoordinator<K, S>
where
    K: Eq + Hash + Clone,
    S: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> OptimisticCoordinator<K, S>
where
    K: Eq + Hash + Clone,
    S: Clone,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            _state: PhantomData,
        }
    }

    /// Start an optimistic operation for `key`.
    ///
    /// Snapshots `current` and records `projection` as the state to display
    /// while the authoritative call is in flight.
    pub fn begin(
        &self,
        key: K,
        current: &S,
        projection: S,
    ) -> Result<OptimisticOp<K, S>, OptimisticError> {
        let mut keys = self.in_flight.lock();
        if !keys.insert(key.clone()) {
            return Err(OptimisticError::InFlight);
        }
        Ok(OptimisticOp {
            key,
            snapshot: current.clone(),
            speculative: projection,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Whether an operation is currently in flight for `key`
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.lock().contains(key)
    }
}

/// A single in-flight optimistic operation.
///
/// Holds the snapshot and the speculative projection. Resolving (or simply
/// dropping) the op releases the key for the next operation.
#[derive(Debug)]
pub struct OptimisticOp<K: Eq + Hash, S> {
    key: K,
    snapshot: S,
    speculative: S,
    in_flight: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash, S: Clone> OptimisticOp<K, S> {
    /// The state to display while the authoritative call is pending
    pub fn speculative(&self) -> &S {
        &self.speculative
    }

    /// The state captured when the operation began
    pub fn snapshot(&self) -> &S {
        &self.snapshot
    }

    /// Authoritative success: adopt the authoritative state verbatim.
    ///
    /// The authoritative response is the source of truth even where it
    /// differs from the projection.
    pub fn reconcile(self, authoritative: S) -> S {
        authoritative
    }

    /// Authoritative failure or caller abandonment: restore the snapshot
    /// exactly, discarding the speculative state whole.
    pub fn rollback(self) -> S {
        self.snapshot.clone()
    }
}

impl<K: Eq + Hash, S> Drop for OptimisticOp<K, S> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}
