//! Role assignment persistence
//!
//! The store hands out an exclusive per-user handle so the caller can run
//! the cooldown check and the state write as one critical section. Rows are
//! mutated only by the switch service; readers use `get`.

use crate::assignment::RoleAssignment;
use crate::error::SwitchError;
use async_trait::async_trait;
use gesta_core::UserId;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Exclusive handle on one user's assignment row.
///
/// Writes through the handle become visible to any `get` issued after the
/// handle is released; holding it blocks every other switch attempt for the
/// same user.
pub struct AssignmentGuard {
    inner: OwnedMutexGuard<RoleAssignment>,
}

impl Deref for AssignmentGuard {
    type Target = RoleAssignment;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AssignmentGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Persistent store of one [`RoleAssignment`] row per user
#[async_trait]
pub trait RoleAssignmentStore: Send + Sync {
    /// Insert a new row; fails with `Validation` if the user already has one
    async fn create(&self, assignment: RoleAssignment) -> Result<(), SwitchError>;

    /// Read-only snapshot of a user's row
    async fn get(&self, user_id: UserId) -> Result<Option<RoleAssignment>, SwitchError>;

    /// Exclusive read-modify-write handle on a user's row.
    ///
    /// Returns `None` if the user has no assignment. The returned guard
    /// serializes all mutation for that user.
    async fn lock(&self, user_id: UserId) -> Result<Option<AssignmentGuard>, SwitchError>;
}

/// In-process store backed by a map of per-user mutexes
#[derive(Debug, Default)]
pub struct MemoryRoleStore {
    rows: RwLock<HashMap<UserId, Arc<Mutex<RoleAssignment>>>>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleAssignmentStore for MemoryRoleStore {
    async fn create(&self, assignment: RoleAssignment) -> Result<(), SwitchError> {
        assignment.validate()?;
        let mut rows = self.rows.write().await;
        if rows.contains_key(&assignment.user_id) {
            return Err(SwitchError::validation(format!(
                "user {} already has a role assignment",
                assignment.user_id
            )));
        }
        rows.insert(assignment.user_id, Arc::new(Mutex::new(assignment)));
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<RoleAssignment>, SwitchError> {
        let row = {
            let rows = self.rows.read().await;
            rows.get(&user_id).cloned()
        };
        match row {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn lock(&self, user_id: UserId) -> Result<Option<AssignmentGuard>, SwitchError> {
        let row = {
            let rows = self.rows.read().await;
            rows.get(&user_id).cloned()
        };
        match row {
            Some(cell) => Ok(Some(AssignmentGuard {
                inner: cell.lock_owned().await,
            })),
            None => Ok(None),
        }
    }
}
