//! Mandate persistence
//!
//! Insertion and the duplicate-prevention check run under one lock, and
//! each mandate row has its own mutex so a status transition reads and
//! writes the row as one indivisible operation.

use crate::error::MandateError;
use crate::mandate::{Mandate, MandateScope};
use async_trait::async_trait;
use gesta_core::{MandateId, UserId};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Exclusive handle on one mandate row
pub struct MandateGuard {
    inner: OwnedMutexGuard<Mandate>,
}

impl Deref for MandateGuard {
    type Target = Mandate;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for MandateGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Persistent store of delegation contracts
#[async_trait]
pub trait MandateStore: Send + Sync {
    /// Insert a new pending mandate.
    ///
    /// The one-live-mandate invariant per (owner, agency, scope) is checked
    /// and the row inserted under a single lock; a concurrent duplicate
    /// creation cannot slip through between the check and the insert.
    async fn insert_pending(&self, mandate: Mandate) -> Result<(), MandateError>;

    /// Read-only snapshot of one mandate
    async fn get(&self, mandate_id: MandateId) -> Result<Option<Mandate>, MandateError>;

    /// All mandates where this agency is the delegate, any status.
    ///
    /// The resolver filters for active status itself; returning the full
    /// set keeps the precedence rule a pure, testable function.
    async fn for_agency(&self, agency_id: UserId) -> Result<Vec<Mandate>, MandateError>;

    /// Every stored mandate; used by the expiry sweep
    async fn all(&self) -> Result<Vec<Mandate>, MandateError>;

    /// Exclusive read-modify-write handle on one mandate
    async fn lock(&self, mandate_id: MandateId) -> Result<Option<MandateGuard>, MandateError>;
}

/// In-process store backed by a map of per-mandate mutexes
#[derive(Debug, Default)]
pub struct MemoryMandateStore {
    rows: RwLock<HashMap<MandateId, Arc<Mutex<Mandate>>>>,
}

impl MemoryMandateStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn live_duplicate_exists(
        rows: &HashMap<MandateId, Arc<Mutex<Mandate>>>,
        owner_id: UserId,
        agency_id: UserId,
        scope: MandateScope,
    ) -> bool {
        for cell in rows.values() {
            let row = cell.lock().await;
            if row.owner_id == owner_id
                && row.agency_id == agency_id
                && row.scope == scope
                && row.status.is_live()
            {
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl MandateStore for MemoryMandateStore {
    async fn insert_pending(&self, mandate: Mandate) -> Result<(), MandateError> {
        let mut rows = self.rows.write().await;
        if Self::live_duplicate_exists(&rows, mandate.owner_id, mandate.agency_id, mandate.scope)
            .await
        {
            return Err(MandateError::DuplicateMandate {
                owner_id: mandate.owner_id,
                agency_id: mandate.agency_id,
            });
        }
        rows.insert(mandate.id, Arc::new(Mutex::new(mandate)));
        Ok(())
    }

    async fn get(&self, mandate_id: MandateId) -> Result<Option<Mandate>, MandateError> {
        let row = {
            let rows = self.rows.read().await;
            rows.get(&mandate_id).cloned()
        };
        match row {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn for_agency(&self, agency_id: UserId) -> Result<Vec<Mandate>, MandateError> {
        let cells: Vec<_> = {
            let rows = self.rows.read().await;
            rows.values().cloned().collect()
        };
        let mut result = Vec::new();
        for cell in cells {
            let row = cell.lock().await;
            if row.agency_id == agency_id {
                result.push(row.clone());
            }
        }
        Ok(result)
    }

    async fn all(&self) -> Result<Vec<Mandate>, MandateError> {
        let cells: Vec<_> = {
            let rows = self.rows.read().await;
            rows.values().cloned().collect()
        };
        let mut result = Vec::new();
        for cell in cells {
            result.push(cell.lock().await.clone());
        }
        Ok(result)
    }

    async fn lock(&self, mandate_id: MandateId) -> Result<Option<MandateGuard>, MandateError> {
        let row = {
            let rows = self.rows.read().await;
            rows.get(&mandate_id).cloned()
        };
        match row {
            Some(cell) => Ok(Some(MandateGuard {
                inner: cell.lock_owned().await,
            })),
            None => Ok(None),
        }
    }
}
