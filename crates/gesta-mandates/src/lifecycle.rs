//! Mandate lifecycle state machine
//!
//! Legal transitions and the actor allowed to trigger each:
//!
//! | from                       | event     | to         | actor           |
//! |----------------------------|-----------|------------|-----------------|
//! | pending                    | accept    | active     | agency          |
//! | pending                    | refuse    | terminated | agency          |
//! | active                     | suspend   | suspended  | agency          |
//! | pending/active/suspended   | terminate | terminated | owner or agency |
//! | active (end date passed)   | expire    | expired    | system          |
//!
//! Terminated and expired are absorbing. An event fired from a state not
//! in its row fails with `Conflict`; a permitted state with the wrong actor
//! fails with `Unauthorized`.

use crate::error::MandateError;
use crate::mandate::{Compensation, Mandate, MandateScope, MandateStatus, TerminationRecord};
use crate::store::MandateStore;
use chrono::{DateTime, Utc};
use gesta_core::{MandateId, PermissionSet, RetryPolicy, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MandateEvent {
    Accept,
    Refuse,
    Suspend,
    Terminate,
    Expire,
}

impl std::fmt::Display for MandateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Accept => "accept",
            Self::Refuse => "refuse",
            Self::Suspend => "suspend",
            Self::Terminate => "terminate",
            Self::Expire => "expire",
        };
        f.write_str(name)
    }
}

/// Who is asking for the transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionActor {
    Owner(UserId),
    Agency(UserId),
    /// The platform itself (expiry sweep)
    System,
}

/// The target status if `event` is legal from `status`
pub fn next_status(status: MandateStatus, event: MandateEvent) -> Option<MandateStatus> {
    use MandateEvent::*;
    use MandateStatus::*;
    match (status, event) {
        (Pending, Accept) => Some(Active),
        (Pending, Refuse) => Some(Terminated),
        (Active, Suspend) => Some(Suspended),
        (Pending | Active | Suspended, Terminate) => Some(Terminated),
        (Active, Expire) => Some(Expired),
        _ => None,
    }
}

/// Whether `actor` may fire `event` on `mandate`
fn actor_allowed(mandate: &Mandate, event: MandateEvent, actor: TransitionActor) -> bool {
    use MandateEvent::*;
    match event {
        Accept | Refuse | Suspend => matches!(
            actor,
            TransitionActor::Agency(id) if id == mandate.agency_id
        ),
        Terminate => matches!(
            actor,
            TransitionActor::Owner(id) if id == mandate.owner_id
        ) || matches!(
            actor,
            TransitionActor::Agency(id) if id == mandate.agency_id
        ),
        Expire => matches!(actor, TransitionActor::System),
    }
}

/// Orchestrates mandate creation and status transitions
pub struct MandateLifecycle<S> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S: MandateStore> MandateLifecycle<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Owner creates a new pending delegation.
    ///
    /// Fails with `DuplicateMandate` if a live mandate already occupies the
    /// (owner, agency, scope) slot.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_mandate(
        &self,
        owner_id: UserId,
        agency_id: UserId,
        scope: MandateScope,
        permissions: PermissionSet,
        compensation: Compensation,
        end_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Mandate, MandateError> {
        let mandate = Mandate::pending(
            owner_id,
            agency_id,
            scope,
            permissions,
            compensation,
            end_date,
            now,
        )?;
        self.retry
            .run(|| self.store.insert_pending(mandate.clone()))
            .await?;
        tracing::info!(
            mandate_id = %mandate.id,
            %owner_id,
            %agency_id,
            ?scope,
            "mandate created"
        );
        Ok(mandate)
    }

    /// Fire a lifecycle event on a mandate.
    ///
    /// `reason` is required for terminate and refuse. The read of the
    /// current status and the write of the new one happen under the
    /// mandate's lock, so two racing transitions cannot both succeed.
    pub async fn transition(
        &self,
        mandate_id: MandateId,
        event: MandateEvent,
        actor: TransitionActor,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Mandate, MandateError> {
        let updated = self
            .retry
            .run(|| self.apply_transition(mandate_id, event, actor, reason, now))
            .await;
        match &updated {
            Ok(mandate) => {
                tracing::info!(%mandate_id, %event, status = %mandate.status, "mandate transitioned");
            }
            Err(err) => {
                tracing::warn!(%mandate_id, %event, error = %err, "mandate transition rejected");
            }
        }
        updated
    }

    /// Move every active mandate whose end date has passed to expired.
    ///
    /// The resolver also ignores overdue mandates on its own, so a late
    /// sweep never leaks permissions; this keeps the stored status honest.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<MandateId>, MandateError> {
        let mandates = self.retry.run(|| self.store.all()).await?;
        let mut expired = Vec::new();
        for mandate in mandates {
            if mandate.status == MandateStatus::Active && mandate.is_past_end(now) {
                match self
                    .transition(
                        mandate.id,
                        MandateEvent::Expire,
                        TransitionActor::System,
                        None,
                        now,
                    )
                    .await
                {
                    Ok(_) => expired.push(mandate.id),
                    // a racing terminate got there first; nothing to do
                    Err(MandateError::Conflict { .. }) => {}
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(expired)
    }

    async fn apply_transition(
        &self,
        mandate_id: MandateId,
        event: MandateEvent,
        actor: TransitionActor,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Mandate, MandateError> {
        let needs_reason = matches!(event, MandateEvent::Terminate | MandateEvent::Refuse);
        if needs_reason && reason.map_or(true, |r| r.trim().is_empty()) {
            return Err(MandateError::validation(format!(
                "a reason is required to {event} a mandate"
            )));
        }

        let Some(mut guard) = self.store.lock(mandate_id).await? else {
            return Err(MandateError::NotFound { mandate_id });
        };

        let Some(target) = next_status(guard.status, event) else {
            return Err(MandateError::Conflict {
                status: guard.status,
                event,
            });
        };
        if !actor_allowed(&guard, event, actor) {
            return Err(MandateError::Unauthorized { event });
        }
        if event == MandateEvent::Expire && !guard.is_past_end(now) {
            // the end date has not passed; expiry is not due
            return Err(MandateError::Conflict {
                status: guard.status,
                event,
            });
        }

        guard.status = target;
        match event {
            MandateEvent::Accept => guard.accepted_at = Some(now),
            MandateEvent::Terminate | MandateEvent::Refuse => {
                let actor_id = match actor {
                    TransitionActor::Owner(id) | TransitionActor::Agency(id) => Some(id),
                    TransitionActor::System => None,
                };
                guard.termination = Some(TerminationRecord {
                    actor_id,
                    at: now,
                    reason: reason.unwrap_or_default().to_string(),
                });
            }
            MandateEvent::Suspend | MandateEvent::Expire => {}
        }
        Ok(guard.clone())
    }
}
