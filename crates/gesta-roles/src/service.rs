//! Role switch orchestration
//!
//! `RoleSwitchService` is the only writer of role assignments. A switch
//! request is validated, gated by the cooldown policy, and applied while
//! holding the store's per-user handle, so the check and the mutation are
//! one atomic unit. Transient storage failures go through the bounded
//! retry policy; each attempt is its own critical section, so a retried
//! request can never double-apply.

use crate::assignment::RoleAssignment;
use crate::cooldown::{BlockReason, CooldownPolicy, SwitchGate};
use crate::error::SwitchError;
use crate::store::RoleAssignmentStore;
use chrono::{DateTime, Utc};
use gesta_core::time::next_day_boundary;
use gesta_core::{RetryPolicy, Role, UserId};
use std::sync::Arc;

/// Observer of successful switches.
///
/// Any cached permission view keyed by "acting role" must be dropped once
/// the role changes; the service notifies every registered cache after the
/// authoritative write lands.
pub trait RoleViewCache: Send + Sync {
    fn invalidate(&self, user_id: UserId);
}

/// What a successful switch changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReceipt {
    pub previous_role: Role,
    pub new_role: Role,
    /// Switches left today after this one
    pub remaining_switches: u32,
    /// When the daily counter next resets
    pub next_reset: DateTime<Utc>,
    /// Until when further switches are blocked by the cooldown window
    pub cooldown_until: DateTime<Utc>,
}

/// Outcome of a switch request that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The role changed; quota was consumed
    Switched(SwitchReceipt),
    /// The user already acts as the requested role; nothing changed and no
    /// quota was consumed
    AlreadyActive {
        role: Role,
        remaining_switches: u32,
        next_reset: DateTime<Utc>,
        /// Present when the user is still inside the cooldown window
        cooldown_until: Option<DateTime<Utc>>,
    },
}

/// Orchestrates role switches against a [`RoleAssignmentStore`]
pub struct RoleSwitchService<S> {
    store: Arc<S>,
    policy: CooldownPolicy,
    retry: RetryPolicy,
    observers: Vec<Arc<dyn RoleViewCache>>,
}

impl<S: RoleAssignmentStore> RoleSwitchService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            policy: CooldownPolicy::default(),
            retry: RetryPolicy::default(),
            observers: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: CooldownPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Register a cache to invalidate after every successful switch
    pub fn with_observer(mut self, observer: Arc<dyn RoleViewCache>) -> Self {
        self.observers.push(observer);
        self
    }

    /// The policy this service gates switches with
    pub fn policy(&self) -> &CooldownPolicy {
        &self.policy
    }

    /// Switch `user_id` to `target_role`, evaluated at the current instant
    pub async fn switch_role(
        &self,
        user_id: UserId,
        target_role: Role,
    ) -> Result<SwitchOutcome, SwitchError> {
        self.switch_role_at(user_id, target_role, Utc::now()).await
    }

    /// Switch `user_id` to `target_role` as of `now`.
    ///
    /// Time is explicit so callers (and tests) control the clock; the
    /// decision itself is made inside the per-user critical section.
    pub async fn switch_role_at(
        &self,
        user_id: UserId,
        target_role: Role,
        now: DateTime<Utc>,
    ) -> Result<SwitchOutcome, SwitchError> {
        let outcome = self
            .retry
            .run(|| self.attempt_switch(user_id, target_role, now))
            .await;

        match &outcome {
            Ok(SwitchOutcome::Switched(receipt)) => {
                tracing::info!(
                    %user_id,
                    from = %receipt.previous_role,
                    to = %receipt.new_role,
                    remaining = receipt.remaining_switches,
                    "role switched"
                );
                for observer in &self.observers {
                    observer.invalidate(user_id);
                }
            }
            Ok(SwitchOutcome::AlreadyActive { role, .. }) => {
                tracing::debug!(%user_id, %role, "switch requested to the active role");
            }
            Err(err) => {
                tracing::warn!(%user_id, target = %target_role, error = %err, "switch rejected");
            }
        }
        outcome
    }

    async fn attempt_switch(
        &self,
        user_id: UserId,
        target_role: Role,
        now: DateTime<Utc>,
    ) -> Result<SwitchOutcome, SwitchError> {
        let Some(mut guard) = self.store.lock(user_id).await? else {
            return Err(SwitchError::NotAuthenticated);
        };

        if guard.current_role == target_role {
            return Ok(self.already_active(&guard, now));
        }
        if !guard.available_roles.contains(&target_role) {
            return Err(SwitchError::InvalidRole {
                requested: target_role,
            });
        }

        match self.policy.evaluate(&guard, now) {
            SwitchGate::Blocked {
                reason: BlockReason::Cooldown,
                retry_after,
            } => Err(SwitchError::Cooldown { retry_after }),
            SwitchGate::Blocked {
                reason: BlockReason::DailyLimit,
                retry_after,
            } => Err(SwitchError::DailyLimit { retry_after }),
            SwitchGate::Allowed {
                effective_count,
                reset_boundary,
            } => {
                let previous_role = guard.current_role;
                let new_count = effective_count + 1;

                guard.current_role = target_role;
                guard.daily_switch_count = new_count;
                guard.last_switch_at = Some(now);
                guard.reset_boundary = reset_boundary;

                Ok(SwitchOutcome::Switched(SwitchReceipt {
                    previous_role,
                    new_role: target_role,
                    remaining_switches: self.policy.daily_quota.saturating_sub(new_count),
                    next_reset: reset_boundary,
                    cooldown_until: now + self.policy.cooldown_window,
                }))
            }
        }
    }

    /// No-op outcome: report the current throttling state without mutating
    /// anything or consuming quota.
    fn already_active(&self, assignment: &RoleAssignment, now: DateTime<Utc>) -> SwitchOutcome {
        let crossed = now >= assignment.reset_boundary;
        let effective_count = if crossed { 0 } else { assignment.daily_switch_count };
        let next_reset = if crossed {
            next_day_boundary(now, self.policy.reference)
        } else {
            assignment.reset_boundary
        };
        let cooldown_until = assignment.last_switch_at.and_then(|last| {
            let until = last + self.policy.cooldown_window;
            (until > now).then_some(until)
        });
        SwitchOutcome::AlreadyActive {
            role: assignment.current_role,
            remaining_switches: self.policy.daily_quota.saturating_sub(effective_count),
            next_reset,
            cooldown_until,
        }
    }
}
