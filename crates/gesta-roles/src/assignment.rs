//! Per-user role assignment record

use crate::error::SwitchError;
use chrono::{DateTime, FixedOffset, Utc};
use gesta_core::time::next_day_boundary;
use gesta_core::{Role, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The authoritative record of which roles a user holds and which one they
/// are currently acting as.
///
/// `current_role` changes only through a successful switch transaction, and
/// `daily_switch_count` never decreases except when a reset boundary is
/// crossed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// The user owning this record
    pub user_id: UserId,

    /// Roles this user may act as; never empty
    pub available_roles: BTreeSet<Role>,

    /// The role the user is currently acting as; always a member of
    /// `available_roles`
    pub current_role: Role,

    /// Successful switches since the last reset boundary
    pub daily_switch_count: u32,

    /// When the last successful switch happened, if any
    pub last_switch_at: Option<DateTime<Utc>>,

    /// Next instant at which `daily_switch_count` logically resets to zero
    pub reset_boundary: DateTime<Utc>,
}

impl RoleAssignment {
    /// Create a fresh assignment with no switches consumed.
    ///
    /// Fails with `Validation` if `available_roles` is empty or does not
    /// contain `current_role`.
    pub fn new(
        user_id: UserId,
        available_roles: BTreeSet<Role>,
        current_role: Role,
        now: DateTime<Utc>,
        reference: FixedOffset,
    ) -> Result<Self, SwitchError> {
        let assignment = Self {
            user_id,
            available_roles,
            current_role,
            daily_switch_count: 0,
            last_switch_at: None,
            reset_boundary: next_day_boundary(now, reference),
        };
        assignment.validate()?;
        Ok(assignment)
    }

    /// Check the structural invariants
    pub fn validate(&self) -> Result<(), SwitchError> {
        if self.available_roles.is_empty() {
            return Err(SwitchError::validation(
                "a role assignment must carry at least one available role",
            ));
        }
        if !self.available_roles.contains(&self.current_role) {
            return Err(SwitchError::validation(format!(
                "current role {} is not among the available roles",
                self.current_role
            )));
        }
        Ok(())
    }
}
