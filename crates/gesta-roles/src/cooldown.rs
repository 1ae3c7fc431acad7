//! Cooldown and daily-quota gate
//!
//! A pure predicate over an assignment and an explicit `now`; it never
//! touches storage or the wall clock, so it can be unit-tested exhaustively
//! and called concurrently without coordination.

use crate::assignment::RoleAssignment;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use gesta_core::time::{next_day_boundary, reference_offset};

/// Why the gate blocked a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The previous switch was less than the cooldown window ago
    Cooldown,
    /// The daily quota is consumed until the reset boundary
    DailyLimit,
}

/// Outcome of evaluating the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchGate {
    /// The switch may proceed
    Allowed {
        /// The switch count after lazy reset (0 if the boundary was crossed)
        effective_count: u32,
        /// The boundary to store: rolled forward if `now` crossed it
        reset_boundary: DateTime<Utc>,
    },
    /// The switch must wait
    Blocked {
        reason: BlockReason,
        /// How long until a retry can succeed
        retry_after: Duration,
    },
}

/// Fixed switch-throttling policy: cooldown window, daily quota, and the
/// reference timezone for the daily boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    /// Minimum elapsed time between two successful switches
    pub cooldown_window: Duration,
    /// Maximum successful switches per calendar day
    pub daily_quota: u32,
    /// Timezone whose midnight defines the reset boundary
    pub reference: FixedOffset,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            cooldown_window: Duration::minutes(15),
            daily_quota: 3,
            reference: reference_offset(),
        }
    }
}

impl CooldownPolicy {
    /// Decide whether `assignment` may switch at `now`.
    ///
    /// The cooldown gate is checked first: a request inside the window is
    /// rejected as `Cooldown` even when the quota would also block it.
    /// The daily count is reset lazily: once `now` reaches the stored
    /// boundary the count is treated as zero and the boundary rolls to the
    /// next calendar day.
    pub fn evaluate(&self, assignment: &RoleAssignment, now: DateTime<Utc>) -> SwitchGate {
        if let Some(last) = assignment.last_switch_at {
            let elapsed = now - last;
            if elapsed >= Duration::zero() && elapsed < self.cooldown_window {
                return SwitchGate::Blocked {
                    reason: BlockReason::Cooldown,
                    retry_after: self.cooldown_window - elapsed,
                };
            }
        }

        let crossed = now >= assignment.reset_boundary;
        let effective_count = if crossed { 0 } else { assignment.daily_switch_count };

        if effective_count >= self.daily_quota {
            return SwitchGate::Blocked {
                reason: BlockReason::DailyLimit,
                retry_after: assignment.reset_boundary - now,
            };
        }

        let reset_boundary = if crossed {
            next_day_boundary(now, self.reference)
        } else {
            assignment.reset_boundary
        };
        SwitchGate::Allowed {
            effective_count,
            reset_boundary,
        }
    }
}
