//! The delegation contract between an owner and an agency

use crate::error::MandateError;
use chrono::{DateTime, Utc};
use gesta_core::{MandateId, PermissionSet, PropertyId, UserId};
use serde::{Deserialize, Serialize};

/// What part of the owner's portfolio the mandate covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MandateScope {
    /// Every property the owner holds now or acquires later
    Portfolio,
    /// One specific property
    Property(PropertyId),
}

/// How often the agency bills the owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingFrequency {
    Monthly,
    Quarterly,
    Annually,
}

/// The agency's remuneration: a commission rate, a fixed fee, or both.
///
/// The commission is stored in basis points and the fee in cents to keep
/// the arithmetic exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compensation {
    pub commission_bps: Option<u32>,
    pub fixed_fee_cents: Option<u64>,
    pub billing: BillingFrequency,
}

impl Compensation {
    pub fn commission(bps: u32, billing: BillingFrequency) -> Self {
        Self {
            commission_bps: Some(bps),
            fixed_fee_cents: None,
            billing,
        }
    }

    pub fn fixed_fee(cents: u64, billing: BillingFrequency) -> Self {
        Self {
            commission_bps: None,
            fixed_fee_cents: Some(cents),
            billing,
        }
    }

    /// At least one amount must be present
    pub fn validate(&self) -> Result<(), MandateError> {
        if self.commission_bps.is_none() && self.fixed_fee_cents.is_none() {
            return Err(MandateError::validation(
                "compensation requires a commission rate or a fixed fee",
            ));
        }
        Ok(())
    }
}

/// Lifecycle status of a mandate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MandateStatus {
    /// Created by the owner, awaiting the agency's acceptance
    Pending,
    /// Accepted; contributes to permission resolution
    Active,
    /// Paused by the agency; contributes nothing until terminated
    Suspended,
    /// Ended by either party or refused; absorbing
    Terminated,
    /// End date passed; absorbing
    Expired,
}

impl MandateStatus {
    /// Terminated and Expired accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated | Self::Expired)
    }

    /// A live mandate occupies the (owner, agency, scope) slot
    pub fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::Active | Self::Suspended)
    }
}

impl std::fmt::Display for MandateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Terminated => "terminated",
            Self::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// Who ended the mandate, when, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationRecord {
    pub actor_id: Option<UserId>,
    pub at: DateTime<Utc>,
    pub reason: String,
}

/// A delegation contract granting an agency a permission set over an
/// owner's property or portfolio.
///
/// Mutated only through the lifecycle service; at most one live mandate
/// may exist per (owner, agency, scope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mandate {
    pub id: MandateId,
    pub owner_id: UserId,
    pub agency_id: UserId,
    pub scope: MandateScope,
    pub permissions: PermissionSet,
    pub compensation: Compensation,
    pub status: MandateStatus,
    pub created_at: DateTime<Utc>,
    /// Stamped when the agency accepts
    pub accepted_at: Option<DateTime<Utc>>,
    /// When the contract runs out, if it has a fixed term
    pub end_date: Option<DateTime<Utc>>,
    /// Stamped on terminate or refuse
    pub termination: Option<TerminationRecord>,
}

impl Mandate {
    /// Build a new pending mandate.
    ///
    /// Fails with `Validation` if owner and agency are the same identity or
    /// the compensation carries no amount.
    pub fn pending(
        owner_id: UserId,
        agency_id: UserId,
        scope: MandateScope,
        permissions: PermissionSet,
        compensation: Compensation,
        end_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, MandateError> {
        if owner_id == agency_id {
            return Err(MandateError::validation(
                "a mandate requires two distinct identities",
            ));
        }
        compensation.validate()?;
        Ok(Self {
            id: MandateId::new(),
            owner_id,
            agency_id,
            scope,
            permissions,
            compensation,
            status: MandateStatus::Pending,
            created_at: now,
            accepted_at: None,
            end_date,
            termination: None,
        })
    }

    /// Whether the contract's fixed term has run out as of `now`
    pub fn is_past_end(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| now >= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    #[test]
    fn pending_mandate_starts_unaccepted() {
        let now = Utc::now();
        let mandate = Mandate::pending(
            UserId::new(),
            UserId::new(),
            MandateScope::Portfolio,
            PermissionSet::full(),
            Compensation::commission(700, BillingFrequency::Monthly),
            None,
            now,
        )
        .unwrap();
        assert_eq!(mandate.status, MandateStatus::Pending);
        assert_eq!(mandate.accepted_at, None);
        assert_eq!(mandate.termination, None);
        assert!(!mandate.is_past_end(now + Duration::days(365)));
    }

    #[test]
    fn owner_cannot_mandate_themselves() {
        let id = UserId::new();
        let result = Mandate::pending(
            id,
            id,
            MandateScope::Portfolio,
            PermissionSet::full(),
            Compensation::commission(700, BillingFrequency::Monthly),
            None,
            Utc::now(),
        );
        assert_matches!(result, Err(MandateError::Validation { .. }));
    }

    #[test]
    fn compensation_needs_at_least_one_amount() {
        let empty = Compensation {
            commission_bps: None,
            fixed_fee_cents: None,
            billing: BillingFrequency::Quarterly,
        };
        assert_matches!(empty.validate(), Err(MandateError::Validation { .. }));

        let both = Compensation {
            commission_bps: Some(500),
            fixed_fee_cents: Some(20_000),
            billing: BillingFrequency::Monthly,
        };
        assert!(both.validate().is_ok());
    }

    #[test]
    fn end_date_comparison_is_inclusive() {
        let now = Utc::now();
        let mandate = Mandate::pending(
            UserId::new(),
            UserId::new(),
            MandateScope::Portfolio,
            PermissionSet::full(),
            Compensation::fixed_fee(10_000, BillingFrequency::Annually),
            Some(now + Duration::days(30)),
            now,
        )
        .unwrap();
        assert!(!mandate.is_past_end(now + Duration::days(29)));
        assert!(mandate.is_past_end(now + Duration::days(30)));
    }

    #[test]
    fn live_and_terminal_statuses_partition() {
        for status in [
            MandateStatus::Pending,
            MandateStatus::Active,
            MandateStatus::Suspended,
            MandateStatus::Terminated,
            MandateStatus::Expired,
        ] {
            assert_ne!(status.is_live(), status.is_terminal());
        }
    }
}
