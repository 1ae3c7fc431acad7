//! Effective permission resolution
//!
//! A pure function from an agency's mandates to the permission set that
//! applies on one property. Precedence is explicit rather than an accident
//! of query ordering: a property-scoped mandate overrides a portfolio-wide
//! one, and the winning mandate's record is returned verbatim so the grant
//! stays auditable to a single contract. Flags are never unioned across
//! mandates.

use crate::mandate::{Mandate, MandateScope, MandateStatus};
use chrono::{DateTime, Utc};
use gesta_core::{MandateId, PermissionSet, PropertyId, UserId};

/// Outcome of resolving permissions for one (agency, property, owner)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one mandate's permissions apply
    Granted {
        permissions: PermissionSet,
        /// The contract the grant is auditable to
        mandate_id: MandateId,
    },
    /// No active mandate covers this property
    Denied,
}

impl Resolution {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

/// Compute the effective permissions `agency_id` holds on `property_id`,
/// owned by `owner_id`, given that agency's mandates.
///
/// Only active mandates whose end date has not passed contribute; a
/// suspended or pending mandate never does, even if it would otherwise
/// match. When both a portfolio and a property-scoped mandate apply, the
/// property-scoped one wins.
pub fn resolve(
    agency_id: UserId,
    property_id: PropertyId,
    owner_id: UserId,
    mandates: &[Mandate],
    now: DateTime<Utc>,
) -> Resolution {
    let mut portfolio: Option<&Mandate> = None;
    let mut specific: Option<&Mandate> = None;

    for mandate in mandates {
        if mandate.agency_id != agency_id
            || mandate.owner_id != owner_id
            || mandate.status != MandateStatus::Active
            || mandate.is_past_end(now)
        {
            continue;
        }
        match mandate.scope {
            MandateScope::Portfolio => portfolio = Some(mandate),
            MandateScope::Property(p) if p == property_id => specific = Some(mandate),
            MandateScope::Property(_) => {}
        }
    }

    match specific.or(portfolio) {
        Some(mandate) => Resolution::Granted {
            permissions: mandate.permissions,
            mandate_id: mandate.id,
        },
        None => Resolution::Denied,
    }
}
