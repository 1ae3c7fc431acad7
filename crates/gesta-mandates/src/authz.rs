//! Authorization entry point for the data-access layer
//!
//! The listing/messaging/payment layers ask exactly one question: may this
//! actor, acting as this role, perform this capability on this property?
//! The answer comes from the pure resolver over the agency's mandates.

use crate::error::MandateError;
use crate::resolver::{resolve, Resolution};
use crate::store::MandateStore;
use chrono::{DateTime, Utc};
use gesta_core::{Capability, MandateId, PropertyId, RetryPolicy, Role, UserId};
use std::sync::Arc;

/// Answer to a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Allowed under this mandate
    Allow { mandate_id: MandateId },
    Deny,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// Pure capability check over an already-fetched mandate set.
///
/// Only an actor acting as agency resolves through mandates; any other
/// acting role is denied here and must go through its own ownership checks
/// in the calling layer.
pub fn check_permission(
    acting_role: Role,
    agency_id: UserId,
    property_id: PropertyId,
    owner_id: UserId,
    capability: Capability,
    mandates: &[crate::mandate::Mandate],
    now: DateTime<Utc>,
) -> AccessDecision {
    if acting_role != Role::Agency {
        return AccessDecision::Deny;
    }
    match resolve(agency_id, property_id, owner_id, mandates, now) {
        Resolution::Granted {
            permissions,
            mandate_id,
        } if permissions.allows(capability) => AccessDecision::Allow { mandate_id },
        _ => AccessDecision::Deny,
    }
}

/// Store-backed wrapper around [`check_permission`]
pub struct AuthorizationService<S> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S: MandateStore> AuthorizationService<S> {
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

    /// Fetch the agency's mandates and apply the capability check at `now`
    pub async fn check_permission_at(
        &self,
        acting_role: Role,
        agency_id: UserId,
        property_id: PropertyId,
        owner_id: UserId,
        capability: Capability,
        now: DateTime<Utc>,
    ) -> Result<AccessDecision, MandateError> {
        let mandates = self.retry.run(|| self.store.for_agency(agency_id)).await?;
        let decision = check_permission(
            acting_role,
            agency_id,
            property_id,
            owner_id,
            capability,
            &mandates,
            now,
        );
        tracing::debug!(
            %agency_id,
            %property_id,
            ?capability,
            allowed = decision.is_allowed(),
            "permission check"
        );
        Ok(decision)
    }

    /// [`Self::check_permission_at`] evaluated at the current instant
    pub async fn check_permission(
        &self,
        acting_role: Role,
        agency_id: UserId,
        property_id: PropertyId,
        owner_id: UserId,
        capability: Capability,
    ) -> Result<AccessDecision, MandateError> {
        self.check_permission_at(
            acting_role,
            agency_id,
            property_id,
            owner_id,
            capability,
            Utc::now(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mandate::{
        BillingFrequency, Compensation, Mandate, MandateScope, MandateStatus,
    };
    use gesta_core::PermissionSet;

    fn active_mandate(owner: UserId, agency: UserId, permissions: PermissionSet) -> Mandate {
        let now = Utc::now();
        let mut m = Mandate::pending(
            owner,
            agency,
            MandateScope::Portfolio,
            permissions,
            Compensation::commission(700, BillingFrequency::Monthly),
            None,
            now,
        )
        .unwrap();
        m.status = MandateStatus::Active;
        m.accepted_at = Some(now);
        m
    }

    #[test]
    fn only_the_agency_role_resolves_through_mandates() {
        let now = Utc::now();
        let (owner, agency, property) = (UserId::new(), UserId::new(), PropertyId::new());
        let mandates = [active_mandate(owner, agency, PermissionSet::full())];

        for role in [Role::Tenant, Role::Owner, Role::TrustedThirdParty] {
            assert_eq!(
                check_permission(
                    role,
                    agency,
                    property,
                    owner,
                    Capability::ViewProperties,
                    &mandates,
                    now,
                ),
                AccessDecision::Deny
            );
        }
        assert!(check_permission(
            Role::Agency,
            agency,
            property,
            owner,
            Capability::ViewProperties,
            &mandates,
            now,
        )
        .is_allowed());
    }

    #[test]
    fn granted_permissions_still_gate_the_capability() {
        let now = Utc::now();
        let (owner, agency, property) = (UserId::new(), UserId::new(), PropertyId::new());
        let mandates = [active_mandate(owner, agency, PermissionSet::read_only())];

        assert!(check_permission(
            Role::Agency,
            agency,
            property,
            owner,
            Capability::ViewFinancials,
            &mandates,
            now,
        )
        .is_allowed());
        assert_eq!(
            check_permission(
                Role::Agency,
                agency,
                property,
                owner,
                Capability::DeleteProperties,
                &mandates,
                now,
            ),
            AccessDecision::Deny
        );
    }

    #[test]
    fn allow_carries_the_granting_mandate() {
        let now = Utc::now();
        let (owner, agency, property) = (UserId::new(), UserId::new(), PropertyId::new());
        let mandate = active_mandate(owner, agency, PermissionSet::full());
        let decision = check_permission(
            Role::Agency,
            agency,
            property,
            owner,
            Capability::CreateLeases,
            std::slice::from_ref(&mandate),
            now,
        );
        assert_eq!(
            decision,
            AccessDecision::Allow {
                mandate_id: mandate.id
            }
        );
    }
}
