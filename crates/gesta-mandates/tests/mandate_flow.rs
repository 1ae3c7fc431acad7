//! End-to-end mandate flows against the in-memory store

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, TimeZone, Utc};
use gesta_core::{Capability, PermissionSet, PropertyId, Role, UserId};
use gesta_mandates::{
    check_permission, resolve, AccessDecision, AuthorizationService, BillingFrequency,
    Compensation, MandateError, MandateEvent, MandateLifecycle, MandateScope, MandateStatus,
    MandateStore, MemoryMandateStore, Resolution, TransitionActor,
};
use std::sync::Arc;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).single().unwrap()
}

fn compensation() -> Compensation {
    Compensation::commission(700, BillingFrequency::Monthly)
}

struct Setup {
    store: Arc<MemoryMandateStore>,
    lifecycle: MandateLifecycle<MemoryMandateStore>,
    owner: UserId,
    agency: UserId,
}

fn setup() -> Setup {
    let store = Arc::new(MemoryMandateStore::new());
    Setup {
        lifecycle: MandateLifecycle::new(Arc::clone(&store)),
        store,
        owner: UserId::new(),
        agency: UserId::new(),
    }
}

#[tokio::test]
async fn accepted_mandate_grants_permissions() {
    let now = fixed_now();
    let s = setup();
    let property = PropertyId::new();

    let mandate = s
        .lifecycle
        .create_mandate(
            s.owner,
            s.agency,
            MandateScope::Portfolio,
            PermissionSet::full(),
            compensation(),
            None,
            now,
        )
        .await
        .unwrap();

    // pending mandates grant nothing
    let service = AuthorizationService::new(Arc::clone(&s.store));
    let decision = service
        .check_permission_at(
            Role::Agency,
            s.agency,
            property,
            s.owner,
            Capability::EditProperties,
            now,
        )
        .await
        .unwrap();
    assert_eq!(decision, AccessDecision::Deny);

    let accepted = s
        .lifecycle
        .transition(
            mandate.id,
            MandateEvent::Accept,
            TransitionActor::Agency(s.agency),
            None,
            now + Duration::hours(1),
        )
        .await
        .unwrap();
    assert_eq!(accepted.status, MandateStatus::Active);
    assert_eq!(accepted.accepted_at, Some(now + Duration::hours(1)));

    let decision = service
        .check_permission_at(
            Role::Agency,
            s.agency,
            property,
            s.owner,
            Capability::EditProperties,
            now + Duration::hours(2),
        )
        .await
        .unwrap();
    assert_eq!(
        decision,
        AccessDecision::Allow {
            mandate_id: mandate.id
        }
    );
}

#[tokio::test]
async fn specific_mandate_narrows_a_portfolio_grant() {
    // Portfolio-wide edit rights, then a property-scoped contract with
    // edits withheld: the specific contract governs that property.
    let now = fixed_now();
    let s = setup();
    let property = PropertyId::new();

    let portfolio = s
        .lifecycle
        .create_mandate(
            s.owner,
            s.agency,
            MandateScope::Portfolio,
            PermissionSet {
                can_edit_properties: true,
                ..PermissionSet::read_only()
            },
            compensation(),
            None,
            now,
        )
        .await
        .unwrap();
    let specific = s
        .lifecycle
        .create_mandate(
            s.owner,
            s.agency,
            MandateScope::Property(property),
            PermissionSet::read_only(),
            compensation(),
            None,
            now,
        )
        .await
        .unwrap();
    for id in [portfolio.id, specific.id] {
        s.lifecycle
            .transition(
                id,
                MandateEvent::Accept,
                TransitionActor::Agency(s.agency),
                None,
                now,
            )
            .await
            .unwrap();
    }

    let mandates = s.store.for_agency(s.agency).await.unwrap();
    let resolution = resolve(s.agency, property, s.owner, &mandates, now);
    assert_eq!(
        resolution,
        Resolution::Granted {
            permissions: PermissionSet::read_only(),
            mandate_id: specific.id,
        }
    );
    assert_eq!(
        check_permission(
            Role::Agency,
            s.agency,
            property,
            s.owner,
            Capability::EditProperties,
            &mandates,
            now,
        ),
        AccessDecision::Deny
    );
    // the portfolio grant still covers the owner's other properties
    assert!(check_permission(
        Role::Agency,
        s.agency,
        PropertyId::new(),
        s.owner,
        Capability::EditProperties,
        &mandates,
        now,
    )
    .is_allowed());
}

#[tokio::test]
async fn suspending_a_pending_mandate_is_a_conflict() {
    let now = fixed_now();
    let s = setup();
    let mandate = s
        .lifecycle
        .create_mandate(
            s.owner,
            s.agency,
            MandateScope::Portfolio,
            PermissionSet::full(),
            compensation(),
            None,
            now,
        )
        .await
        .unwrap();

    let result = s
        .lifecycle
        .transition(
            mandate.id,
            MandateEvent::Suspend,
            TransitionActor::Agency(s.agency),
            None,
            now,
        )
        .await;
    assert_eq!(
        result,
        Err(MandateError::Conflict {
            status: MandateStatus::Pending,
            event: MandateEvent::Suspend,
        })
    );
}

#[tokio::test]
async fn only_the_named_agency_may_accept_or_suspend() {
    let now = fixed_now();
    let s = setup();
    let mandate = s
        .lifecycle
        .create_mandate(
            s.owner,
            s.agency,
            MandateScope::Portfolio,
            PermissionSet::full(),
            compensation(),
            None,
            now,
        )
        .await
        .unwrap();

    // the owner cannot accept on the agency's behalf
    assert_eq!(
        s.lifecycle
            .transition(
                mandate.id,
                MandateEvent::Accept,
                TransitionActor::Owner(s.owner),
                None,
                now,
            )
            .await,
        Err(MandateError::Unauthorized {
            event: MandateEvent::Accept
        })
    );
    // neither can some other agency
    assert_eq!(
        s.lifecycle
            .transition(
                mandate.id,
                MandateEvent::Accept,
                TransitionActor::Agency(UserId::new()),
                None,
                now,
            )
            .await,
        Err(MandateError::Unauthorized {
            event: MandateEvent::Accept
        })
    );
}

#[tokio::test]
async fn termination_requires_a_reason_and_records_the_actor() {
    let now = fixed_now();
    let s = setup();
    let mandate = s
        .lifecycle
        .create_mandate(
            s.owner,
            s.agency,
            MandateScope::Portfolio,
            PermissionSet::full(),
            compensation(),
            None,
            now,
        )
        .await
        .unwrap();

    assert_matches!(
        s.lifecycle
            .transition(
                mandate.id,
                MandateEvent::Terminate,
                TransitionActor::Owner(s.owner),
                None,
                now,
            )
            .await,
        Err(MandateError::Validation { .. })
    );

    let terminated = s
        .lifecycle
        .transition(
            mandate.id,
            MandateEvent::Terminate,
            TransitionActor::Owner(s.owner),
            Some("switching to self-management"),
            now,
        )
        .await
        .unwrap();
    assert_eq!(terminated.status, MandateStatus::Terminated);
    let record = terminated.termination.unwrap();
    assert_eq!(record.actor_id, Some(s.owner));
    assert_eq!(record.reason, "switching to self-management");

    // absorbing: nothing moves a terminated mandate
    assert_matches!(
        s.lifecycle
            .transition(
                mandate.id,
                MandateEvent::Accept,
                TransitionActor::Agency(s.agency),
                None,
                now,
            )
            .await,
        Err(MandateError::Conflict { .. })
    );
}

#[tokio::test]
async fn duplicate_live_delegation_is_rejected_until_the_first_ends() {
    let now = fixed_now();
    let s = setup();
    let first = s
        .lifecycle
        .create_mandate(
            s.owner,
            s.agency,
            MandateScope::Portfolio,
            PermissionSet::full(),
            compensation(),
            None,
            now,
        )
        .await
        .unwrap();

    assert_matches!(
        s.lifecycle
            .create_mandate(
                s.owner,
                s.agency,
                MandateScope::Portfolio,
                PermissionSet::read_only(),
                compensation(),
                None,
                now,
            )
            .await,
        Err(MandateError::DuplicateMandate { .. })
    );

    s.lifecycle
        .transition(
            first.id,
            MandateEvent::Refuse,
            TransitionActor::Agency(s.agency),
            Some("portfolio too small"),
            now,
        )
        .await
        .unwrap();

    // the slot is free again
    s.lifecycle
        .create_mandate(
            s.owner,
            s.agency,
            MandateScope::Portfolio,
            PermissionSet::read_only(),
            compensation(),
            None,
            now,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn racing_accept_and_refuse_cannot_both_succeed() {
    let now = fixed_now();
    let s = setup();
    let mandate = s
        .lifecycle
        .create_mandate(
            s.owner,
            s.agency,
            MandateScope::Portfolio,
            PermissionSet::full(),
            compensation(),
            None,
            now,
        )
        .await
        .unwrap();

    let lifecycle = Arc::new(MandateLifecycle::new(Arc::clone(&s.store)));
    let accept = {
        let lifecycle = Arc::clone(&lifecycle);
        let agency = s.agency;
        let id = mandate.id;
        tokio::spawn(async move {
            lifecycle
                .transition(id, MandateEvent::Accept, TransitionActor::Agency(agency), None, now)
                .await
        })
    };
    let refuse = {
        let lifecycle = Arc::clone(&lifecycle);
        let agency = s.agency;
        let id = mandate.id;
        tokio::spawn(async move {
            lifecycle
                .transition(
                    id,
                    MandateEvent::Refuse,
                    TransitionActor::Agency(agency),
                    Some("changed our mind"),
                    now,
                )
                .await
        })
    };

    let results = [accept.await.unwrap(), refuse.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(MandateError::Conflict { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);

    let final_status = s.store.get(mandate.id).await.unwrap().unwrap().status;
    assert!(matches!(
        final_status,
        MandateStatus::Active | MandateStatus::Terminated
    ));
}

#[tokio::test]
async fn expiry_sweep_only_touches_overdue_active_mandates() {
    let now = fixed_now();
    let s = setup();
    let property = PropertyId::new();

    let expiring = s
        .lifecycle
        .create_mandate(
            s.owner,
            s.agency,
            MandateScope::Property(property),
            PermissionSet::full(),
            compensation(),
            Some(now + Duration::days(30)),
            now,
        )
        .await
        .unwrap();
    let open_ended = s
        .lifecycle
        .create_mandate(
            s.owner,
            s.agency,
            MandateScope::Portfolio,
            PermissionSet::full(),
            compensation(),
            None,
            now,
        )
        .await
        .unwrap();
    for id in [expiring.id, open_ended.id] {
        s.lifecycle
            .transition(id, MandateEvent::Accept, TransitionActor::Agency(s.agency), None, now)
            .await
            .unwrap();
    }

    // before the end date the sweep is a no-op
    assert!(s
        .lifecycle
        .expire_overdue(now + Duration::days(29))
        .await
        .unwrap()
        .is_empty());

    let later = now + Duration::days(31);
    // even before any sweep runs, the resolver already ignores the overdue
    // contract
    let mandates = s.store.for_agency(s.agency).await.unwrap();
    assert_eq!(
        resolve(s.agency, property, s.owner, &mandates, later),
        Resolution::Granted {
            permissions: open_ended.permissions,
            mandate_id: open_ended.id,
        }
    );

    let expired = s.lifecycle.expire_overdue(later).await.unwrap();
    assert_eq!(expired, vec![expiring.id]);
    assert_eq!(
        s.store.get(expiring.id).await.unwrap().unwrap().status,
        MandateStatus::Expired
    );
    assert_eq!(
        s.store.get(open_ended.id).await.unwrap().unwrap().status,
        MandateStatus::Active
    );

    // expiry cannot be forced by a party
    assert_matches!(
        s.lifecycle
            .transition(
                open_ended.id,
                MandateEvent::Expire,
                TransitionActor::Agency(s.agency),
                None,
                later,
            )
            .await,
        Err(MandateError::Unauthorized { .. })
    );
}
