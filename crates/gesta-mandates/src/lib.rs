//! # Gesta Mandates
//!
//! Delegation of property management rights from an owner to an agency. A
//! mandate grants a scoped, fine-grained permission set and moves through
//! the lifecycle pending -> active -> suspended/terminated/expired, with
//! each transition restricted to a named actor.
//!
//! The pieces, leaf first:
//!
//! - [`Mandate`] - the delegation contract: parties, scope, permission
//!   record, compensation, status, lifecycle timestamps.
//! - [`MandateStore`] - persistence trait; insertion enforces the
//!   one-live-mandate invariant per (owner, agency, scope) and transitions
//!   are atomic per mandate. [`MemoryMandateStore`] is the in-process
//!   implementation.
//! - [`MandateLifecycle`] - the state machine and its actor checks.
//! - [`resolver`] - the pure function computing effective permissions from
//!   an agency's active mandates, with explicit specific-over-portfolio
//!   precedence.
//! - [`AuthorizationService`] - the `check_permission` entry point the
//!   data-access layer calls.

pub mod authz;
pub mod error;
pub mod lifecycle;
pub mod mandate;
pub mod resolver;
pub mod store;

pub use authz::{check_permission, AccessDecision, AuthorizationService};
pub use error::MandateError;
pub use lifecycle::{MandateEvent, MandateLifecycle, TransitionActor};
pub use mandate::{
    BillingFrequency, Compensation, Mandate, MandateScope, MandateStatus, TerminationRecord,
};
pub use resolver::{resolve, Resolution};
pub use store::{MandateGuard, MandateStore, MemoryMandateStore};
