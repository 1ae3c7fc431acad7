//! # Gesta Roles
//!
//! The role-switch state machine: which role a user is acting as, and when
//! they may change it. A switch passes through a pure cooldown/quota gate
//! and is applied as one atomic read-modify-write per user, so two
//! near-simultaneous requests can never both consume quota.
//!
//! The pieces, leaf first:
//!
//! - [`RoleAssignment`] - the per-user record: available roles, current
//!   role, switch counters, reset boundary.
//! - [`CooldownPolicy`] - pure predicate deciding whether a switch is
//!   allowed right now; never touches storage.
//! - [`RoleAssignmentStore`] - persistence trait with per-user exclusive
//!   handles; [`MemoryRoleStore`] is the in-process implementation.
//! - [`RoleSwitchService`] - orchestrates a switch request end to end and
//!   notifies cache observers after a successful switch.

pub mod api;
pub mod assignment;
pub mod cooldown;
pub mod error;
pub mod service;
pub mod store;

pub use api::SwitchResponse;
pub use assignment::RoleAssignment;
pub use cooldown::{BlockReason, CooldownPolicy, SwitchGate};
pub use error::SwitchError;
pub use service::{RoleSwitchService, RoleViewCache, SwitchOutcome, SwitchReceipt};
pub use store::{AssignmentGuard, MemoryRoleStore, RoleAssignmentStore};
