//! # Gesta Core
//!
//! Shared vocabulary for the Gesta platform: typed identifiers, the closed
//! role and capability sets, calendar-day boundary math in the platform's
//! reference timezone, the bounded retry policy for transient storage
//! failures, and the optimistic update coordinator consumed by callers that
//! want a responsive local view while an authoritative call is in flight.
//!
//! Everything in this crate is either a plain data type or a pure function
//! of its inputs; no module here touches storage or the wall clock on its
//! own.

pub mod identifiers;
pub mod optimistic;
pub mod permissions;
pub mod retry;
pub mod role;
pub mod time;

pub use identifiers::{MandateId, PropertyId, UserId};
pub use optimistic::{OptimisticCoordinator, OptimisticError, OptimisticOp};
pub use permissions::{Capability, PermissionSet};
pub use retry::{RetryPolicy, Transient};
pub use role::Role;
