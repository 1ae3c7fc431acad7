//! Mandate failure taxonomy

use crate::lifecycle::MandateEvent;
use crate::mandate::MandateStatus;
use gesta_core::{MandateId, Transient, UserId};

/// Why a mandate operation failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MandateError {
    /// A live mandate already exists for this (owner, agency, scope)
    #[error("a live mandate already exists between owner {owner_id} and agency {agency_id} for this scope")]
    DuplicateMandate { owner_id: UserId, agency_id: UserId },

    /// The event is not legal from the mandate's current status
    #[error("cannot {event} a {status} mandate")]
    Conflict {
        status: MandateStatus,
        event: MandateEvent,
    },

    /// The actor is not permitted to trigger this event
    #[error("this actor is not permitted to {event} the mandate")]
    Unauthorized { event: MandateEvent },

    /// No mandate with this id exists
    #[error("mandate {mandate_id} not found")]
    NotFound { mandate_id: MandateId },

    /// The request was malformed
    #[error("invalid mandate request: {message}")]
    Validation { message: String },

    /// Storage backend failure, already retried by the bounded retry policy
    #[error("storage failure: {message}")]
    Database { message: String },
}

impl MandateError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

impl Transient for MandateError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Database { .. })
    }
}
