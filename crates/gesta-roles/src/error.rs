//! Switch failure taxonomy
//!
//! Every failed switch surfaces exactly one of these variants; raw storage
//! errors never pass through uninterpreted. `Cooldown` and `DailyLimit`
//! carry the machine-usable wait so callers can render countdowns without
//! re-deriving the cooldown math.

use chrono::Duration;
use gesta_core::{Role, Transient};

/// Why a role switch failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwitchError {
    /// The previous switch was too recent; retryable after the wait
    #[error("role switch is cooling down for another {}s", retry_after.num_seconds())]
    Cooldown { retry_after: Duration },

    /// Daily switch quota consumed; retryable after the next reset boundary
    #[error("daily switch limit reached, resets in {}s", retry_after.num_seconds())]
    DailyLimit { retry_after: Duration },

    /// The requested role is not among the user's available roles
    #[error("role {requested} is not available to this user")]
    InvalidRole { requested: Role },

    /// No role assignment exists for the requesting user
    #[error("no role assignment found for this user")]
    NotAuthenticated,

    /// The request was malformed
    #[error("invalid switch request: {message}")]
    Validation { message: String },

    /// Storage backend failure, already retried by the bounded retry policy
    #[error("storage failure: {message}")]
    Database { message: String },
}

impl SwitchError {
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

    /// The wait after which a retry can succeed, for the retryable variants
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Cooldown { retry_after } | Self::DailyLimit { retry_after } => {
                Some(*retry_after)
            }
            _ => None,
        }
    }
}

impl Transient for SwitchError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Database { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_database_errors_are_transient() {
        assert!(SwitchError::database("connection reset").is_transient());
        assert!(!SwitchError::NotAuthenticated.is_transient());
        assert!(!SwitchError::Cooldown {
            retry_after: Duration::minutes(10)
        }
        .is_transient());
    }

    #[test]
    fn retry_after_only_on_wait_variants() {
        let err = SwitchError::DailyLimit {
            retry_after: Duration::hours(2),
        };
        assert_eq!(err.retry_after(), Some(Duration::hours(2)));
        assert_eq!(
            SwitchError::InvalidRole {
                requested: Role::Agency
            }
            .retry_after(),
            None
        );
    }
}
