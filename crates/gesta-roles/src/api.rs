//! Wire envelope for the role switch entry point
//!
//! The shape consumed by the display layer:
//! `{ "success": true, "data": { ... } }` on success,
//! `{ "success": false, "error": { "type": ..., "message": ..., "retry_after_secs"? } }`
//! on failure. Waits are reported in whole seconds so callers can render
//! countdowns without re-deriving the cooldown math.

use crate::error::SwitchError;
use crate::service::SwitchOutcome;
use chrono::{DateTime, Utc};
use gesta_core::Role;
use serde::{Deserialize, Serialize};

/// A switch request body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRequest {
    pub target_role: Role,
}

/// Success payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchData {
    pub previous_role: Role,
    pub new_role: Role,
    pub remaining_switches: u32,
    pub next_reset_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_end_time: Option<DateTime<Utc>>,
}

/// Machine-usable failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchErrorKind {
    Cooldown,
    DailyLimit,
    InvalidRole,
    NotAuthenticated,
    ValidationFailed,
    DatabaseError,
}

/// Failure payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchErrorBody {
    #[serde(rename = "type")]
    pub kind: SwitchErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<i64>,
}

/// Full response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SwitchData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SwitchErrorBody>,
}

impl From<SwitchOutcome> for SwitchResponse {
    fn from(outcome: SwitchOutcome) -> Self {
        let data = match outcome {
            SwitchOutcome::Switched(receipt) => SwitchData {
                previous_role: receipt.previous_role,
                new_role: receipt.new_role,
                remaining_switches: receipt.remaining_switches,
                next_reset_time: receipt.next_reset,
                cooldown_end_time: Some(receipt.cooldown_until),
            },
            SwitchOutcome::AlreadyActive {
                role,
                remaining_switches,
                next_reset,
                cooldown_until,
            } => SwitchData {
                previous_role: role,
                new_role: role,
                remaining_switches,
                next_reset_time: next_reset,
                cooldown_end_time: cooldown_until,
            },
        };
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl From<&SwitchError> for SwitchResponse {
    fn from(err: &SwitchError) -> Self {
        let kind = match err {
            SwitchError::Cooldown { .. } => SwitchErrorKind::Cooldown,
            SwitchError::DailyLimit { .. } => SwitchErrorKind::DailyLimit,
            SwitchError::InvalidRole { .. } => SwitchErrorKind::InvalidRole,
            SwitchError::NotAuthenticated => SwitchErrorKind::NotAuthenticated,
            SwitchError::Validation { .. } => SwitchErrorKind::ValidationFailed,
            SwitchError::Database { .. } => SwitchErrorKind::DatabaseError,
        };
        Self {
            success: false,
            data: None,
            error: Some(SwitchErrorBody {
                kind,
                message: err.to_string(),
                retry_after_secs: err.retry_after().map(|d| d.num_seconds()),
            }),
        }
    }
}
