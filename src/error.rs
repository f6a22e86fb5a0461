//! Error types
//!
//! The simulation itself never fails at runtime; these cover loading
//! configuration and driving a session through an illegal transition.

use thiserror::Error;

use crate::sim::SessionPhase;

/// Errors produced while loading or validating [`crate::Settings`]
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl SettingsError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SettingsError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors produced by session lifecycle misuse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Sessions only move Idle -> Running -> Ended; a new session is needed to replay
    #[error("cannot {action} a session that is {from:?}")]
    InvalidTransition {
        from: SessionPhase,
        action: &'static str,
    },
}
