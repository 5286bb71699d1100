//! Error taxonomy for call barring sessions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for barring operations
pub type BarringResult<T> = Result<T, BarringError>;

/// Errors surfaced to the presentation layer
///
/// The `Display` text is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "cause", rename_all = "snake_case")]
pub enum BarringError {
    /// Transport or command-layer failure reported by the channel
    #[error("Network or SIM error: {0}")]
    Exception(String),

    /// Payload did not match protocol expectations
    #[error("Unexpected response from network")]
    UnexpectedResponse,

    /// Radio is off (airplane mode); detected before any channel call
    #[error("Turn off airplane mode to view call barring settings")]
    RadioOff,

    /// Password length outside the accepted range
    #[error("Invalid password")]
    InvalidPassword,

    /// New password and its confirmation differ
    #[error("Passwords don't match")]
    PasswordMismatch,

    /// Cancel-all requested while no barring is active
    #[error("No call barring active")]
    NothingToCancel,

    /// Another channel request is still in flight
    #[error("Settings are being updated, please wait")]
    Busy,

    /// Selected category does not belong to the selector's direction
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}

impl BarringError {
    /// Whether the error originates from the network side rather than
    /// from local validation
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            BarringError::Exception(_) | BarringError::UnexpectedResponse
        )
    }
}
