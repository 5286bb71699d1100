//! Raw channel responses and their classification

use crate::channel::ChannelError;
use crate::error::BarringError;

/// Payload of a channel response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPayload {
    /// Plain acknowledgement (set / change password)
    None,
    /// Status vector; the first element is 0 (inactive) or 1 (active)
    Status(Vec<i32>),
    /// Application-level error object embedded in an otherwise successful reply
    Error(String),
}

/// Unclassified result delivered by a [`crate::CommandChannel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub exception: Option<ChannelError>,
    pub payload: RawPayload,
}

impl RawResponse {
    pub fn ack() -> Self {
        Self {
            exception: None,
            payload: RawPayload::None,
        }
    }

    pub fn status(enabled: bool) -> Self {
        Self {
            exception: None,
            payload: RawPayload::Status(vec![i32::from(enabled)]),
        }
    }

    pub fn exception(err: ChannelError) -> Self {
        Self {
            exception: Some(err),
            payload: RawPayload::None,
        }
    }

    pub fn embedded_error(msg: impl Into<String>) -> Self {
        Self {
            exception: None,
            payload: RawPayload::Error(msg.into()),
        }
    }
}

/// Classified result of a channel call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Success; `enabled` carries the decoded status for queries
    Ok { enabled: Option<bool> },
    /// Transport or command failure
    Exception(String),
    /// Payload did not match protocol expectations
    UnexpectedResponse,
    /// Radio was off
    RadioOff,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }

    /// Error to surface for a non-`Ok` outcome
    pub fn error(&self) -> Option<BarringError> {
        match self {
            Outcome::Ok { .. } => None,
            Outcome::Exception(cause) => Some(BarringError::Exception(cause.clone())),
            Outcome::UnexpectedResponse => Some(BarringError::UnexpectedResponse),
            Outcome::RadioOff => Some(BarringError::RadioOff),
        }
    }
}

/// Map a raw channel result to an [`Outcome`]
pub fn classify(raw: &RawResponse) -> Outcome {
    if let Some(ref err) = raw.exception {
        return Outcome::Exception(err.to_string());
    }

    match &raw.payload {
        RawPayload::Error(msg) => {
            tracing::debug!(error = %msg, "Embedded error in channel response");
            Outcome::UnexpectedResponse
        }
        RawPayload::Status(values) => match values.first() {
            Some(0) => Outcome::Ok {
                enabled: Some(false),
            },
            Some(1) => Outcome::Ok {
                enabled: Some(true),
            },
            other => {
                tracing::debug!(?other, "Unexpected barring status value");
                Outcome::UnexpectedResponse
            }
        },
        RawPayload::None => Outcome::Ok { enabled: None },
    }
}
