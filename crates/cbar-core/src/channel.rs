//! CommandChannel trait - the boundary to the radio/modem command set

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{BarringCategory, Password};
use crate::outcome::RawResponse;

/// Transport-level failure carried inside a [`RawResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Radio not available")]
    RadioNotAvailable,

    #[error("Facility not supported: {0}")]
    UnsupportedFacility(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection closed")]
    ConnectionClosed,
}

/// A single request to the command channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRequest {
    Query {
        category: BarringCategory,
    },
    Set {
        category: BarringCategory,
        enable: bool,
        password: Password,
    },
    ChangePassword {
        category: BarringCategory,
        old: Password,
        new: Password,
    },
}

impl ChannelRequest {
    /// Category the request targets
    pub fn category(&self) -> BarringCategory {
        match self {
            ChannelRequest::Query { category }
            | ChannelRequest::Set { category, .. }
            | ChannelRequest::ChangePassword { category, .. } => *category,
        }
    }
}

/// Asynchronous, fallible command channel to the network
///
/// Every call completes exactly once with a [`RawResponse`]; failures are
/// reported inside the response rather than as `Err` so the classifier sees
/// exactly what the channel delivered. Implementations handle one request at
/// a time from a session.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Interrogate the status of one barring category
    async fn query_barring_status(&self, category: BarringCategory) -> RawResponse;

    /// Activate or deactivate a barring category
    async fn set_barring_status(
        &self,
        category: BarringCategory,
        enable: bool,
        password: &Password,
    ) -> RawResponse;

    /// Change the barring password
    async fn change_password(
        &self,
        category: BarringCategory,
        old: &Password,
        new: &Password,
    ) -> RawResponse;

    /// Device-level radio availability (false in airplane mode)
    async fn radio_available(&self) -> bool;

    /// Dispatch a [`ChannelRequest`] to the matching call
    async fn execute(&self, request: &ChannelRequest) -> RawResponse {
        match request {
            ChannelRequest::Query { category } => self.query_barring_status(*category).await,
            ChannelRequest::Set {
                category,
                enable,
                password,
            } => self.set_barring_status(*category, *enable, password).await,
            ChannelRequest::ChangePassword { category, old, new } => {
                self.change_password(*category, old, new).await
            }
        }
    }
}
