//! cbar-core - Core traits and types for call barring orchestration
//!
//! This crate provides the fundamental abstractions shared by the channel
//! adapters (`cbar-ril`) and the session state machine (`cbar-session`):
//! the barring data model, the error taxonomy, the `CommandChannel` trait and
//! the response classifier.

pub mod channel;
pub mod error;
pub mod models;
pub mod outcome;

pub use channel::{ChannelError, ChannelRequest, CommandChannel};
pub use error::{BarringError, BarringResult};
pub use models::*;
pub use outcome::{classify, Outcome, RawPayload, RawResponse};
