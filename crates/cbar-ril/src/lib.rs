//! cbar-ril - Command channel adapters for call barring
//!
//! This crate provides the [`CommandChannel`] implementations a session talks
//! to, plus the facility-code mapping and channel configuration.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                BarringSession                │
//! │                      │                       │
//! │            Arc<dyn CommandChannel>           │
//! └──────────────────────┼───────────────────────┘
//!                        │
//!          ┌─────────────┴─────────────┐
//!          │      create_channel()     │
//!          │   (ChannelConfig::Mock)   │
//!          └─────────────┬─────────────┘
//!                        │
//!                 ┌──────┴──────┐
//!                 │ MockChannel │
//!                 │ (simulated  │
//!                 │  network)   │
//!                 └─────────────┘
//! ```

pub mod config;
pub mod facility;
pub mod transport;

pub use config::{ChannelConfig, ConfigError, MockConfig};
pub use facility::{facility_code, from_facility_code};
pub use transport::{create_channel, mock::MockChannel, mock::Scripted};

// Re-export for convenience
pub use cbar_core::{ChannelError, ChannelRequest, CommandChannel, RawPayload, RawResponse};
