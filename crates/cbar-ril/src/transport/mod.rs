//! Command channel transports
//!
//! This module provides the channel adapters a session can talk to:
//! - Mock adapter simulating a network's barring service (demos, tests)
//!
//! # Example
//!
//! ```ignore
//! use cbar_ril::{create_channel, ChannelConfig};
//!
//! let channel = create_channel(&ChannelConfig::default())?;
//! let raw = channel.query_barring_status(BarringCategory::IncomingAll).await;
//! ```

pub mod mock;

use std::sync::Arc;

use cbar_core::CommandChannel;

use crate::config::{ChannelConfig, ConfigError};

/// Create a command channel based on configuration
pub fn create_channel(config: &ChannelConfig) -> Result<Arc<dyn CommandChannel>, ConfigError> {
    match config {
        ChannelConfig::Mock(cfg) => {
            let channel = mock::MockChannel::new(cfg)?;
            Ok(Arc::new(channel))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockConfig;

    #[tokio::test]
    async fn test_create_mock_channel() {
        let channel = create_channel(&ChannelConfig::Mock(MockConfig::default())).unwrap();
        assert!(channel.radio_available().await);
    }

    #[test]
    fn test_create_rejects_invalid_config() {
        let config = ChannelConfig::Mock(MockConfig {
            active: vec!["ZZ".into()],
            ..Default::default()
        });
        assert!(matches!(
            create_channel(&config),
            Err(ConfigError::UnknownFacility(_))
        ));
    }
}
