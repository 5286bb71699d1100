//! Session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a barring session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Time to wait for a channel reply before synthesizing an exception
    /// (0 waits forever)
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,
}

fn default_command_timeout() -> u64 {
    10_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: default_command_timeout(),
        }
    }
}

impl SessionConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_ms > 0).then(|| Duration::from_millis(self.command_timeout_ms))
    }
}
