//! Configuration file handling for cbar-cli

use anyhow::{Context, Result};
use cbar_ril::ChannelConfig;
use cbar_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
    /// Default session snapshot file
    pub state: Option<PathBuf>,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("cbar-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        output: Option<&str>,
        state: Option<&Path>,
        timeout_ms: Option<u64>,
        no_color: bool,
    ) -> MergedConfig {
        let mut session = self.session.clone();
        if let Some(ms) = timeout_ms {
            session.command_timeout_ms = ms;
        }
        MergedConfig {
            output: output
                .map(String::from)
                .or_else(|| self.output.clone())
                .unwrap_or_else(|| "table".to_string()),
            no_color: no_color || self.no_color.unwrap_or(false),
            state: state.map(Path::to_path_buf).or_else(|| self.state.clone()),
            session,
            channel: self.channel.clone(),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub output: String,
    pub no_color: bool,
    pub state: Option<PathBuf>,
    pub session: SessionConfig,
    pub channel: ChannelConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            output = "json"

            [session]
            command_timeout_ms = 2500

            [channel]
            type = "mock"
            latency_ms = 20
            password = "4321"
            active = ["OI", "AI"]
            "#,
        )
        .unwrap();

        assert_eq!(config.output.as_deref(), Some("json"));
        assert_eq!(config.session.command_timeout_ms, 2500);
        let ChannelConfig::Mock(mock) = &config.channel;
        assert_eq!(mock.password, "4321");
        assert_eq!(mock.active, vec!["OI".to_string(), "AI".to_string()]);
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.session.command_timeout_ms, 10_000);
        assert!(matches!(config.channel, ChannelConfig::Mock(_)));
    }

    #[test]
    fn test_args_override_file() {
        let config = Config {
            output: Some("json".into()),
            state: Some(PathBuf::from("/tmp/a.json")),
            ..Default::default()
        };
        let merged =
            config.merge_with_args(Some("table"), Some(Path::new("b.json")), Some(0), false);
        assert_eq!(merged.output, "table");
        assert_eq!(merged.state, Some(PathBuf::from("b.json")));
        assert_eq!(merged.session.command_timeout(), None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "no_color = true").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.no_color, Some(true));
    }
}
