//! Configuration management for Tagcast
//!
//! Every field has a default, so the config file is optional. Values that
//! describe the single polling target (site, tags, hashtag) live here rather
//! than in code so the same binary can follow a different tag.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::logging::LogFormat;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub publish: PublishConfig,
    pub supervisor: SupervisorConfig,
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search endpoint URL
    pub endpoint: String,
    /// Stack Exchange site parameter
    pub site: String,
    /// Tags to search for; joined with `;` on the wire
    pub tags: Vec<String>,
    /// Hashtag appended to every message, without the leading `#`
    pub hashtag: String,
    /// How far before process start the initial watermark sits
    pub lookback_secs: u64,
    /// Widest window a single search may cover
    pub max_window_secs: u64,
    /// Throttle waits at or above this are treated as bogus and ignored
    pub throttle_ceiling_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.stackexchange.com/2.1/search".to_string(),
            site: "stackoverflow".to_string(),
            tags: vec!["neo4j".to_string(), "cypher".to_string()],
            hashtag: "neo4j".to_string(),
            lookback_secs: 60 * 60,
            max_window_secs: 60 * 60 * 24,
            throttle_ceiling_secs: 100_000,
            request_timeout_secs: 30,
        }
    }
}

impl SearchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Status update endpoint URL
    pub endpoint: String,
    /// Pause after each publish attempt
    pub post_delay_secs: u64,
    /// Pause between fetch cycles
    pub poll_interval_secs: u64,
    pub delivery: DeliveryMode,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.twitter.com/1.1/statuses/update.json".to_string(),
            post_delay_secs: 10,
            poll_interval_secs: 5 * 60,
            delivery: DeliveryMode::AtMostOnce,
        }
    }
}

impl PublishConfig {
    pub fn post_delay(&self) -> Duration {
        Duration::from_secs(self.post_delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// What happens to a message whose publish attempt failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Mark the message as posted anyway; a flaky downstream never causes
    /// duplicate posts, at the cost of occasionally dropping one.
    #[default]
    AtMostOnce,
    /// Leave the message unmarked so the next cycle tries it again.
    RetryOnFailure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Wait before restarting a crashed loop
    pub restart_delay_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            restart_delay_secs: 10 * 60,
        }
    }
}

impl SupervisorConfig {
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }
}

/// `[log]` section; CLI flags and `TAGCAST_LOG_*` override it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// `EnvFilter` level or directive string
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, or from the default location
    ///
    /// A missing file at the default location yields the built-in defaults.
    /// A missing file at an explicit path (argument or `TAGCAST_CONFIG`) is an
    /// error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        if let Ok(path) = std::env::var("TAGCAST_CONFIG") {
            let path = PathBuf::from(shellexpand::tilde(&path).to_string());
            return Self::load_from_path(&path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.search.tags.is_empty() {
            return Err(ConfigError::MissingField("search.tags".to_string()).into());
        }
        if self.search.site.trim().is_empty() {
            return Err(ConfigError::MissingField("search.site".to_string()).into());
        }
        Ok(())
    }
}

/// Resolve the default configuration file path following XDG Base Directory spec
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tagcast").join("config.toml"))
}
