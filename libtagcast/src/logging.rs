//! Logging setup for the tagcast binary
//!
//! Format and level come from, in order of precedence: CLI flags, the
//! `TAGCAST_LOG_FORMAT` / `TAGCAST_LOG_LEVEL` environment variables, then the
//! `[log]` section of the config file.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::LogSection;

/// Crates whose debug output drowns the loop's own events
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Plain text without colors, for journald and redirects
    #[default]
    Text,
    /// One JSON object per line
    Json,
    /// Colored multi-line output
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Resolved logging settings for one process
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Merge CLI values, environment and the config file's `[log]` section
    pub fn resolve(format: Option<LogFormat>, verbose: bool, section: &LogSection) -> Self {
        let format = format
            .or_else(|| {
                std::env::var("TAGCAST_LOG_FORMAT")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or(section.format);

        let level = std::env::var("TAGCAST_LOG_LEVEL").unwrap_or_else(|_| section.level.clone());

        Self::new(format, level, verbose)
    }

    /// Filter directives; `--verbose` forces debug, HTTP internals stay at warn
    pub fn directives(&self) -> String {
        let level = if self.verbose { "debug" } else { self.level.as_str() };

        let mut directives = vec![level.to_string()];
        directives.extend(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)));
        directives.join(",")
    }

    /// Install the global subscriber
    ///
    /// # Panics
    ///
    /// Panics if a subscriber has already been installed
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.directives()));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        match self.format {
            LogFormat::Json => builder.json().flatten_event(true).init(),
            LogFormat::Pretty => builder.pretty().init(),
            LogFormat::Text => builder.with_ansi(false).with_target(false).init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn test_log_format_from_str_invalid() {
        let result = "yaml".parse::<LogFormat>();
        assert!(result.unwrap_err().contains("Invalid log format: 'yaml'"));
    }

    #[test]
    fn test_log_format_display() {
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    #[serial]
    fn test_cli_format_beats_env_and_file() {
        std::env::set_var("TAGCAST_LOG_FORMAT", "json");
        std::env::set_var("TAGCAST_LOG_LEVEL", "warn");
        let section = LogSection {
            level: "error".to_string(),
            format: LogFormat::Text,
        };
        let config = LoggingConfig::resolve(Some(LogFormat::Pretty), false, &section);
        std::env::remove_var("TAGCAST_LOG_FORMAT");
        std::env::remove_var("TAGCAST_LOG_LEVEL");

        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.level, "warn");
    }

    #[test]
    #[serial]
    fn test_file_section_used_without_env() {
        std::env::remove_var("TAGCAST_LOG_FORMAT");
        std::env::remove_var("TAGCAST_LOG_LEVEL");
        let section = LogSection {
            level: "trace".to_string(),
            format: LogFormat::Json,
        };
        let config = LoggingConfig::resolve(None, false, &section);

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "trace");
    }

    #[test]
    #[serial]
    fn test_defaults_without_env_or_file() {
        std::env::remove_var("TAGCAST_LOG_FORMAT");
        std::env::remove_var("TAGCAST_LOG_LEVEL");
        let config = LoggingConfig::resolve(None, true, &LogSection::default());

        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.level, "info");
        assert!(config.verbose);
    }

    #[test]
    fn test_directives_quiet_http_stack() {
        let config = LoggingConfig::new(LogFormat::Text, "info".to_string(), false);
        assert_eq!(
            config.directives(),
            "info,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn"
        );
    }

    #[test]
    fn test_verbose_overrides_level() {
        let config = LoggingConfig::new(LogFormat::Text, "warn".to_string(), true);
        assert!(config.directives().starts_with("debug,"));
    }
}
