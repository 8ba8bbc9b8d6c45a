//! Configuration management with YAML support

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub scrape: ScrapeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Where the game server writes player saves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_database_path() -> String {
    "~/.local/share/skilltrack/skilltrack.db".to_string()
}

fn default_data_dir() -> String {
    "~/.void/data/saves".to_string()
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./skilltrack.yaml (current directory)
    /// 3. ~/.config/skilltrack/skilltrack.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "skilltrack.yaml".to_string(),
            shellexpand::tilde("~/.config/skilltrack/skilltrack.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)?;
                return Self::from_yaml(&content);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scrape.poll_interval_secs == 0 {
            return Err(Error::Config(
                "scrape.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the database path, expanding ~ to home directory
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.database.path).to_string())
    }

    /// Get the save directory, expanding ~ to home directory
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.source.data_dir).to_string())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.scrape.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(300));
        assert_eq!(config.logging.level, "warn");
        assert!(config.database_path().ends_with("skilltrack/skilltrack.db"));
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
database:
  path: /var/lib/skilltrack/test.db

source:
  data_dir: /srv/void/data/saves

scrape:
  poll_interval_secs: 60
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/var/lib/skilltrack/test.db"));
        assert_eq!(config.data_dir(), PathBuf::from("/srv/void/data/saves"));
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        // Unset sections fall back to defaults.
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = Config::from_yaml("scrape:\n  poll_interval_secs: 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let err = Config::from_yaml("database: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
