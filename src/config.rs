//! Configuration for the devolo exporter.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration (YAML).
///
/// `ip_address` and `password` are mandatory; a missing key fails parsing
/// and must abort startup before the listener is bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Address of the devolo device to poll.
    pub ip_address: String,

    /// Device password used for the per-scrape authentication handshake.
    pub password: String,

    /// HTTP exposition endpoint settings.
    #[serde(default)]
    pub exporter: ListenConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listen settings for the scrape endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    /// Host to bind (default: "localhost").
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind (default: 5642). The u16 type bounds it to 0-65535 at
    /// parse time.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5642
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl ExporterConfig {
    /// Load configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ip_address.is_empty() {
            return Err(ConfigError::Validation(
                "ip_address must not be empty".to_string(),
            ));
        }

        if self.exporter.host.is_empty() {
            return Err(ConfigError::Validation(
                "exporter.host must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
ip_address: "192.0.2.10"
password: "secret"
"#;
        let config = ExporterConfig::parse(yaml).unwrap();

        assert_eq!(config.ip_address, "192.0.2.10");
        assert_eq!(config.password, "secret");
        assert_eq!(config.exporter.host, "localhost");
        assert_eq!(config.exporter.port, 5642);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
ip_address: "192.0.2.10"
password: "secret"
exporter:
  host: "0.0.0.0"
  port: 9123
logging:
  level: debug
  format: json
"#;
        let config = ExporterConfig::parse(yaml).unwrap();

        assert_eq!(config.exporter.host, "0.0.0.0");
        assert_eq!(config.exporter.port, 9123);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_mandatory_key_fails() {
        let yaml = r#"
password: "secret"
"#;
        let result = ExporterConfig::parse(yaml);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_out_of_range_port_fails() {
        let yaml = r#"
ip_address: "192.0.2.10"
password: "secret"
exporter:
  port: 70000
"#;
        let result = ExporterConfig::parse(yaml);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_empty_ip_address_fails_validation() {
        let yaml = r#"
ip_address: ""
password: "secret"
"#;
        let result = ExporterConfig::parse(yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("ip_address"))
        );
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ip_address: \"192.0.2.10\"").unwrap();
        writeln!(file, "password: \"secret\"").unwrap();

        let config = ExporterConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.ip_address, "192.0.2.10");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = ExporterConfig::load_from_file("/nonexistent/config.yml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
