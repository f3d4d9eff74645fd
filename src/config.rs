//! Configuration module for the pscan scanner

use crate::output::OutputFormat;
use crate::ScanError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Payload written to an open port to coax a banner out of services that
/// wait for the client to speak first.
pub const DEFAULT_PROBE_PAYLOAD: &str = "pscan banner probe\r\n";

/// Main configuration structure for scanning operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of concurrent workers
    pub concurrency: usize,

    /// Timeout for each connection attempt and banner read in milliseconds
    pub timeout: u64,

    /// Maximum number of banner bytes read from an open port
    pub banner_bytes: usize,

    /// Bytes sent after connecting, before the banner read
    pub probe_payload: String,

    /// How results are written
    pub output_format: OutputFormat,

    /// Colorize text output
    pub color: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 100,
            timeout: 2000,
            banner_bytes: 128,
            probe_payload: DEFAULT_PROBE_PAYLOAD.to_string(),
            output_format: OutputFormat::Text,
            color: true,
        }
    }
}

impl ScanConfig {
    /// Set the number of workers
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the timeout in milliseconds
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Get timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ScanError::ConfigError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: ScanConfig = toml::from_str(&content)
            .map_err(|e| ScanError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from `~/.pscan.toml`, falling back to defaults
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let pscan_config = home_dir.join(".pscan.toml");

        if pscan_config.exists() {
            match Self::from_toml_file(&pscan_config) {
                Ok(config) => {
                    log::info!("Loaded config from {}", pscan_config.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring {}: {}", pscan_config.display(), e),
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.concurrency == 0 {
            return Err(ScanError::ConfigError(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.timeout == 0 {
            return Err(ScanError::ConfigError(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.banner_bytes == 0 {
            return Err(ScanError::ConfigError(
                "Banner byte budget must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.concurrency, 100);
        assert_eq!(config.timeout_duration(), Duration::from_secs(2));
        assert_eq!(config.banner_bytes, 128);
        assert_eq!(config.output_format, OutputFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(ScanConfig::default().with_concurrency(0).validate().is_err());
        assert!(ScanConfig::default().with_timeout(0).validate().is_err());

        let mut config = ScanConfig::default();
        config.banner_bytes = 0;
        assert!(matches!(config.validate(), Err(ScanError::ConfigError(_))));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "concurrency = 25").unwrap();
        writeln!(file, "output_format = \"json\"").unwrap();

        let config = ScanConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.concurrency, 25);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.timeout, 2000);
        assert_eq!(config.probe_payload, DEFAULT_PROBE_PAYLOAD);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "concurrency = \"many\"").unwrap();

        let err = ScanConfig::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, ScanError::ConfigError(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ScanConfig::from_toml_file("/nonexistent/pscan.toml").unwrap_err();
        assert!(matches!(err, ScanError::ConfigError(_)));
    }
}
