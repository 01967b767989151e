// src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::scanner::ScannerConfig;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub url: Option<String>,
    /// Base64 DER SubjectPublicKeyInfo of the log
    #[serde(default)]
    pub public_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub quiet: bool,
}

fn default_batch_size() -> u64 { 1000 }
fn default_workers() -> usize { 1 }

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            workers: default_workers(),
            quiet: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_wait_secs")]
    pub base_wait_secs: u64,
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

fn default_max_attempts() -> u32 { 10 }
fn default_base_wait_secs() -> u64 { 1 }
fn default_max_wait_secs() -> u64 { 300 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_wait_secs: default_base_wait_secs(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_secs(self.base_wait_secs),
            Duration::from_secs(self.max_wait_secs),
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_state_file")]
    pub file: String,
}

fn default_state_file() -> String { "ct-scan-state.toml".to_string() }

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            file: default_state_file(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub scanner: ScanConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&contents)?;
        Ok(cfg)
    }

    /// Check values the scanner cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        let Some(ref log_url) = self.log.url else {
            anyhow::bail!("No CT log URL configured: set [log] url or pass --log-url");
        };
        let parsed = url::Url::parse(log_url)
            .map_err(|e| anyhow::anyhow!("Invalid log URL {:?}: {}", log_url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Log URL must use http or https, got {:?}", parsed.scheme());
        }

        if self.scanner.batch_size == 0 {
            anyhow::bail!("scanner.batch_size must be greater than 0");
        }
        if self.scanner.workers == 0 {
            anyhow::bail!("scanner.workers must be greater than 0");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be greater than 0");
        }

        Ok(())
    }

    pub fn scanner_config(&self, progress: bool) -> ScannerConfig {
        ScannerConfig {
            batch_size: self.scanner.batch_size,
            workers: self.scanner.workers,
            quiet: self.scanner.quiet,
            progress,
            retry: self.retry.policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_config_from_valid_toml() {
        let temp_file = write_config(
            r#"
[log]
url = "https://ct.example.com/2025h1"
public_key = "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAE"

[scanner]
batch_size = 256
workers = 4
quiet = true

[retry]
max_attempts = 5
base_wait_secs = 2
max_wait_secs = 60

[state]
file = "test-state.toml"

[logging]
level = "debug"
            "#,
        );

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.log.url.as_deref(), Some("https://ct.example.com/2025h1"));
        assert!(config.log.public_key.is_some());
        assert_eq!(config.scanner.batch_size, 256);
        assert_eq!(config.scanner.workers, 4);
        assert!(config.scanner.quiet);
        assert_eq!(config.state.file, "test-state.toml");
        assert_eq!(config.logging.level, "debug");

        let policy = config.retry.policy();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.base_wait(), Duration::from_secs(2));

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_minimal_toml() {
        let temp_file = write_config(
            r#"
[log]
url = "http://localhost:8080/log"
            "#,
        );

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.scanner.batch_size, 1000);
        assert_eq!(config.scanner.workers, 1);
        assert!(!config.scanner.quiet);
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.state.file, "ct-scan-state.toml");
        assert_eq!(config.logging.level, "info");
        assert!(config.log.public_key.is_none());

        let scanner = config.scanner_config(true);
        assert!(scanner.progress);
        assert_eq!(scanner.retry, RetryPolicy::default());
    }

    #[test]
    fn test_config_invalid_toml() {
        let temp_file = write_config("invalid toml content {{{");
        assert!(Config::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_config_nonexistent_file() {
        let result = Config::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.log.url = Some("ftp://ct.example.com".to_string());
        assert!(config.validate().is_err());

        config.log.url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        config.log.url = Some("https://ct.example.com".to_string());
        assert!(config.validate().is_ok());

        config.scanner.batch_size = 0;
        assert!(config.validate().is_err());
        config.scanner.batch_size = 10;

        config.scanner.workers = 0;
        assert!(config.validate().is_err());
        config.scanner.workers = 2;

        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
