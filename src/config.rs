use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed configuration for one monitor run, validated once at startup and
/// never re-read while the engine is running.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    pub url: String,
    /// Seconds between scheduled checks.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
    /// Probe timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_days_to_keep")]
    pub days_to_keep: u32,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_true")]
    pub alert_on_failure: bool,
    #[serde(default = "default_true")]
    pub alert_on_recovery: bool,
    /// Consecutive failures before a Failure alert; zero or less alerts on
    /// the first failure.
    #[serde(default = "default_threshold")]
    pub consecutive_failures_threshold: i64,
    #[serde(default = "default_true")]
    pub report_on_shutdown: bool,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

fn default_check_interval() -> u64 {
    300
}
fn default_timeout() -> u64 {
    10
}
fn default_db_path() -> PathBuf {
    PathBuf::from("uptime_monitor.db")
}
fn default_days_to_keep() -> u32 {
    30
}
fn default_threshold() -> i64 {
    3
}
fn default_true() -> bool {
    true
}
fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            url: "https://httpbin.org/status/200".into(),
            check_interval: default_check_interval(),
            timeout: default_timeout(),
            db_path: default_db_path(),
            days_to_keep: default_days_to_keep(),
            webhook_url: None,
            alert_on_failure: true,
            alert_on_recovery: true,
            consecutive_failures_threshold: default_threshold(),
            report_on_shutdown: true,
            reports_dir: default_reports_dir(),
        }
    }
}

impl MonitorConfig {
    /// Load and validate a configuration file, YAML or JSON by extension.
    ///
    /// A missing file is seeded with the defaults and reported as an error so
    /// the operator edits it before the first real run.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::default().write_default(path)?;
            return Err(ConfigError::DefaultCreated(path.to_path_buf()));
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "url must be http(s), got {:?}",
                self.url
            )));
        }
        if self.check_interval == 0 {
            return Err(ConfigError::Invalid("check_interval must be positive".into()));
        }
        if self.timeout == 0 {
            return Err(ConfigError::Invalid("timeout must be positive".into()));
        }
        if self.days_to_keep == 0 {
            return Err(ConfigError::Invalid("days_to_keep must be positive".into()));
        }
        if let Some(webhook) = &self.webhook_url {
            if !webhook.starts_with("http://") && !webhook.starts_with("https://") {
                return Err(ConfigError::Invalid("webhook_url must be http(s)".into()));
            }
        }
        Ok(())
    }

    fn write_default(&self, path: &Path) -> Result<(), ConfigError> {
        let rendered = if is_yaml(path) {
            serde_yaml::to_string(self).expect("default config serializes")
        } else {
            serde_json::to_string_pretty(self).expect("default config serializes")
        };
        std::fs::write(path, rendered).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_with_defaults() {
        let config: MonitorConfig =
            serde_yaml::from_str("url: https://example.com\n").unwrap();
        assert_eq!(config.check_interval, 300);
        assert_eq!(config.timeout, 10);
        assert_eq!(config.days_to_keep, 30);
        assert_eq!(config.consecutive_failures_threshold, 3);
        assert!(config.alert_on_failure);
        assert!(config.alert_on_recovery);
        assert!(config.report_on_shutdown);
        assert!(config.webhook_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_round_trip() {
        let config: MonitorConfig = serde_json::from_str(
            r#"{"url": "https://example.com", "check_interval": 60, "consecutive_failures_threshold": 1}"#,
        )
        .unwrap();
        assert_eq!(config.check_interval, 60);
        assert_eq!(config.consecutive_failures_threshold, 1);
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<MonitorConfig, _> =
            serde_yaml::from_str("url: https://example.com\nbogus_field: 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn non_http_url_rejected() {
        let config = MonitorConfig {
            url: "ftp://example.com".into(),
            ..MonitorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_interval_rejected() {
        let config = MonitorConfig {
            check_interval: 0,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor_config.yaml");
        let result = MonitorConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::DefaultCreated(_))));
        // a second load parses the seeded file
        let config = MonitorConfig::load(&path).unwrap();
        assert_eq!(config.check_interval, 300);
    }
}
