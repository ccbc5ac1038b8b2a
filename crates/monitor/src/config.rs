//! Monitor configuration

use anyhow::{Context, Result};
use monitor_lib::alert::{validate_sink_configs, SinkConfig};
use monitor_lib::runtime::validate_docker_url;
use monitor_lib::{ConfigError, SamplerConfig, Thresholds};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Docker daemon address (`unix://`, `tcp://` or `http://`); local
    /// defaults and `DOCKER_HOST` when unset
    #[serde(default)]
    pub docker_url: Option<String>,

    /// Alert when CPU usage is strictly above this percentage
    #[serde(default = "default_threshold")]
    pub cpu_threshold_percent: f64,

    /// Alert when memory usage is strictly above this percentage of the limit
    #[serde(default = "default_threshold")]
    pub memory_threshold_percent: f64,

    /// Seconds between two alerts for the same container and metric
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Seconds between sampling cycles
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Timeout for runtime and webhook requests
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Webhook endpoints that receive every alert
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

fn default_threshold() -> f64 {
    80.0
}

fn default_cooldown() -> u64 {
    300
}

fn default_interval() -> u64 {
    3
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            docker_url: None,
            cpu_threshold_percent: default_threshold(),
            memory_threshold_percent: default_threshold(),
            cooldown_secs: default_cooldown(),
            interval_secs: default_interval(),
            request_timeout_secs: default_request_timeout(),
            sinks: Vec::new(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from an optional file, overridden by `MONITOR_*`
    /// environment variables, and validate it
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_env(
            path,
            config::Environment::with_prefix("MONITOR").try_parsing(true),
        )
    }

    /// Load with an explicit environment source; its values win over the file
    pub fn load_with_env(path: &Path, env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(env)
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to parse configuration")?;

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Reject configurations the monitor cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("cpu", self.cpu_threshold_percent)?;
        check_threshold("memory", self.memory_threshold_percent)?;

        if self.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        if let Some(url) = &self.docker_url {
            validate_docker_url(url).map_err(|reason| ConfigError::InvalidDockerUrl {
                url: url.clone(),
                reason,
            })?;
        }

        validate_sink_configs(&self.sinks)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            cpu_percent: self.cpu_threshold_percent,
            memory_percent: self.memory_threshold_percent,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sampler_config(&self, console_output: bool) -> SamplerConfig {
        SamplerConfig {
            thresholds: self.thresholds(),
            cooldown: Duration::from_secs(self.cooldown_secs),
            interval: Duration::from_secs(self.interval_secs),
            console_output,
        }
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidThreshold { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.docker_url, None);
        assert_eq!(config.sampler_config(true).interval, Duration::from_secs(3));
        assert_eq!(config.sampler_config(true).cooldown, Duration::from_secs(300));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor.toml");
        fs::write(
            &path,
            r#"
cpu_threshold_percent = 70.0
memory_threshold_percent = 0
cooldown_secs = 60

[[sinks]]
name = "ops"
url = "https://hooks.example.com/ops"

[[sinks]]
name = "oncall"
url = "http://alerts.internal:8080/hook"
"#,
        )
        .unwrap();

        let config = MonitorConfig::load(&path).unwrap();

        assert_eq!(config.cpu_threshold_percent, 70.0);
        assert_eq!(config.memory_threshold_percent, 0.0);
        assert_eq!(config.cooldown_secs, 60);
        assert_eq!(config.interval_secs, 3);
        assert_eq!(config.sinks.len(), 2);
        assert_eq!(config.sinks[1].name, "oncall");
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor.toml");
        fs::write(
            &path,
            r#"
cpu_threshold_percent = 70.0
memory_threshold_percent = 60.0
cooldown_secs = 60
"#,
        )
        .unwrap();

        let vars: config::Map<String, String> = [
            ("MONITOR_CPU_THRESHOLD_PERCENT", "0"),
            ("MONITOR_COOLDOWN_SECS", "42"),
            ("MONITOR_DOCKER_URL", "tcp://127.0.0.1:2375"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let env = config::Environment::with_prefix("MONITOR")
            .try_parsing(true)
            .source(Some(vars));

        let config = MonitorConfig::load_with_env(&path, env).unwrap();

        assert_eq!(config.cpu_threshold_percent, 0.0);
        assert_eq!(config.memory_threshold_percent, 60.0);
        assert_eq!(config.cooldown_secs, 42);
        assert_eq!(config.docker_url.as_deref(), Some("tcp://127.0.0.1:2375"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = MonitorConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert!(config.sinks.is_empty());
    }

    #[test]
    fn test_malformed_sink_rejected_at_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor.toml");
        fs::write(
            &path,
            r#"
[[sinks]]
name = "ops"
url = "hooks.example.com/no-scheme"
"#,
        )
        .unwrap();

        assert!(MonitorConfig::load(&path).is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = MonitorConfig {
            cpu_threshold_percent: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold { name: "cpu", .. })
        ));

        config.cpu_threshold_percent = 50.0;
        config.memory_threshold_percent = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold { name: "memory", .. })
        ));

        config.memory_threshold_percent = 50.0;
        config.interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval)));

        config.interval_secs = 3;
        config.request_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn test_docker_url_validation() {
        let mut config = MonitorConfig {
            docker_url: Some("unix:///var/run/docker.sock".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.docker_url = Some("http://docker.internal:2375/v1.43".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDockerUrl { .. })
        ));
    }
}
