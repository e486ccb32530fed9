//! Configuration loading and types

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fleetwatch_cloud::STATIC_PROVIDER_NAME;
use fleetwatch_core::{EscalationPolicy, HostStatus, MissingHostPolicy, MonitorConfig};

/// Top-level configuration for the fleetwatch daemon
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Daemon settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Reconciliation settings
    #[serde(default)]
    pub monitor: MonitorSection,
    /// Settings for statically provisioned machines
    #[serde(default)]
    pub static_provider: StaticProviderConfig,
    /// Hosts to track
    #[serde(default)]
    pub host: Vec<HostEntry>,
}

/// Daemon settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,
    /// Seconds between monitoring passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_interval_secs() -> u64 {
    300
}

/// Reconciliation settings as written in the config file
///
/// The daemon has no heartbeat source: `last_communication_time` is the
/// moment the store was seeded at startup. Once the daemon has been up longer
/// than `unreachable_threshold_secs`, a single failed check escalates a
/// running host, and a quarantined host stays quarantined until the daemon
/// is restarted with the host listed as `running` again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSection {
    /// Seconds a running host may go silent before escalation
    #[serde(default = "default_unreachable_threshold_secs")]
    pub unreachable_threshold_secs: u64,
    #[serde(default)]
    pub escalation: EscalationPolicy,
    #[serde(default)]
    pub missing_host: MissingHostPolicy,
    /// Parallel reconciliation jobs per pass
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            unreachable_threshold_secs: default_unreachable_threshold_secs(),
            escalation: EscalationPolicy::default(),
            missing_host: MissingHostPolicy::default(),
            workers: default_workers(),
        }
    }
}

fn default_unreachable_threshold_secs() -> u64 {
    600
}

fn default_workers() -> usize {
    8
}

impl From<&MonitorSection> for MonitorConfig {
    fn from(section: &MonitorSection) -> Self {
        Self {
            unreachable_threshold: Duration::from_secs(section.unreachable_threshold_secs),
            escalation: section.escalation,
            missing_host: section.missing_host,
            workers: section.workers,
        }
    }
}

/// Static machine probing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticProviderConfig {
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
    /// Connect timeout in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for StaticProviderConfig {
    fn default() -> Self {
        Self {
            ssh_port: default_ssh_port(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

fn default_ssh_port() -> u16 {
    22
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

/// One tracked host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEntry {
    /// Unique host identifier
    pub id: String,
    /// Provider tag (`static`, `mock`, ...)
    pub provider: String,
    /// Machine address, required for static hosts
    pub addr: Option<String>,
    #[serde(default = "default_started_by")]
    pub started_by: String,
    /// Initial status of the record
    #[serde(default = "default_status")]
    pub status: HostStatus,
    pub instance_id: Option<String>,
}

fn default_started_by() -> String {
    "fleetwatch".to_string()
}

fn default_status() -> HostStatus {
    HostStatus::Running
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid configuration
    pub fn parse(content: &str) -> eyre::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.monitor.workers == 0 {
            eyre::bail!("monitor.workers must be at least 1");
        }
        if config.monitor.escalation == EscalationPolicy::Terminate {
            if let Some(host) = config
                .host
                .iter()
                .find(|h| h.provider == STATIC_PROVIDER_NAME)
            {
                eyre::bail!(
                    "monitor.escalation = \"terminate\" cannot be used with static host {}: \
                     static machines cannot be terminated",
                    host.id
                );
            }
        }
        Ok(config)
    }

    /// Load from default paths or use defaults
    ///
    /// # Errors
    /// Returns error if a config file exists but cannot be loaded
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var("FLEETWATCH_CONFIG") {
            return Self::load(&PathBuf::from(path));
        }

        let mut paths = vec![
            PathBuf::from("fleetwatch.toml"),
            PathBuf::from("/etc/fleetwatch/fleetwatch.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("fleetwatch/fleetwatch.toml"));
        }

        for path in paths {
            if path.exists() {
                return Self::load(&path);
            }
        }

        tracing::warn!("no config file found, using defaults");
        Ok(Config::default())
    }

    /// Interval between monitoring passes
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.daemon.interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [daemon]
            log_level = "debug"
            interval_secs = 60

            [monitor]
            unreachable_threshold_secs = 120
            escalation = "quarantine"
            missing_host = "ignore"
            workers = 4

            [static_provider]
            ssh_port = 2222

            [[host]]
            id = "build-01"
            provider = "static"
            addr = "10.0.0.11"

            [[host]]
            id = "ephemeral-7"
            provider = "mock"
            status = "provisioning"
            started_by = "alice"
            "#,
        )
        .unwrap();

        assert_eq!(config.daemon.log_level, "debug");
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.static_provider.ssh_port, 2222);
        assert_eq!(config.static_provider.probe_timeout_ms, 5000);

        let monitor = MonitorConfig::from(&config.monitor);
        assert_eq!(monitor.unreachable_threshold, Duration::from_secs(120));
        assert_eq!(monitor.escalation, EscalationPolicy::Quarantine);
        assert_eq!(monitor.missing_host, MissingHostPolicy::Ignore);
        assert_eq!(monitor.workers, 4);

        assert_eq!(config.host.len(), 2);
        assert_eq!(config.host[0].status, HostStatus::Running);
        assert_eq!(config.host[0].started_by, "fleetwatch");
        assert_eq!(config.host[1].status, HostStatus::Provisioning);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        let monitor = MonitorConfig::from(&config.monitor);
        assert_eq!(monitor.escalation, EscalationPolicy::Quarantine);
        assert_eq!(monitor.missing_host, MissingHostPolicy::Fail);
        assert_eq!(config.interval(), Duration::from_secs(300));
        assert!(config.host.is_empty());
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(Config::parse("[monitor]\nworkers = 0\n").is_err());
    }

    #[test]
    fn test_terminate_escalation_rejected_with_static_hosts() {
        let err = Config::parse(
            r#"
            [monitor]
            escalation = "terminate"

            [[host]]
            id = "build-01"
            provider = "static"
            addr = "10.0.0.11"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("build-01"));

        let config = Config::parse(
            r#"
            [monitor]
            escalation = "terminate"

            [[host]]
            id = "ephemeral-7"
            provider = "mock"
            "#,
        )
        .unwrap();
        assert_eq!(config.monitor.escalation, EscalationPolicy::Terminate);
    }
}
