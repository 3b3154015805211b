use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_RESOURCE_PORT: u16 = 9100;
pub const DEFAULT_ENGINE_PORT: u16 = 2376;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub collector: CollectorConfig,
    pub resource: ResourceConfig,
    pub containers: ContainersConfig,
    pub output: OutputConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub nodes: Vec<String>,
    pub interval_ms: u64,
    /// Stop collecting after this long; zero or negative means run until interrupted.
    pub timeout_ms: i64,
    /// Time allowed for loops to exit after an interrupt before the process is killed.
    pub grace_period_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            interval_ms: 1000,
            timeout_ms: -1,
            grace_period_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub port: u16,
    pub request_timeout_ms: u64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_RESOURCE_PORT,
            request_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContainersConfig {
    pub enabled: bool,
    pub port: u16,
    /// Docker engine list filters, e.g. `{ label = ["tier=web"] }`.
    pub filters: HashMap<String, Vec<String>>,
}

impl Default for ContainersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: DEFAULT_ENGINE_PORT,
            filters: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Sqlite,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file stem; unset or empty logs records instead.
    pub name: Option<String>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// How often to log collection counters at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: 60,
        }
    }
}

impl AppConfig {
    /// Loads `CONFIG_FILE` (or `config.toml`) and validates it.
    pub fn load() -> anyhow::Result<Self> {
        let config = Self::read(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads without validating so CLI overrides can be applied first.
    /// An explicit path or `CONFIG_FILE` must exist; a missing default `config.toml` yields defaults.
    pub fn read(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var("CONFIG_FILE") {
                Ok(p) => (p.into(), true),
                Err(_) => ("config.toml".into(), false),
            },
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("config {}: {}", path.display(), e))?;
        Ok(toml::from_str(&s)?)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.node_list().is_empty(),
            "collector.nodes must name at least one node"
        );
        anyhow::ensure!(
            self.collector.interval_ms > 0,
            "collector.interval_ms must be > 0, got {}",
            self.collector.interval_ms
        );
        anyhow::ensure!(
            self.collector.grace_period_ms > 0,
            "collector.grace_period_ms must be > 0, got {}",
            self.collector.grace_period_ms
        );
        anyhow::ensure!(
            self.resource.port > 0,
            "resource.port must be between 1 and 65535, got {}",
            self.resource.port
        );
        anyhow::ensure!(
            self.resource.request_timeout_ms > 0,
            "resource.request_timeout_ms must be > 0, got {}",
            self.resource.request_timeout_ms
        );
        anyhow::ensure!(
            self.containers.port > 0,
            "containers.port must be between 1 and 65535, got {}",
            self.containers.port
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }

    /// Trimmed, non-empty node names with duplicates removed (first occurrence wins).
    pub fn node_list(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.collector.nodes.len());
        for node in &self.collector.nodes {
            let node = node.trim();
            if !node.is_empty() && !out.iter().any(|n| n == node) {
                out.push(node.to_string());
            }
        }
        out
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.collector.interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        u64::try_from(self.collector.timeout_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.collector.grace_period_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.resource.request_timeout_ms)
    }

    pub fn stats_log_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring.stats_log_interval_secs)
    }
}
