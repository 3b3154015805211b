// Command-line flags; each one set overrides the matching config file value

use crate::config::{AppConfig, OutputFormat};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Default, Parser)]
#[command(
    name = "clusterstat",
    version,
    about = "Collect node exporter and Docker metrics from cluster nodes"
)]
pub struct Cli {
    /// TOML config file (default: $CONFIG_FILE, then ./config.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Nodes to connect to, comma separated
    #[arg(long, value_delimiter = ',')]
    pub nodes: Vec<String>,

    /// Interval between collecting data, in milliseconds
    #[arg(long = "interval-ms")]
    pub interval_ms: Option<u64>,

    /// Stop collecting after this many milliseconds; -1 means no timeout
    #[arg(long = "timeout-ms", allow_negative_numbers = true)]
    pub timeout_ms: Option<i64>,

    /// Node exporter port
    #[arg(long = "pport")]
    pub resource_port: Option<u16>,

    /// Docker engine port
    #[arg(long = "dport")]
    pub engine_port: Option<u16>,

    /// Collect docker metrics
    #[arg(long = "docker")]
    pub docker: Option<bool>,

    /// Output file stem; records are logged when empty
    #[arg(long)]
    pub name: Option<String>,

    /// Output file format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Docker list filter as key=value (repeatable)
    #[arg(long = "filter")]
    pub filters: Vec<String>,
}

impl Cli {
    pub fn apply(&self, config: &mut AppConfig) -> anyhow::Result<()> {
        if !self.nodes.is_empty() {
            config.collector.nodes = self.nodes.clone();
        }
        if let Some(ms) = self.interval_ms {
            config.collector.interval_ms = ms;
        }
        if let Some(ms) = self.timeout_ms {
            config.collector.timeout_ms = ms;
        }
        if let Some(port) = self.resource_port {
            config.resource.port = port;
        }
        if let Some(port) = self.engine_port {
            config.containers.port = port;
        }
        if let Some(enabled) = self.docker {
            config.containers.enabled = enabled;
        }
        if let Some(name) = &self.name {
            config.output.name = Some(name.clone());
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        for filter in &self.filters {
            let (key, value) = parse_filter(filter)?;
            config
                .containers
                .filters
                .entry(key.to_string())
                .or_default()
                .push(value.to_string());
        }
        Ok(())
    }
}

/// `key=value`; the value may itself contain `=` (e.g. `label=tier=web`).
pub fn parse_filter(s: &str) -> anyhow::Result<(&str, &str)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("filter {:?} must be key=value", s))?;
    let key = key.trim();
    anyhow::ensure!(!key.is_empty(), "filter {:?} has an empty key", s);
    Ok((key, value.trim()))
}
