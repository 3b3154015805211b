// Node exporter families -> fixed-shape numeric sample (pure, stateless)

use crate::exposition::{MetricFamilies, MetricFamily};

pub mod families {
    pub const CPU: &str = "node_cpu";
    /// Newer node exporters export the cpu counter under this name.
    pub const CPU_SECONDS: &str = "node_cpu_seconds_total";
    pub const FORKS: &str = "node_forks_total";
    pub const DISK_IO_NOW: &str = "node_disk_io_now";
    pub const LOAD1: &str = "node_load1";
    pub const MEM_AVAILABLE: &str = "node_memory_MemAvailable";
    pub const MEM_TOTAL: &str = "node_memory_MemTotal";
    pub const NET_RECEIVE: &str = "node_network_receive_bytes";
    pub const NET_TRANSMIT: &str = "node_network_transmit_bytes";
}

/// Families kept from each scrape; everything else is dropped by the poller.
pub const RESOURCE_ALLOW_LIST: &[&str] = &[
    families::CPU,
    families::CPU_SECONDS,
    families::FORKS,
    families::DISK_IO_NOW,
    families::LOAD1,
    families::MEM_AVAILABLE,
    families::MEM_TOTAL,
    families::NET_RECEIVE,
    families::NET_TRANSMIT,
];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CpuModes {
    pub user: f64,
    pub system: f64,
    pub idle: f64,
    pub iowait: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceSample {
    pub cpu: CpuModes,
    pub forks: f64,
    pub disk: f64,
    pub load: f64,
    pub mem_available: f64,
    pub mem_total: f64,
    pub net_received: f64,
    pub net_transmitted: f64,
}

impl ResourceSample {
    /// `available / total` of this sample; 0 when total is 0.
    pub fn memory_usage(&self) -> f64 {
        if self.mem_total == 0.0 {
            0.0
        } else {
            self.mem_available / self.mem_total
        }
    }
}

pub fn reduce(values: &MetricFamilies) -> ResourceSample {
    let cpu_family = values
        .get(families::CPU)
        .or_else(|| values.get(families::CPU_SECONDS));
    ResourceSample {
        cpu: cpu_modes(cpu_family),
        forks: sum_counter(values.get(families::FORKS)),
        disk: average_gauge(values.get(families::DISK_IO_NOW)),
        load: average_gauge(values.get(families::LOAD1)),
        mem_available: average_gauge(values.get(families::MEM_AVAILABLE)),
        mem_total: average_gauge(values.get(families::MEM_TOTAL)),
        net_received: average_gauge(values.get(families::NET_RECEIVE)),
        net_transmitted: average_gauge(values.get(families::NET_TRANSMIT)),
    }
}

/// Sums every series per `mode` label across all cpus. Other modes are ignored.
pub fn cpu_modes(family: Option<&MetricFamily>) -> CpuModes {
    let mut modes = CpuModes::default();
    let Some(family) = family else {
        return modes;
    };
    for sample in &family.samples {
        match sample.label("mode") {
            Some("user") => modes.user += sample.value,
            Some("system") => modes.system += sample.value,
            Some("idle") => modes.idle += sample.value,
            Some("iowait") => modes.iowait += sample.value,
            _ => {}
        }
    }
    modes
}

/// Sum of all series.
pub fn sum_counter(family: Option<&MetricFamily>) -> f64 {
    family.map_or(0.0, |f| f.samples.iter().map(|s| s.value).sum())
}

/// Mean over series (not the sum); 0 for an absent or empty family.
pub fn average_gauge(family: Option<&MetricFamily>) -> f64 {
    match family {
        Some(f) if !f.samples.is_empty() => {
            let sum: f64 = f.samples.iter().map(|s| s.value).sum();
            sum / f.samples.len() as f64
        }
        _ => 0.0,
    }
}
