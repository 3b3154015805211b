// Per-node statistics: current values plus deltas against the previous sample.
// Owned by the collector loop only; nothing here is shared between tasks.

use crate::models::{Field, Record};
use crate::reducer::{CpuModes, ResourceSample};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeStats {
    pub node: String,
    pub current: ResourceSample,
    pub cpu_delta: CpuModes,
    pub forks_delta: f64,
    pub mem_usage: f64,
}

impl NodeStats {
    /// First sample for a node: current values seeded, all deltas zero.
    pub fn create(node: &str, sample: &ResourceSample) -> Self {
        Self {
            node: node.to_string(),
            current: *sample,
            cpu_delta: CpuModes::default(),
            forks_delta: 0.0,
            mem_usage: sample.memory_usage(),
        }
    }

    /// Deltas are `previous - new` (old minus new), then current values are replaced.
    pub fn update(&mut self, sample: &ResourceSample) {
        let old = &self.current;
        self.cpu_delta = CpuModes {
            user: old.cpu.user - sample.cpu.user,
            system: old.cpu.system - sample.cpu.system,
            idle: old.cpu.idle - sample.cpu.idle,
            iowait: old.cpu.iowait - sample.cpu.iowait,
        };
        self.forks_delta = old.forks - sample.forks;
        self.mem_usage = sample.memory_usage();
        self.current = *sample;
    }

    pub fn to_record(&self, timestamp: i64) -> Record {
        let c = &self.current;
        Record::new(timestamp, &self.node)
            .with(Field::CpuUser, c.cpu.user)
            .with(Field::CpuSystem, c.cpu.system)
            .with(Field::CpuIdle, c.cpu.idle)
            .with(Field::CpuIowait, c.cpu.iowait)
            .with(Field::Forks, c.forks)
            .with(Field::Disk, c.disk)
            .with(Field::Load, c.load)
            .with(Field::MemAvailable, c.mem_available)
            .with(Field::MemTotal, c.mem_total)
            .with(Field::NetReceived, c.net_received)
            .with(Field::NetTransmitted, c.net_transmitted)
            .with(Field::CpuUserDelta, self.cpu_delta.user)
            .with(Field::CpuSystemDelta, self.cpu_delta.system)
            .with(Field::CpuIdleDelta, self.cpu_delta.idle)
            .with(Field::CpuIowaitDelta, self.cpu_delta.iowait)
            .with(Field::ForksDelta, self.forks_delta)
            .with(Field::MemUsage, self.mem_usage)
    }
}

/// Node id -> statistics. Entries are created on first sight and never removed.
#[derive(Debug, Default)]
pub struct NodeTable {
    nodes: HashMap<String, NodeStats>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locate-or-create, then apply the sample. Returns the updated entry.
    pub fn ingest(&mut self, node: &str, sample: &ResourceSample) -> &NodeStats {
        if let Some(stats) = self.nodes.get_mut(node) {
            stats.update(sample);
        } else {
            self.nodes
                .insert(node.to_string(), NodeStats::create(node, sample));
        }
        &self.nodes[node]
    }

    pub fn get(&self, node: &str) -> Option<&NodeStats> {
        self.nodes.get(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn into_inner(self) -> HashMap<String, NodeStats> {
        self.nodes
    }
}
