// Output field catalogue and typed records handed to sinks

use serde::Serialize;
use std::fmt;

/// Every field a sink can receive. Names are only produced at the sink boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Timestamp,
    Node,
    CpuUser,
    CpuSystem,
    CpuIdle,
    CpuIowait,
    Forks,
    Disk,
    Load,
    MemAvailable,
    MemTotal,
    NetReceived,
    NetTransmitted,
    CpuUserDelta,
    CpuSystemDelta,
    CpuIdleDelta,
    CpuIowaitDelta,
    ForksDelta,
    MemUsage,
    DockerRunning,
    DockerPaused,
    DockerTotal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
}

impl Field {
    /// Registration order; also the column order of tabular sinks.
    pub const ALL: [Field; 22] = [
        Field::Timestamp,
        Field::Node,
        Field::CpuUser,
        Field::CpuSystem,
        Field::CpuIdle,
        Field::CpuIowait,
        Field::Forks,
        Field::Disk,
        Field::Load,
        Field::MemAvailable,
        Field::MemTotal,
        Field::NetReceived,
        Field::NetTransmitted,
        Field::CpuUserDelta,
        Field::CpuSystemDelta,
        Field::CpuIdleDelta,
        Field::CpuIowaitDelta,
        Field::ForksDelta,
        Field::MemUsage,
        Field::DockerRunning,
        Field::DockerPaused,
        Field::DockerTotal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Node => "HId",
            Field::CpuUser => "cpu_user",
            Field::CpuSystem => "cpu_system",
            Field::CpuIdle => "cpu_idle",
            Field::CpuIowait => "cpu_iowait",
            Field::Forks => "forks",
            Field::Disk => "disk",
            Field::Load => "load",
            Field::MemAvailable => "mem_available",
            Field::MemTotal => "mem_total",
            Field::NetReceived => "net_rev",
            Field::NetTransmitted => "net_tra",
            Field::CpuUserDelta => "cpu_user_delta",
            Field::CpuSystemDelta => "cpu_system_delta",
            Field::CpuIdleDelta => "cpu_idle_delta",
            Field::CpuIowaitDelta => "cpu_iowait_delta",
            Field::ForksDelta => "forks_delta",
            Field::MemUsage => "mem_usage",
            Field::DockerRunning => "docker_running",
            Field::DockerPaused => "docker_paused",
            Field::DockerTotal => "docker_total",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Field::Timestamp => "current timestamp",
            Field::Node => "node name",
            Field::CpuUser => "cpu time spent in user mode",
            Field::CpuSystem => "cpu time spent in system mode",
            Field::CpuIdle => "cpu time spent idle",
            Field::CpuIowait => "cpu time spent waiting for io",
            Field::Forks => "number of forks",
            Field::Disk => "disk io in progress",
            Field::Load => "running load average (1 minute)",
            Field::MemAvailable => "available memory in bytes",
            Field::MemTotal => "total memory in bytes",
            Field::NetReceived => "bytes received",
            Field::NetTransmitted => "bytes transmitted",
            Field::CpuUserDelta => "cpu user changed since last update",
            Field::CpuSystemDelta => "cpu system changed since last update",
            Field::CpuIdleDelta => "cpu idle changed since last update",
            Field::CpuIowaitDelta => "cpu iowait changed since last update",
            Field::ForksDelta => "forks changed since last update",
            Field::MemUsage => "available memory as a fraction of total",
            Field::DockerRunning => "number of running docker containers",
            Field::DockerPaused => "number of paused docker containers",
            Field::DockerTotal => "total number of docker containers",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Timestamp | Field::DockerRunning | Field::DockerPaused | Field::DockerTotal => {
                FieldKind::Integer
            }
            Field::Node => FieldKind::Text,
            _ => FieldKind::Real,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Real(r) => Some(*r),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Real(r) => write!(f, "{r}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// One emission: field/value pairs in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(Field, FieldValue)>,
}

impl Record {
    /// Starts a record with the two fields every emission carries.
    pub fn new(timestamp: i64, node: &str) -> Self {
        Self::default()
            .with(Field::Timestamp, timestamp)
            .with(Field::Node, node)
    }

    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
        self
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.entries.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name -> value view for sinks.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(f, v)| {
                let value = serde_json::to_value(v).unwrap_or(serde_json::Value::Null);
                (f.name().to_string(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}
