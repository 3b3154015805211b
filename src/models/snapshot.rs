// Poll results and error events flowing from pollers to the collector

use crate::error::PollError;
use crate::exposition::MetricFamilies;
use std::fmt;

/// One resource poll result for a node, already restricted to the allow-list.
#[derive(Debug, Clone)]
pub struct ResourceSnapshot {
    pub node: String,
    pub families: MetricFamilies,
}

/// Which poller an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Resource,
    Container,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Resource => "resource",
            SourceKind::Container => "container",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct ErrorEvent {
    pub node: String,
    pub source: SourceKind,
    pub cause: PollError,
}
