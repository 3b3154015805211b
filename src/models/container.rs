// Docker container models

use serde::Serialize;

/// Docker container lifecycle state; serializes to lowercase (e.g. "running").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Unknown,
}

impl ContainerState {
    /// Parse from Docker API state string (e.g. "running", "exited").
    pub fn from_docker(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "paused" => ContainerState::Paused,
            "restarting" => ContainerState::Restarting,
            "removing" => ContainerState::Removing,
            "exited" => ContainerState::Exited,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown,
        }
    }
}

/// Container counts for one node from a single engine query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerCounts {
    pub running: u64,
    pub paused: u64,
    pub total: u64,
}

impl ContainerCounts {
    /// Only running and paused are told apart; every container counts toward total.
    pub fn tally<I>(states: I) -> Self
    where
        I: IntoIterator<Item = ContainerState>,
    {
        states
            .into_iter()
            .fold(ContainerCounts::default(), |mut acc, state| {
                match state {
                    ContainerState::Running => acc.running += 1,
                    ContainerState::Paused => acc.paused += 1,
                    _ => {}
                }
                acc.total += 1;
                acc
            })
    }
}

/// One container poll result for a node. Forwarded to the sink as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSnapshot {
    pub node: String,
    pub counts: ContainerCounts,
}
