// Docker engine container listing via bollard (remote engine over HTTP)

use crate::error::PollError;
use crate::models::ContainerState;
use bollard::Docker;
use bollard::models::ContainerSummary;
use bollard::query_parameters::ListContainersOptions;
use std::collections::HashMap;
use tracing::instrument;

/// Engine-side container filters, e.g. `label -> ["app=web"]`.
pub type ContainerFilters = HashMap<String, Vec<String>>;

/// Seconds before an engine request is abandoned.
const ENGINE_TIMEOUT_SECS: u64 = 30;

pub fn engine_url(node: &str, port: u16) -> String {
    format!("http://{}:{}", node, port)
}

pub struct DockerRepo {
    docker: Docker,
    endpoint: String,
}

impl DockerRepo {
    pub fn connect(node: &str, port: u16) -> Result<Self, PollError> {
        let endpoint = engine_url(node, port);
        let docker = Docker::connect_with_http(
            &endpoint,
            ENGINE_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )?;
        Ok(Self { docker, endpoint })
    }

    /// Lists every container (running or not) matching `filters` and returns their states.
    #[instrument(skip(self, filters), fields(repo = "docker", operation = "list_container_states", endpoint = %self.endpoint))]
    pub async fn list_container_states(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerState>, PollError> {
        let options = ListContainersOptions {
            all: true,
            filters: (!filters.is_empty()).then(|| filters.clone()),
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;
        tracing::debug!(containers = containers.len(), "containers listed");
        Ok(containers.iter().map(container_state).collect())
    }
}

/// Engine state string (serializes the same whether the schema models it as a string or an enum).
fn container_state(summary: &ContainerSummary) -> ContainerState {
    match serde_json::to_value(&summary.state) {
        Ok(serde_json::Value::String(s)) => ContainerState::from_docker(&s),
        _ => ContainerState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_url_uses_plain_http() {
        assert_eq!(engine_url("node-1", 2376), "http://node-1:2376");
    }

    #[test]
    fn summary_without_state_is_unknown() {
        let summary = ContainerSummary::default();
        assert_eq!(container_state(&summary), ContainerState::Unknown);
    }

    #[tokio::test]
    async fn list_against_closed_port_is_engine_error() {
        let repo = DockerRepo::connect("127.0.0.1", 1).unwrap();
        let err = repo
            .list_container_states(&ContainerFilters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::Engine(_)));
    }
}
