// Poller data sources and the per-node endpoint factory the collector builds them from

use crate::docker_repo::{ContainerFilters, DockerRepo};
use crate::error::PollError;
use crate::models::ContainerState;
use crate::node_exporter_repo::{NodeExporterRepo, http_client};
use std::future::Future;
use std::time::Duration;

/// Raw exposition text for one node.
pub trait ResourceSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<String, PollError>> + Send;
}

/// Container states for one node.
pub trait ContainerSource: Send + Sync + 'static {
    fn list_states(
        &self,
        filters: &ContainerFilters,
    ) -> impl Future<Output = Result<Vec<ContainerState>, PollError>> + Send;
}

/// Builds the sources for a node at collector start.
pub trait Endpoints: Send + Sync + 'static {
    type Resource: ResourceSource;
    type Containers: ContainerSource;

    fn resource(&self, node: &str) -> Self::Resource;

    /// May fail when no engine client can be built for the node; that node then only polls resources.
    fn containers(&self, node: &str) -> Result<Self::Containers, PollError>;
}

impl ResourceSource for NodeExporterRepo {
    async fn fetch(&self) -> Result<String, PollError> {
        self.fetch_text().await
    }
}

impl ContainerSource for DockerRepo {
    async fn list_states(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerState>, PollError> {
        self.list_container_states(filters).await
    }
}

/// Real endpoints: `http://<node>:<resource_port>/metrics` and the engine at `<node>:<engine_port>`.
pub struct RemoteEndpoints {
    client: reqwest::Client,
    resource_port: u16,
    engine_port: u16,
}

impl RemoteEndpoints {
    pub fn new(
        resource_port: u16,
        engine_port: u16,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(request_timeout)?,
            resource_port,
            engine_port,
        })
    }
}

impl Endpoints for RemoteEndpoints {
    type Resource = NodeExporterRepo;
    type Containers = DockerRepo;

    fn resource(&self, node: &str) -> NodeExporterRepo {
        NodeExporterRepo::new(self.client.clone(), node, self.resource_port)
    }

    fn containers(&self, node: &str) -> Result<DockerRepo, PollError> {
        DockerRepo::connect(node, self.engine_port)
    }
}
