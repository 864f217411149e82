//! Kubernetes API backed cluster source

use super::{async_trait, ClusterSource, SourceError};
use crate::models::{ContainerRequest, NodeCapacity, WorkloadRequest};
use crate::quantity::Quantity;
use k8s_openapi::api::core::v1::{Container, Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as KubeQuantity;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig, KubeconfigError};
use kube::{Client, Config};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection settings for the cluster API
#[derive(Debug, Clone, Default)]
pub struct ClusterConfig {
    /// Kubeconfig file to load. Falls back to `KUBECONFIG`, `~/.kube/config`
    /// or in-cluster service account credentials when unset.
    pub config_file_path: Option<PathBuf>,
    /// Replace the API server URL from the kubeconfig
    pub override_host: Option<String>,
    /// Skip TLS verification; only honoured together with `override_host`
    pub insecure_skip_verify: bool,
    /// Connect and read timeout applied to the HTTP client
    pub request_timeout: Option<Duration>,
}

/// Errors building a cluster client
#[derive(Debug, thiserror::Error)]
pub enum ClusterConfigError {
    #[error("failed to read kubeconfig {path}: {source}")]
    ReadKubeconfig {
        path: PathBuf,
        #[source]
        source: KubeconfigError,
    },

    #[error("failed to load kubeconfig: {0}")]
    LoadKubeconfig(#[from] KubeconfigError),

    #[error("failed to infer cluster configuration: {0}")]
    Infer(#[from] kube::config::InferConfigError),

    #[error("invalid override host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("failed to create cluster client: {0}")]
    Client(#[from] kube::Error),
}

impl ClusterConfig {
    /// Resolve the kube client configuration described by these settings
    pub async fn resolve(&self) -> Result<Config, ClusterConfigError> {
        let mut config = match &self.config_file_path {
            Some(path) => {
                let kubeconfig =
                    Kubeconfig::read_from(path).map_err(|source| ClusterConfigError::ReadKubeconfig {
                        path: path.clone(),
                        source,
                    })?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
            }
            None => Config::infer().await?,
        };

        if let Some(host) = &self.override_host {
            config.cluster_url = host
                .parse::<http::Uri>()
                .map_err(|e| ClusterConfigError::InvalidHost {
                    host: host.clone(),
                    reason: e.to_string(),
                })?;
            if self.insecure_skip_verify {
                warn!(host = %host, "TLS verification disabled for override host");
                config.accept_invalid_certs = true;
            }
        }

        if let Some(timeout) = self.request_timeout {
            config.connect_timeout = Some(timeout);
            config.read_timeout = Some(timeout);
        }

        Ok(config)
    }
}

/// Cluster source reading nodes and pods through the Kubernetes API
#[derive(Clone)]
pub struct KubeClusterSource {
    client: Client,
}

impl KubeClusterSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from explicit connection settings
    pub async fn connect(config: &ClusterConfig) -> Result<Self, ClusterConfigError> {
        let resolved = config.resolve().await?;
        info!(cluster_url = %resolved.cluster_url, "Connecting to cluster API");
        let client = Client::try_from(resolved)?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ClusterSource for KubeClusterSource {
    async fn list_nodes(&self) -> Result<Vec<NodeCapacity>, SourceError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes.list(&ListParams::default()).await.map_err(source_error)?;

        debug!(count = list.items.len(), "Listed nodes");
        Ok(list.items.into_iter().map(node_capacity).collect())
    }

    async fn list_workloads_on_node(&self, node_name: &str) -> Result<Vec<WorkloadRequest>, SourceError> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let selector = format!("spec.nodeName={}", node_name);
        let list = pods
            .list(&ListParams::default().fields(&selector))
            .await
            .map_err(source_error)?;

        debug!(node = %node_name, count = list.items.len(), "Listed pods on node");
        Ok(list.items.into_iter().map(workload_request).collect())
    }
}

fn source_error(err: kube::Error) -> SourceError {
    match err {
        kube::Error::Api(response) => {
            SourceError::Request(format!("{} ({})", response.message, response.code))
        }
        other => SourceError::Unreachable(other.to_string()),
    }
}

fn node_capacity(node: Node) -> NodeCapacity {
    let allocatable = node.status.and_then(|s| s.allocatable);

    NodeCapacity {
        name: node.metadata.name.unwrap_or_default(),
        allocatable_cpu: lookup(allocatable.as_ref(), "cpu"),
        allocatable_memory: lookup(allocatable.as_ref(), "memory"),
    }
}

fn workload_request(pod: Pod) -> WorkloadRequest {
    let containers = pod
        .spec
        .map(|spec| spec.containers.iter().map(container_request).collect())
        .unwrap_or_default();

    WorkloadRequest {
        name: pod.metadata.name.unwrap_or_default(),
        namespace: pod.metadata.namespace.unwrap_or_default(),
        containers,
    }
}

fn container_request(container: &Container) -> ContainerRequest {
    let requests = container.resources.as_ref().and_then(|r| r.requests.as_ref());

    ContainerRequest {
        name: container.name.clone(),
        cpu_request: lookup(requests, "cpu"),
        memory_request: lookup(requests, "memory"),
    }
}

fn lookup(map: Option<&BTreeMap<String, KubeQuantity>>, key: &str) -> Option<Quantity> {
    map.and_then(|m| m.get(key)).map(|q| Quantity::new(q.0.clone()))
}
