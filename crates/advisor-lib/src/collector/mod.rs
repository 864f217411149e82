//! Usage collection from the cluster API
//!
//! The [`UsageCollector`] walks every node reported by a [`ClusterSource`],
//! sums the CPU and memory requests of the workloads scheduled on it and
//! reduces them into a [`ResourceSnapshot`]. Collection is all-or-nothing:
//! a single unreachable query or bad node fails the whole pass.

mod kube_source;
mod static_source;

#[cfg(test)]
mod tests;

pub use kube_source::{ClusterConfig, ClusterConfigError, KubeClusterSource};
pub use static_source::{StaticClusterSource, StaticNode};

use crate::models::{NodeCapacity, NodeUsageSnapshot, Resource, ResourceSnapshot, WorkloadRequest};
use crate::quantity::{Quantity, QuantityError};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub use async_trait::async_trait;

/// Default upper bound for a single cluster API query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors reported by a cluster data source
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("cluster API unreachable: {0}")]
    Unreachable(String),

    #[error("cluster API request failed: {0}")]
    Request(String),
}

/// Errors raised while collecting a snapshot
#[derive(Debug, Clone, thiserror::Error)]
pub enum CollectError {
    #[error("collection failed while {operation}: {reason}")]
    CollectionFailed { operation: String, reason: String },

    #[error("node {node} has invalid allocatable {resource}: {reason}")]
    InvalidNodeCapacity {
        node: String,
        resource: Resource,
        reason: String,
    },

    #[error("workload {workload} on node {node} declares malformed {field} {value:?}: {source}")]
    MalformedResourceQuantity {
        node: String,
        workload: String,
        field: String,
        value: String,
        #[source]
        source: QuantityError,
    },

    #[error("node {node} is reported more than once")]
    DuplicateNode { node: String },
}

impl CollectError {
    /// Transient failures a caller may retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, CollectError::CollectionFailed { .. })
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            CollectError::CollectionFailed { .. } => "collection_failed",
            CollectError::InvalidNodeCapacity { .. } => "invalid_node_capacity",
            CollectError::MalformedResourceQuantity { .. } => "malformed_resource_quantity",
            CollectError::DuplicateNode { .. } => "duplicate_node",
        }
    }
}

/// Read-only view of the cluster used by the collector
#[async_trait]
pub trait ClusterSource: Send + Sync {
    /// List every node with its allocatable capacity
    async fn list_nodes(&self) -> Result<Vec<NodeCapacity>, SourceError>;

    /// List the workloads currently assigned to a node
    async fn list_workloads_on_node(&self, node_name: &str) -> Result<Vec<WorkloadRequest>, SourceError>;
}

/// Builds resource snapshots from a cluster source
#[derive(Clone)]
pub struct UsageCollector {
    source: Arc<dyn ClusterSource>,
    query_timeout: Duration,
}

impl UsageCollector {
    pub fn new(source: Arc<dyn ClusterSource>) -> Self {
        Self {
            source,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Bound every individual source query by `timeout`
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Collect a point-in-time snapshot of every node
    pub async fn collect_usage(&self) -> Result<ResourceSnapshot, CollectError> {
        let nodes = self
            .query("listing nodes".to_string(), self.source.list_nodes())
            .await?;

        let mut seen = HashSet::with_capacity(nodes.len());
        if let Some(duplicate) = nodes.iter().find(|n| !seen.insert(n.name.as_str())) {
            return Err(CollectError::DuplicateNode {
                node: duplicate.name.clone(),
            });
        }

        let mut snapshots = Vec::with_capacity(nodes.len());
        for node in nodes {
            let allocatable_cpu =
                allocatable(&node.name, Resource::Cpu, node.allocatable_cpu.as_ref())?;
            let allocatable_memory =
                allocatable(&node.name, Resource::Memory, node.allocatable_memory.as_ref())?;

            let workloads = self
                .query(
                    format!("listing workloads on node {}", node.name),
                    self.source.list_workloads_on_node(&node.name),
                )
                .await?;

            let (requested_cpu, requested_memory) = sum_requests(&node.name, &workloads)?;

            let usage = NodeUsageSnapshot {
                cpu_usage_ratio: requested_cpu / allocatable_cpu,
                memory_usage_ratio: requested_memory / allocatable_memory,
                workload_count: workloads.len(),
                allocatable_cpu_cores: allocatable_cpu,
                requested_cpu_cores: requested_cpu,
                allocatable_memory_bytes: allocatable_memory,
                requested_memory_bytes: requested_memory,
                name: node.name,
            };

            debug!(
                node = %usage.name,
                cpu_ratio = usage.cpu_usage_ratio,
                memory_ratio = usage.memory_usage_ratio,
                workloads = usage.workload_count,
                "Node usage reduced"
            );
            snapshots.push(usage);
        }

        let snapshot = ResourceSnapshot::new(snapshots);
        info!(
            nodes = snapshot.nodes.len(),
            workloads = snapshot.total_workloads(),
            "Collected resource snapshot"
        );
        Ok(snapshot)
    }

    async fn query<T>(
        &self,
        operation: String,
        request: impl Future<Output = Result<T, SourceError>>,
    ) -> Result<T, CollectError> {
        match tokio::time::timeout(self.query_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CollectError::CollectionFailed {
                operation,
                reason: e.to_string(),
            }),
            Err(_) => Err(CollectError::CollectionFailed {
                operation,
                reason: format!("timed out after {:?}", self.query_timeout),
            }),
        }
    }
}

fn allocatable(node: &str, resource: Resource, value: Option<&Quantity>) -> Result<f64, CollectError> {
    let invalid = |reason: String| CollectError::InvalidNodeCapacity {
        node: node.to_string(),
        resource,
        reason,
    };

    let quantity = value.ok_or_else(|| invalid("not reported".to_string()))?;
    let parsed = match resource {
        Resource::Cpu => quantity.to_cores(),
        Resource::Memory => quantity.to_bytes(),
    }
    .map_err(|e| invalid(format!("{:?} is unparseable: {e}", quantity.as_str())))?;

    if parsed <= 0.0 || !parsed.is_finite() {
        return Err(invalid(format!("{} must be greater than zero", quantity)));
    }
    Ok(parsed)
}

/// Sum container requests across all workloads on a node
fn sum_requests(node: &str, workloads: &[WorkloadRequest]) -> Result<(f64, f64), CollectError> {
    let mut cpu = 0.0;
    let mut memory = 0.0;

    for workload in workloads {
        for container in &workload.containers {
            if let Some(q) = &container.cpu_request {
                cpu = accumulate(cpu, q, q.to_cores())
                    .map_err(|e| malformed(node, workload, &container.name, Resource::Cpu, q, e))?;
            }
            if let Some(q) = &container.memory_request {
                memory = accumulate(memory, q, q.to_bytes())
                    .map_err(|e| malformed(node, workload, &container.name, Resource::Memory, q, e))?;
            }
        }
    }

    Ok((cpu, memory))
}

/// Add a parsed request to a running total; the total must stay finite
fn accumulate(
    total: f64,
    quantity: &Quantity,
    parsed: Result<f64, QuantityError>,
) -> Result<f64, QuantityError> {
    let sum = total + parsed?;
    if sum.is_finite() {
        Ok(sum)
    } else {
        Err(QuantityError::OutOfRange(quantity.to_string()))
    }
}

fn malformed(
    node: &str,
    workload: &WorkloadRequest,
    container: &str,
    resource: Resource,
    value: &Quantity,
    source: QuantityError,
) -> CollectError {
    CollectError::MalformedResourceQuantity {
        node: node.to_string(),
        workload: workload.qualified_name(),
        field: format!("{}.{}", container, resource),
        value: value.to_string(),
        source,
    }
}
