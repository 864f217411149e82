//! In-memory cluster source
//!
//! Serves a fixed set of nodes and workloads. Used for offline analysis of
//! exported cluster state and as a test double for the HTTP layer.

use super::{async_trait, ClusterSource, SourceError};
use crate::models::{ContainerRequest, NodeCapacity, WorkloadRequest};
use crate::quantity::Quantity;
use serde::{Deserialize, Serialize};

/// A node together with the workloads assigned to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticNode {
    pub capacity: NodeCapacity,
    #[serde(default)]
    pub workloads: Vec<WorkloadRequest>,
}

/// Cluster source backed by an in-memory node list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticClusterSource {
    nodes: Vec<StaticNode>,
}

impl StaticClusterSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the given allocatable CPU and memory quantities
    pub fn with_node(mut self, name: &str, cpu: &str, memory: &str) -> Self {
        self.nodes.push(StaticNode {
            capacity: NodeCapacity {
                name: name.to_string(),
                allocatable_cpu: Some(Quantity::from(cpu)),
                allocatable_memory: Some(Quantity::from(memory)),
            },
            workloads: Vec::new(),
        });
        self
    }

    /// Add a node with an arbitrary capacity record
    pub fn with_capacity(mut self, capacity: NodeCapacity) -> Self {
        self.nodes.push(StaticNode {
            capacity,
            workloads: Vec::new(),
        });
        self
    }

    /// Schedule a single-container workload on `node`; the node must exist
    pub fn with_workload(self, node: &str, name: &str, cpu: Option<&str>, memory: Option<&str>) -> Self {
        self.with_containers(
            node,
            name,
            vec![ContainerRequest {
                name: "main".to_string(),
                cpu_request: cpu.map(Quantity::from),
                memory_request: memory.map(Quantity::from),
            }],
        )
    }

    /// Schedule a workload with several containers on `node`
    ///
    /// # Panics
    ///
    /// Panics if `node` has not been added to the source yet.
    pub fn with_containers(mut self, node: &str, name: &str, containers: Vec<ContainerRequest>) -> Self {
        let Some(entry) = self.nodes.iter_mut().find(|n| n.capacity.name == node) else {
            panic!("workload {name} scheduled on unknown node {node}; add the node first");
        };
        entry.workloads.push(WorkloadRequest {
            name: name.to_string(),
            namespace: "default".to_string(),
            containers,
        });
        self
    }
}

#[async_trait]
impl ClusterSource for StaticClusterSource {
    async fn list_nodes(&self) -> Result<Vec<NodeCapacity>, SourceError> {
        Ok(self.nodes.iter().map(|n| n.capacity.clone()).collect())
    }

    async fn list_workloads_on_node(&self, node_name: &str) -> Result<Vec<WorkloadRequest>, SourceError> {
        Ok(self
            .nodes
            .iter()
            .find(|n| n.capacity.name == node_name)
            .map(|n| n.workloads.clone())
            .unwrap_or_default())
    }
}
