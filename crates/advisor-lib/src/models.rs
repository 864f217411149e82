//! Core data models for the resource advisor

use crate::quantity::Quantity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node capacity as reported by the cluster API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCapacity {
    pub name: String,
    pub allocatable_cpu: Option<Quantity>,
    pub allocatable_memory: Option<Quantity>,
}

/// A workload instance (pod) scheduled on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadRequest {
    pub name: String,
    pub namespace: String,
    pub containers: Vec<ContainerRequest>,
}

impl WorkloadRequest {
    /// Qualified `namespace/name` identifier used in error reports
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

/// Resource requests declared by a single container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerRequest {
    pub name: String,
    pub cpu_request: Option<Quantity>,
    pub memory_request: Option<Quantity>,
}

/// Point-in-time utilization of one node, derived from requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeUsageSnapshot {
    pub name: String,
    /// Requested CPU over allocatable CPU. Not clamped, over-commitment exceeds 1.0.
    pub cpu_usage_ratio: f64,
    /// Requested memory over allocatable memory. Not clamped.
    pub memory_usage_ratio: f64,
    pub workload_count: usize,
    pub allocatable_cpu_cores: f64,
    pub requested_cpu_cores: f64,
    pub allocatable_memory_bytes: f64,
    pub requested_memory_bytes: f64,
}

impl NodeUsageSnapshot {
    /// Ratio for the given resource dimension
    pub fn ratio(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Cpu => self.cpu_usage_ratio,
            Resource::Memory => self.memory_usage_ratio,
        }
    }
}

/// Utilization of every node, in the order the cluster API listed them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub nodes: Vec<NodeUsageSnapshot>,
    pub collected_at: DateTime<Utc>,
}

impl ResourceSnapshot {
    pub fn new(nodes: Vec<NodeUsageSnapshot>) -> Self {
        Self {
            nodes,
            collected_at: Utc::now(),
        }
    }

    pub fn total_workloads(&self) -> usize {
        self.nodes.iter().map(|n| n.workload_count).sum()
    }
}

/// Resource dimension analysed per node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Cpu,
    Memory,
}

impl Resource {
    /// Evaluation order within a node
    pub const ALL: [Resource; 2] = [Resource::Cpu, Resource::Memory];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Cpu => "cpu",
            Resource::Memory => "memory",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold band a ratio fell into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Low,
    High,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Low => "low",
            Band::High => "high",
        }
    }
}

/// A capacity recommendation for one node, resource and band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub node: String,
    pub resource: Resource,
    pub band: Band,
    pub ratio: f64,
    pub message: String,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
