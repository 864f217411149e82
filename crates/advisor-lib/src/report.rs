//! External representation of snapshots and recommendations
//!
//! Ratios are rendered as two-decimal percentages (`"73.42%"`), node order is
//! preserved and recommendation text is passed through verbatim.

use crate::models::{Recommendation, ResourceSnapshot};
use serde::{Deserialize, Serialize};

/// Error parsing a percentage string back into a ratio
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid percentage {0:?}")]
pub struct PercentageError(pub String);

/// Format a ratio as a two-decimal percentage, e.g. `0.7342` -> `"73.42%"`
pub fn format_percentage(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Parse a percentage string produced by [`format_percentage`] back into a ratio
pub fn parse_percentage(text: &str) -> Result<f64, PercentageError> {
    let number = text
        .trim()
        .strip_suffix('%')
        .ok_or_else(|| PercentageError(text.to_string()))?;

    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v / 100.0)
        .ok_or_else(|| PercentageError(text.to_string()))
}

/// Per-node usage entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeUsage {
    pub name: String,
    pub cpu_usage: String,
    pub memory_usage: String,
    pub pod_count: usize,
}

/// Usage report for every node in the cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub nodes: Vec<NodeUsage>,
}

impl From<&ResourceSnapshot> for ResourceUsage {
    fn from(snapshot: &ResourceSnapshot) -> Self {
        let nodes = snapshot
            .nodes
            .iter()
            .map(|node| NodeUsage {
                name: node.name.clone(),
                cpu_usage: format_percentage(node.cpu_usage_ratio),
                memory_usage: format_percentage(node.memory_usage_ratio),
                pod_count: node.workload_count,
            })
            .collect();

        Self { nodes }
    }
}

/// Analysis report: recommendation texts in evaluation order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAnalysis {
    pub recommendations: Vec<String>,
}

impl From<&[Recommendation]> for ResourceAnalysis {
    fn from(recommendations: &[Recommendation]) -> Self {
        Self {
            recommendations: recommendations.iter().map(|r| r.message.clone()).collect(),
        }
    }
}
