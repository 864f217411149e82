//! Threshold-based utilization analysis
//!
//! Turns a [`ResourceSnapshot`] into text recommendations. The analysis is a
//! pure function of the snapshot and the [`UtilizationPolicy`]: no I/O, no
//! state carried between calls.

use crate::models::{Band, NodeUsageSnapshot, Recommendation, Resource, ResourceSnapshot};
use crate::report::format_percentage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ratios strictly below this are reported as low utilization
pub const DEFAULT_LOW_THRESHOLD: f64 = 0.50;

/// Ratios strictly above this are reported as high utilization
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.80;

/// Errors raised by the analyzer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyzeError {
    #[error("invalid snapshot for node {node}: {reason}")]
    InvalidSnapshot { node: String, reason: String },

    #[error("invalid utilization policy: {reason}")]
    InvalidPolicy { reason: String },
}

/// Low/high band boundaries for one resource dimension.
///
/// Values equal to either boundary fall in the silent band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub low: f64,
    pub high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn new(low: f64, high: f64) -> Result<Self, AnalyzeError> {
        let thresholds = Self { low, high };
        thresholds.validate()?;
        Ok(thresholds)
    }

    fn validate(&self) -> Result<(), AnalyzeError> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(AnalyzeError::InvalidPolicy {
                reason: format!("thresholds must be finite (low={}, high={})", self.low, self.high),
            });
        }
        if self.low < 0.0 || self.low > self.high {
            return Err(AnalyzeError::InvalidPolicy {
                reason: format!(
                    "expected 0 <= low <= high, got low={} high={}",
                    self.low, self.high
                ),
            });
        }
        Ok(())
    }

    /// Band the ratio falls into, or `None` inside `[low, high]`
    pub fn classify(&self, ratio: f64) -> Option<Band> {
        if ratio < self.low {
            Some(Band::Low)
        } else if ratio > self.high {
            Some(Band::High)
        } else {
            None
        }
    }
}

/// Per-dimension threshold policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UtilizationPolicy {
    pub cpu: Thresholds,
    pub memory: Thresholds,
}

impl UtilizationPolicy {
    pub fn new(cpu: Thresholds, memory: Thresholds) -> Result<Self, AnalyzeError> {
        let policy = Self { cpu, memory };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), AnalyzeError> {
        self.cpu.validate()?;
        self.memory.validate()
    }

    pub fn thresholds(&self, resource: Resource) -> &Thresholds {
        match resource {
            Resource::Cpu => &self.cpu,
            Resource::Memory => &self.memory,
        }
    }

    /// Produce recommendations in node order, CPU before memory within a node
    pub fn analyze(&self, snapshot: &ResourceSnapshot) -> Result<Vec<Recommendation>, AnalyzeError> {
        self.validate()?;
        validate_snapshot(snapshot)?;

        let mut recommendations = Vec::new();
        for node in &snapshot.nodes {
            for resource in Resource::ALL {
                let ratio = node.ratio(resource);
                if let Some(band) = self.thresholds(resource).classify(ratio) {
                    recommendations.push(Recommendation {
                        node: node.name.clone(),
                        resource,
                        band,
                        ratio,
                        message: recommendation_text(&node.name, resource, band, ratio),
                    });
                }
            }
        }

        tracing::debug!(
            nodes = snapshot.nodes.len(),
            recommendations = recommendations.len(),
            "Utilization analysis complete"
        );

        Ok(recommendations)
    }
}

/// Analyze a snapshot with the default 50%/80% policy
pub fn analyze(snapshot: &ResourceSnapshot) -> Result<Vec<Recommendation>, AnalyzeError> {
    UtilizationPolicy::default().analyze(snapshot)
}

fn validate_snapshot(snapshot: &ResourceSnapshot) -> Result<(), AnalyzeError> {
    let mut seen = HashSet::with_capacity(snapshot.nodes.len());

    for node in &snapshot.nodes {
        if !seen.insert(node.name.as_str()) {
            return Err(AnalyzeError::InvalidSnapshot {
                node: node.name.clone(),
                reason: "duplicate node name".to_string(),
            });
        }
        check_ratio(node, Resource::Cpu)?;
        check_ratio(node, Resource::Memory)?;
    }

    Ok(())
}

fn check_ratio(node: &NodeUsageSnapshot, resource: Resource) -> Result<(), AnalyzeError> {
    let ratio = node.ratio(resource);
    if ratio.is_finite() && ratio >= 0.0 {
        Ok(())
    } else {
        Err(AnalyzeError::InvalidSnapshot {
            node: node.name.clone(),
            reason: format!("{} usage ratio {} is not a finite non-negative number", resource, ratio),
        })
    }
}

fn recommendation_text(node: &str, resource: Resource, band: Band, ratio: f64) -> String {
    let pct = format_percentage(ratio);
    match (resource, band) {
        (Resource::Cpu, Band::Low) => {
            format!("Node {node} CPU usage is low ({pct}). Consider consolidating workloads.")
        }
        (Resource::Cpu, Band::High) => {
            format!("Node {node} CPU usage is high ({pct}). Monitor for potential bottlenecks.")
        }
        (Resource::Memory, Band::Low) => {
            format!("Node {node} memory usage is low ({pct}). Review memory requests.")
        }
        (Resource::Memory, Band::High) => format!(
            "Node {node} memory usage is high ({pct}). Consider adding more memory or scaling out."
        ),
    }
}
