//! Node resource advisor library
//!
//! This crate provides the core functionality for:
//! - Collecting per-node resource requests from the cluster API
//! - Reducing them into utilization snapshots
//! - Threshold analysis producing capacity recommendations
//! - Keyword routing for conversational queries
//! - Health checks and observability

pub mod analyzer;
pub mod chat;
pub mod collector;
pub mod health;
pub mod models;
pub mod observability;
pub mod quantity;
pub mod report;

pub use analyzer::{
    analyze, AnalyzeError, Thresholds, UtilizationPolicy, DEFAULT_HIGH_THRESHOLD,
    DEFAULT_LOW_THRESHOLD,
};
pub use chat::{ChatData, ChatIntent, ChatRequest, ChatResponse};
pub use collector::{
    ClusterConfig, ClusterSource, CollectError, KubeClusterSource, SourceError,
    StaticClusterSource, UsageCollector,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AdvisorMetrics, StructuredLogger};
pub use report::{format_percentage, parse_percentage, ResourceAnalysis, ResourceUsage};
