//! Resource Advisor - node capacity recommendation service
//!
//! Runs inside or alongside a Kubernetes cluster and answers usage and
//! analysis queries from live node and pod data.

use advisor_lib::{
    health::{components, HealthRegistry},
    observability::{AdvisorMetrics, StructuredLogger},
    KubeClusterSource, UsageCollector,
};
use anyhow::{Context, Result};
use resource_advisor::{api, config::AdvisorConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ADVISOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting resource-advisor");

    let config = AdvisorConfig::load()?;
    let policy = config.policy()?;
    info!(
        instance = %config.instance_name,
        port = config.api_port,
        timeout_secs = config.request_timeout_secs,
        "Advisor configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::CLUSTER_SOURCE).await;
    health_registry.register(components::ANALYZER).await;

    let metrics = AdvisorMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);

    let source = KubeClusterSource::connect(&config.cluster_config())
        .await
        .context("Failed to configure cluster API client")?;
    let collector =
        UsageCollector::new(Arc::new(source)).with_query_timeout(config.request_timeout());

    let app_state = Arc::new(api::AppState::new(
        collector,
        policy,
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    health_registry.set_ready(true).await;
    logger.log_startup(ADVISOR_VERSION, config.api_port);

    tokio::select! {
        result = api::serve(config.api_port, app_state) => {
            result.context("API server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
