//! HTTP API exposing usage snapshots, analysis, health and Prometheus metrics

use advisor_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    observability::{AdvisorMetrics, StructuredLogger},
    AnalyzeError, ChatIntent, ChatRequest, ChatResponse, CollectError, Recommendation,
    ResourceAnalysis, ResourceSnapshot, ResourceUsage, UsageCollector, UtilizationPolicy,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub collector: UsageCollector,
    pub policy: UtilizationPolicy,
    pub health_registry: HealthRegistry,
    pub metrics: AdvisorMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        collector: UsageCollector,
        policy: UtilizationPolicy,
        health_registry: HealthRegistry,
        metrics: AdvisorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            collector,
            policy,
            health_registry,
            metrics,
            logger,
        }
    }

    /// Collect a fresh snapshot, recording metrics and source health
    async fn snapshot(&self) -> Result<ResourceSnapshot, ApiError> {
        let start = Instant::now();
        let result = self.collector.collect_usage().await;
        let elapsed = start.elapsed();

        match result {
            Ok(snapshot) => {
                self.metrics.record_snapshot(&snapshot, elapsed.as_secs_f64());
                self.logger.log_usage_collected(&snapshot, elapsed.as_millis());
                self.health_registry
                    .set_healthy(components::CLUSTER_SOURCE)
                    .await;
                Ok(snapshot)
            }
            Err(e) => {
                self.metrics.record_collection_error(&e, elapsed.as_secs_f64());
                self.logger.log_collection_failed(&e);
                self.health_registry
                    .set_degraded(components::CLUSTER_SOURCE, e.to_string())
                    .await;
                Err(ApiError::Collect(e))
            }
        }
    }

    /// Collect and analyze in one pass
    async fn recommendations(&self) -> Result<Vec<Recommendation>, ApiError> {
        let snapshot = self.snapshot().await?;

        match self.policy.analyze(&snapshot) {
            Ok(recommendations) => {
                self.metrics.record_recommendations(&recommendations);
                self.logger.log_analysis(&snapshot, &recommendations);
                self.health_registry.set_healthy(components::ANALYZER).await;
                Ok(recommendations)
            }
            Err(e) => {
                self.health_registry
                    .set_degraded(components::ANALYZER, e.to_string())
                    .await;
                Err(ApiError::Analyze(e))
            }
        }
    }
}

/// Error body returned for failed requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failures surfaced by the API handlers
#[derive(Debug)]
pub enum ApiError {
    Collect(CollectError),
    Analyze(AnalyzeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Collect(e) => {
                let status = if e.is_retryable() {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::UNPROCESSABLE_ENTITY
                };
                let details = match e {
                    CollectError::CollectionFailed { .. } => {
                        Some("The cluster API could not be queried; retry later".to_string())
                    }
                    CollectError::InvalidNodeCapacity { node, .. }
                    | CollectError::DuplicateNode { node } => Some(format!("node={node}")),
                    CollectError::MalformedResourceQuantity {
                        node, workload, field, ..
                    } => Some(format!("node={node} workload={workload} field={field}")),
                };
                (
                    status,
                    ErrorResponse {
                        error: e.to_string(),
                        code: e.code().to_string(),
                        details,
                    },
                )
            }
            ApiError::Analyze(e) => {
                error!(error = %e, "Analyzer rejected snapshot");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: e.to_string(),
                        code: "invalid_snapshot".to_string(),
                        details: None,
                    },
                )
            }
        };

        if status == StatusCode::SERVICE_UNAVAILABLE {
            (status, [(header::RETRY_AFTER, "5")], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Welcome to the Node Resource Advisor! Ask about resource usage or optimization."
    }))
}

/// Per-node usage report
async fn resources(State(state): State<Arc<AppState>>) -> Result<Json<ResourceUsage>, ApiError> {
    let snapshot = state.snapshot().await?;
    Ok(Json(ResourceUsage::from(&snapshot)))
}

/// Threshold analysis of a fresh snapshot
async fn analyze(State(state): State<Arc<AppState>>) -> Result<Json<ResourceAnalysis>, ApiError> {
    let recommendations = state.recommendations().await?;
    Ok(Json(ResourceAnalysis::from(recommendations.as_slice())))
}

/// Keyword-routed chat over the usage and analysis endpoints
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let reply = match ChatIntent::classify(&request.message) {
        ChatIntent::Usage => {
            let snapshot = state.snapshot().await?;
            ChatResponse::usage(ResourceUsage::from(&snapshot))
        }
        ChatIntent::Analysis => {
            let recommendations = state.recommendations().await?;
            ChatResponse::analysis(ResourceAnalysis::from(recommendations.as_slice()))
        }
        ChatIntent::Unknown => ChatResponse::help(),
    };

    Ok(Json(reply))
}

/// Returns 200 unless a component is unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    match encoder.encode(&prometheus::gather(), &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            buffer,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/v1/resources", get(resources))
        .route("/api/v1/analyze", get(analyze))
        .route("/api/v1/chat", post(chat))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
