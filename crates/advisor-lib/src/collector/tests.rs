//! Collector tests against in-memory cluster sources
//!
//! These exercise request aggregation, ratio computation and the
//! all-or-nothing error contract without a running cluster.

#[cfg(test)]
mod usage_collection_tests {
    use crate::analyzer::analyze;
    use crate::collector::{
        async_trait, ClusterSource, CollectError, SourceError, StaticClusterSource, UsageCollector,
    };
    use crate::models::{Band, ContainerRequest, NodeCapacity, Resource, WorkloadRequest};
    use crate::quantity::{Quantity, QuantityError};
    use std::sync::Arc;
    use std::time::Duration;

    const MI: f64 = 1024.0 * 1024.0;

    fn collector(source: impl ClusterSource + 'static) -> UsageCollector {
        UsageCollector::new(Arc::new(source))
    }

    fn container(name: &str, cpu: Option<&str>, memory: Option<&str>) -> ContainerRequest {
        ContainerRequest {
            name: name.to_string(),
            cpu_request: cpu.map(Quantity::from),
            memory_request: memory.map(Quantity::from),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    /// Source whose API server cannot be reached
    struct UnreachableSource;

    #[async_trait]
    impl ClusterSource for UnreachableSource {
        async fn list_nodes(&self) -> Result<Vec<NodeCapacity>, SourceError> {
            Err(SourceError::Unreachable("connection refused".to_string()))
        }

        async fn list_workloads_on_node(&self, _node: &str) -> Result<Vec<WorkloadRequest>, SourceError> {
            Err(SourceError::Unreachable("connection refused".to_string()))
        }
    }

    /// Source that lists nodes but never answers pod queries
    struct StallingSource;

    #[async_trait]
    impl ClusterSource for StallingSource {
        async fn list_nodes(&self) -> Result<Vec<NodeCapacity>, SourceError> {
            Ok(vec![NodeCapacity {
                name: "slow-node".to_string(),
                allocatable_cpu: Some(Quantity::from("4")),
                allocatable_memory: Some(Quantity::from("8Gi")),
            }])
        }

        async fn list_workloads_on_node(&self, _node: &str) -> Result<Vec<WorkloadRequest>, SourceError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    /// Source that fails pod listing for one node only
    struct PartiallyFailingSource {
        inner: StaticClusterSource,
        failing_node: &'static str,
    }

    #[async_trait]
    impl ClusterSource for PartiallyFailingSource {
        async fn list_nodes(&self) -> Result<Vec<NodeCapacity>, SourceError> {
            self.inner.list_nodes().await
        }

        async fn list_workloads_on_node(&self, node: &str) -> Result<Vec<WorkloadRequest>, SourceError> {
            if node == self.failing_node {
                Err(SourceError::Request("etcd leader changed (500)".to_string()))
            } else {
                self.inner.list_workloads_on_node(node).await
            }
        }
    }

    #[tokio::test]
    async fn test_two_small_workloads_on_one_node() {
        let source = StaticClusterSource::new()
            .with_node("worker-1", "4", "8192Mi")
            .with_workload("worker-1", "api-0", Some("500m"), Some("1024Mi"))
            .with_workload("worker-1", "api-1", Some("500m"), Some("1024Mi"));

        let snapshot = collector(source).collect_usage().await.unwrap();
        assert_eq!(snapshot.nodes.len(), 1);

        let node = &snapshot.nodes[0];
        assert_eq!(node.name, "worker-1");
        assert_close(node.cpu_usage_ratio, 0.25);
        assert_close(node.memory_usage_ratio, 0.25);
        assert_eq!(node.workload_count, 2);
        assert_close(node.requested_cpu_cores, 1.0);
        assert_close(node.requested_memory_bytes, 2048.0 * MI);

        let recommendations = analyze(&snapshot).unwrap();
        assert_eq!(recommendations.len(), 2);
        assert_eq!(
            (recommendations[0].resource, recommendations[0].band),
            (Resource::Cpu, Band::Low)
        );
        assert_eq!(
            (recommendations[1].resource, recommendations[1].band),
            (Resource::Memory, Band::Low)
        );
    }

    #[tokio::test]
    async fn test_plain_unit_memory_uses_same_base() {
        let source = StaticClusterSource::new()
            .with_node("worker-1", "4", "8192")
            .with_workload("worker-1", "a", Some("1"), Some("1024"))
            .with_workload("worker-1", "b", Some("1"), Some("1024"));

        let snapshot = collector(source).collect_usage().await.unwrap();
        assert_close(snapshot.nodes[0].memory_usage_ratio, 0.25);
        assert_close(snapshot.nodes[0].cpu_usage_ratio, 0.5);
    }

    #[tokio::test]
    async fn test_high_cpu_with_mid_memory() {
        let source = StaticClusterSource::new()
            .with_node("worker-2", "2", "10Gi")
            .with_workload("worker-2", "batch-0", Some("1"), Some("4Gi"))
            .with_workload("worker-2", "batch-1", Some("900m"), Some("2Gi"));

        let snapshot = collector(source).collect_usage().await.unwrap();
        let node = &snapshot.nodes[0];
        assert_close(node.cpu_usage_ratio, 0.95);
        assert_close(node.memory_usage_ratio, 0.6);

        let recommendations = analyze(&snapshot).unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].resource, Resource::Cpu);
        assert_eq!(recommendations[0].band, Band::High);
    }

    #[tokio::test]
    async fn test_overcommitment_is_not_clamped() {
        let source = StaticClusterSource::new()
            .with_node("packed", "2", "1Gi")
            .with_workload("packed", "a", Some("1500m"), Some("1Gi"))
            .with_workload("packed", "b", Some("1200m"), Some("512Mi"));

        let snapshot = collector(source).collect_usage().await.unwrap();
        assert_close(snapshot.nodes[0].cpu_usage_ratio, 1.35);
        assert_close(snapshot.nodes[0].memory_usage_ratio, 1.5);
    }

    #[tokio::test]
    async fn test_workload_count_ignores_container_count() {
        let source = StaticClusterSource::new()
            .with_node("worker-1", "4", "4Gi")
            .with_containers(
                "worker-1",
                "web-0",
                vec![
                    container("app", Some("250m"), Some("256Mi")),
                    container("proxy", Some("100m"), Some("64Mi")),
                    container("logger", Some("50m"), Some("32Mi")),
                ],
            )
            .with_workload("worker-1", "db-0", Some("1"), Some("1Gi"));

        let snapshot = collector(source).collect_usage().await.unwrap();
        let node = &snapshot.nodes[0];
        assert_eq!(node.workload_count, 2);
        assert_close(node.requested_cpu_cores, 1.4);
        assert_close(node.requested_memory_bytes, (256.0 + 64.0 + 32.0 + 1024.0) * MI);
    }

    #[tokio::test]
    async fn test_missing_requests_contribute_zero() {
        let source = StaticClusterSource::new()
            .with_node("worker-1", "2", "2Gi")
            .with_workload("worker-1", "no-requests", None, None)
            .with_workload("worker-1", "cpu-only", Some("1"), None)
            .with_containers(
                "worker-1",
                "mixed",
                vec![container("app", None, Some("1Gi")), container("init", None, None)],
            );

        let snapshot = collector(source).collect_usage().await.unwrap();
        let node = &snapshot.nodes[0];
        assert_eq!(node.workload_count, 3);
        assert_close(node.cpu_usage_ratio, 0.5);
        assert_close(node.memory_usage_ratio, 0.5);
    }

    #[tokio::test]
    async fn test_empty_node_has_zero_ratios() {
        let source = StaticClusterSource::new().with_node("idle", "8", "32Gi");

        let snapshot = collector(source).collect_usage().await.unwrap();
        assert_eq!(snapshot.nodes[0].workload_count, 0);
        assert_close(snapshot.nodes[0].cpu_usage_ratio, 0.0);
        assert_close(snapshot.nodes[0].memory_usage_ratio, 0.0);
    }

    #[tokio::test]
    async fn test_node_order_follows_source() {
        let source = StaticClusterSource::new()
            .with_node("node-c", "4", "4Gi")
            .with_node("node-a", "4", "4Gi")
            .with_node("node-b", "4", "4Gi");

        let snapshot = collector(source).collect_usage().await.unwrap();
        let names: Vec<_> = snapshot.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["node-c", "node-a", "node-b"]);
    }

    #[tokio::test]
    async fn test_empty_cluster_is_valid_empty_snapshot() {
        let snapshot = collector(StaticClusterSource::new()).collect_usage().await.unwrap();
        assert!(snapshot.nodes.is_empty());
    }

    #[tokio::test]
    async fn test_zero_allocatable_cpu_is_invalid_capacity() {
        let source = StaticClusterSource::new()
            .with_node("healthy", "4", "4Gi")
            .with_node("broken", "0", "4Gi");

        let err = collector(source).collect_usage().await.unwrap_err();
        match err {
            CollectError::InvalidNodeCapacity { node, resource, .. } => {
                assert_eq!(node, "broken");
                assert_eq!(resource, Resource::Cpu);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_allocatable_memory_is_invalid_capacity() {
        let source = StaticClusterSource::new().with_node("broken", "4", "0Mi");

        let err = collector(source).collect_usage().await.unwrap_err();
        assert!(matches!(
            err,
            CollectError::InvalidNodeCapacity { resource: Resource::Memory, .. }
        ));
        assert!(!err.is_retryable());
        assert_eq!(err.code(), "invalid_node_capacity");
    }

    #[tokio::test]
    async fn test_missing_allocatable_is_invalid_capacity() {
        let source = StaticClusterSource::new().with_capacity(NodeCapacity {
            name: "no-status".to_string(),
            allocatable_cpu: Some(Quantity::from("4")),
            allocatable_memory: None,
        });

        let err = collector(source).collect_usage().await.unwrap_err();
        assert!(matches!(
            err,
            CollectError::InvalidNodeCapacity { ref node, resource: Resource::Memory, .. } if node == "no-status"
        ));
    }

    #[tokio::test]
    async fn test_unparseable_allocatable_is_invalid_capacity() {
        let source = StaticClusterSource::new().with_node("weird", "four", "4Gi");

        let err = collector(source).collect_usage().await.unwrap_err();
        assert!(matches!(err, CollectError::InvalidNodeCapacity { .. }));
    }

    #[tokio::test]
    async fn test_malformed_request_names_node_workload_and_field() {
        let source = StaticClusterSource::new()
            .with_node("worker-1", "4", "8Gi")
            .with_workload("worker-1", "good", Some("100m"), Some("128Mi"))
            .with_containers(
                "worker-1",
                "bad",
                vec![container("app", Some("250m"), Some("512MB"))],
            );

        let err = collector(source).collect_usage().await.unwrap_err();
        match err {
            CollectError::MalformedResourceQuantity {
                node,
                workload,
                field,
                value,
                source,
            } => {
                assert_eq!(node, "worker-1");
                assert_eq!(workload, "default/bad");
                assert_eq!(field, "app.memory");
                assert_eq!(value, "512MB");
                assert_eq!(source, QuantityError::UnknownSuffix("MB".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_cpu_request_is_not_coerced_to_zero() {
        let source = StaticClusterSource::new()
            .with_node("worker-1", "4", "8Gi")
            .with_workload("worker-1", "bad", Some("half"), None);

        let err = collector(source).collect_usage().await.unwrap_err();
        assert!(matches!(
            err,
            CollectError::MalformedResourceQuantity { ref field, .. } if field == "main.cpu"
        ));
        assert_eq!(err.code(), "malformed_resource_quantity");
    }

    #[tokio::test]
    async fn test_overflowing_request_is_malformed_not_infinite() {
        let huge = "9".repeat(400);
        for value in ["1e400", huge.as_str()] {
            let source = StaticClusterSource::new()
                .with_node("worker-1", "4", "8Gi")
                .with_workload("worker-1", "huge", None, Some(value));

            let err = collector(source).collect_usage().await.unwrap_err();
            match err {
                CollectError::MalformedResourceQuantity {
                    workload,
                    field,
                    source,
                    ..
                } => {
                    assert_eq!(workload, "default/huge");
                    assert_eq!(field, "main.memory");
                    assert!(matches!(source, QuantityError::OutOfRange(_)));
                }
                other => panic!("unexpected error for {value}: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_request_total_overflow_is_malformed() {
        let source = StaticClusterSource::new()
            .with_node("worker-1", "4", "8Gi")
            .with_containers(
                "worker-1",
                "pair",
                vec![
                    container("a", Some("1e308"), None),
                    container("b", Some("1e308"), None),
                ],
            );

        let err = collector(source).collect_usage().await.unwrap_err();
        assert!(matches!(
            err,
            CollectError::MalformedResourceQuantity { ref field, .. } if field == "b.cpu"
        ));
    }

    #[tokio::test]
    async fn test_overflowing_allocatable_is_invalid_capacity() {
        let source = StaticClusterSource::new().with_node("worker-1", "1e400", "8Gi");

        let err = collector(source).collect_usage().await.unwrap_err();
        assert!(matches!(
            err,
            CollectError::InvalidNodeCapacity { resource: Resource::Cpu, .. }
        ));
    }

    #[tokio::test]
    async fn test_duplicate_node_names_fail_collection() {
        let source = StaticClusterSource::new()
            .with_node("worker-1", "4", "8Gi")
            .with_node("worker-2", "4", "8Gi")
            .with_node("worker-1", "2", "4Gi");

        let err = collector(source).collect_usage().await.unwrap_err();
        match &err {
            CollectError::DuplicateNode { node } => assert_eq!(node, "worker-1"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.is_retryable());
        assert_eq!(err.code(), "duplicate_node");
    }

    #[test]
    #[should_panic(expected = "unknown node")]
    fn test_workload_on_missing_node_panics() {
        let _ = StaticClusterSource::new()
            .with_node("worker-1", "4", "8Gi")
            .with_workload("worker-9", "typo", Some("100m"), None);
    }

    #[tokio::test]
    async fn test_unreachable_source_fails_collection() {
        let err = collector(UnreachableSource).collect_usage().await.unwrap_err();

        assert!(matches!(err, CollectError::CollectionFailed { .. }));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_stalled_query_times_out_as_collection_failed() {
        let collector = collector(StallingSource).with_query_timeout(Duration::from_millis(20));

        let err = collector.collect_usage().await.unwrap_err();
        match err {
            CollectError::CollectionFailed { operation, reason } => {
                assert!(operation.contains("slow-node"));
                assert!(reason.contains("timed out"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_one_failing_node_fails_whole_collection() {
        let source = PartiallyFailingSource {
            inner: StaticClusterSource::new()
                .with_node("ok-1", "4", "4Gi")
                .with_node("flaky", "4", "4Gi")
                .with_node("ok-2", "4", "4Gi"),
            failing_node: "flaky",
        };

        let err = collector(source).collect_usage().await.unwrap_err();
        assert!(matches!(err, CollectError::CollectionFailed { .. }));
    }
}
