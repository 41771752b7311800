use std::time::Duration;

use assertables::*;
use httpmock::prelude::*;
use kl_core::constants::*;
use kl_core::errors::AgentError;
use kl_core::identity::Identity;
use kl_testutils::*;
use rstest::*;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::tree::Cluster;
use crate::tree::namespace::Namespace;

fn pods_path() -> String {
    format!("/api/v1/namespaces/{TEST_NAMESPACE}/pods")
}

fn log_path() -> String {
    format!("/api/v1/namespaces/{TEST_NAMESPACE}/pods/{TEST_WORKLOAD}/log")
}

#[rstest]
#[tokio::test]
async fn test_namespace_spawn_watches_workloads() {
    let server = StreamServer::start().await;
    let _gate = server.serve_held(&pods_path(), 200, "");

    let (ctx, _) = recording_context(&server.url());
    let namespace = Namespace::spawn(
        ctx,
        &Identity::for_cluster(TEST_CLUSTER),
        &CancellationToken::new(),
        TEST_NAMESPACE,
    )
    .await
    .unwrap();

    assert_eq!(server.requests(), vec![format!("{}?watch=true", pods_path())]);

    let scope = namespace.scope().clone();
    drop(namespace);
    assert!(scope.is_cancelled());
}

#[rstest]
#[tokio::test]
async fn test_namespace_spawn_fails_on_rejected_stream() {
    let mut fake = MockServerBuilder::new();
    fake.handle(|when, then| {
        when.method(GET).path(pods_path());
        then.status(500);
    });

    let (ctx, _) = recording_context(fake.url().as_str());
    let err = Namespace::spawn(
        ctx,
        &Identity::for_cluster(TEST_CLUSTER),
        &CancellationToken::new(),
        TEST_NAMESPACE,
    )
    .await
    .unwrap_err();

    assert!(matches!(err.downcast_ref(), Some(AgentError::UpstreamRejected(_))));
}

#[rstest]
#[tokio::test]
async fn test_cluster_end_to_end() {
    let server = StreamServer::start().await;
    let _ns_gate = server.serve_held("/api/v1/namespaces", 200, watch_body(&[namespace_event("ADDED", TEST_NAMESPACE)]));
    let _pods_gate = server.serve_held(
        &pods_path(),
        200,
        watch_body(&[with_annotations(
            workload_event("ADDED", TEST_WORKLOAD, &[(TEST_CONTAINER, TEST_CONTAINER_ID)]),
            &[
                (LOG_FORMAT_ANNOTATION_KEY, "json"),
                (MESSAGE_FIELD_ANNOTATION_KEY, "text"),
            ],
        )]),
    );
    let _log_gate = server.serve_held(
        &log_path(),
        200,
        "2024-01-01T00:00:00Z {\"text\":\"hello\",\"n\":1}\n2024-01-01T00:00:01Z not-json\n",
    );

    let (ctx, emitter) = recording_context(&server.url());
    let root = CancellationToken::new();
    let cluster = Cluster::new(ctx, root.clone()).await.unwrap();
    let task = tokio::spawn(cluster.run());

    let records = emitter.wait_for(2, Duration::from_secs(10)).await.unwrap();

    // Identity accumulated along the path from the root
    let first = &records[0];
    assert_eq!(first.identity.cluster, TEST_CLUSTER);
    assert_eq!(first.identity.namespace, TEST_NAMESPACE);
    assert_eq!(first.identity.workload, TEST_WORKLOAD);
    assert_eq!(first.identity.node, TEST_NODE);
    assert_eq!(first.identity.container_name, TEST_CONTAINER);
    assert_eq!(first.identity.container_id, TEST_CONTAINER_ID);
    assert_eq!(first.identity.labels.get("app").map(String::as_str), Some("nginx"));

    // Promotion picked the annotated field and kept the rest as the payload
    assert_eq!(first.event_time, "2024-01-01T00:00:00Z");
    assert_eq!(first.message, "hello");
    assert_eq!(first.event.as_ref().unwrap()["n"], json!(1));

    // The non-JSON line fell back to the raw message
    assert_eq!(records[1].message, "not-json");
    assert_eq!(records[1].event, None);

    // Each level opened the stream its parent's event named
    let requests = server.requests();
    assert_contains!(requests, &"/api/v1/namespaces?watch=true".to_string());
    assert_contains!(requests, &format!("{}?watch=true", pods_path()));

    // Cancelling the root is a graceful shutdown
    root.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[rstest]
#[tokio::test]
async fn test_cluster_root_stream_end_is_fatal() {
    let server = StreamServer::start().await;
    server.serve("/api/v1/namespaces", 200, "");

    let (ctx, _) = recording_context(&server.url());
    let cluster = Cluster::new(ctx, CancellationToken::new()).await.unwrap();

    let err = cluster.run().await.unwrap_err();
    assert!(matches!(err.downcast_ref(), Some(AgentError::UpstreamDisconnected)));
}

#[rstest]
#[tokio::test]
async fn test_cluster_rejected_root_stream_is_fatal() {
    let mut fake = MockServerBuilder::new();
    fake.handle(|when, then| {
        when.method(GET).path("/api/v1/namespaces");
        then.status(500);
    });

    let (ctx, _) = recording_context(fake.url().as_str());
    let err = Cluster::new(ctx, CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err.downcast_ref(), Some(AgentError::UpstreamRejected(_))));
}
