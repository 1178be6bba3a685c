//! Full admission review runs against a mock cluster.
//!
//! Each test serializes a complete AdmissionReview envelope, feeds it to the
//! production `admit` function, and inspects the response the API server
//! would receive.

use ingress_admission_controller::error::Error;
use ingress_admission_controller::webhooks::{AdmissionResponse, admit};

use crate::mock_gateway::{
    MockCluster, REVIEW_UID, ingress, ingress_with_rules, review_body,
    review_body_with_operation, rule,
};

// ============================================================================
// Hostname Policy Tests
// ============================================================================

/// Test that a rule without a host is denied.
#[tokio::test]
async fn test_empty_hostname_is_denied() {
    let cluster = MockCluster::new();
    let body = review_body(&ingress("default", "web", "", &["/"]));

    let response = admit(&cluster, &body).await.unwrap();

    assert!(!response.allowed);
    assert_eq!(response.result.reason, "Forbidden");
    assert!(response.result.message.contains("default:web"));
    assert!(response.result.message.contains("empty hostname"));
}

/// Test that the catch-all wildcard host is denied.
#[tokio::test]
async fn test_wildcard_hostname_is_denied() {
    let cluster = MockCluster::new();
    let body = review_body(&ingress("default", "web", "*", &["/"]));

    let response = admit(&cluster, &body).await.unwrap();

    assert!(!response.allowed);
    assert_eq!(response.result.reason, "Forbidden");
    assert!(response.result.message.contains("wildcard hostname"));
}

/// Test that localhost is denied regardless of casing.
#[tokio::test]
async fn test_localhost_hostname_is_denied_case_insensitively() {
    let cluster = MockCluster::new();
    let body = review_body(&ingress("default", "web", "LocalHost", &["/"]));

    let response = admit(&cluster, &body).await.unwrap();

    assert!(!response.allowed);
    assert_eq!(response.result.reason, "Forbidden");
    assert!(response.result.message.contains("localhost hostname"));
}

/// Test that only the first violating rule is reported.
#[tokio::test]
async fn test_first_violating_rule_is_reported() {
    let cluster = MockCluster::new();
    let candidate = ingress_with_rules(
        "default",
        "web",
        vec![rule("*", &["/"]), rule("localhost", &["/"])],
    );

    let response = admit(&cluster, &review_body(&candidate)).await.unwrap();

    assert!(!response.allowed);
    assert!(response.result.message.contains("wildcard hostname"));
    assert!(!response.result.message.contains("localhost"));
}

/// Test that a hostname violation denies without scanning the cluster, even
/// when a later rule would also collide with an existing ingress.
#[tokio::test]
async fn test_hostname_violation_skips_duplicate_scan() {
    let cluster = MockCluster::new().with_ingress(ingress("a", "x", "app.example.com", &["/"]));
    let candidate = ingress_with_rules(
        "default",
        "web",
        vec![rule("", &["/"]), rule("app.example.com", &["/"])],
    );

    let response = admit(&cluster, &review_body(&candidate)).await.unwrap();

    assert!(!response.allowed);
    assert_eq!(response.result.reason, "Forbidden");
    assert_eq!(cluster.namespace_scans(), 0);
}

// ============================================================================
// Duplicate Detection Tests
// ============================================================================

/// Test that claiming a host and path owned by another ingress is denied.
#[tokio::test]
async fn test_duplicate_host_and_path_is_denied() {
    let cluster = MockCluster::new().with_ingress(ingress("a", "x", "app.example.com", &["/foo"]));
    let body = review_body(&ingress("b", "y", "app.example.com", &["/foo"]));

    let response = admit(&cluster, &body).await.unwrap();

    assert!(!response.allowed);
    assert_eq!(response.result.reason, "AlreadyExists");
    assert!(response.result.message.contains("duplicate hostnames"));
    assert!(response.result.message.contains("a:x"));
}

/// Test that an update is not flagged as a duplicate of its own stored copy.
#[tokio::test]
async fn test_update_does_not_conflict_with_itself() {
    let cluster = MockCluster::new().with_ingress(ingress("a", "x", "app.example.com", &["/foo"]));
    let unchanged = ingress("a", "x", "app.example.com", &["/foo"]);
    let body = review_body_with_operation(&unchanged, "UPDATE");

    let response = admit(&cluster, &body).await.unwrap();

    assert!(response.allowed);
    assert!(response.result.message.is_empty());
    assert!(response.result.reason.is_empty());
}

/// Test that sharing a host is fine as long as the paths differ.
#[tokio::test]
async fn test_same_host_different_path_is_allowed() {
    let cluster = MockCluster::new().with_ingress(ingress("a", "x", "app.example.com", &["/foo"]));
    let body = review_body(&ingress("b", "y", "app.example.com", &["/bar"]));

    let response = admit(&cluster, &body).await.unwrap();

    assert!(response.allowed);
}

/// Test that a conflict in the first scanned namespace wins over a later one.
#[tokio::test]
async fn test_first_conflict_found_is_reported() {
    let cluster = MockCluster::new()
        .with_ingress(ingress("a", "x", "app.example.com", &["/"]))
        .with_ingress(ingress("b", "y", "app.example.com", &["/"]));
    let body = review_body(&ingress("c", "z", "app.example.com", &["/"]));

    let response = admit(&cluster, &body).await.unwrap();

    assert!(!response.allowed);
    assert!(response.result.message.contains("a:x"));
    assert!(!response.result.message.contains("b:y"));
}

/// Test that an ingress without any rules passes every check.
#[tokio::test]
async fn test_ingress_without_rules_is_allowed() {
    let cluster = MockCluster::new().with_ingress(ingress("a", "x", "app.example.com", &["/"]));
    let body = review_body(&ingress_with_rules("default", "web", vec![]));

    let response = admit(&cluster, &body).await.unwrap();

    assert!(response.allowed);
    assert_eq!(cluster.namespace_scans(), 0);
}

// ============================================================================
// Scan Failure Tests
// ============================================================================

/// Test that a failed namespace listing denies the request rather than
/// letting an unverified hostname through.
#[tokio::test]
async fn test_namespace_scan_failure_denies_with_internal_error() {
    let cluster = MockCluster::new().fail_namespace_list();
    let body = review_body(&ingress("default", "web", "app.example.com", &["/"]));

    let response = admit(&cluster, &body).await.unwrap();

    assert!(!response.allowed);
    assert_eq!(response.result.reason, "InternalError");
    assert!(response.result.message.contains("could not verify"));
}

/// Test that a failed ingress listing partway through the scan also denies.
#[tokio::test]
async fn test_ingress_scan_failure_denies_with_internal_error() {
    let cluster = MockCluster::new()
        .with_ingress(ingress("a", "x", "other.example.com", &["/"]))
        .with_namespace("b")
        .fail_ingress_list("b");
    let body = review_body(&ingress("default", "web", "app.example.com", &["/"]));

    let response = admit(&cluster, &body).await.unwrap();

    assert!(!response.allowed);
    assert_eq!(response.result.reason, "InternalError");
    assert!(response.result.message.contains("could not verify"));
}

// ============================================================================
// Protocol Violation Tests
// ============================================================================

/// Test that an unparsable envelope is an error, not a verdict.
#[tokio::test]
async fn test_malformed_review_is_an_error() {
    let cluster = MockCluster::new();

    let result = admit(&cluster, b"not an admission review").await;

    assert!(matches!(result, Err(Error::MalformedReview(_))));
}

/// Test that a review for some other resource type is refused outright.
#[tokio::test]
async fn test_review_for_another_resource_is_refused() {
    let cluster = MockCluster::new();
    let body = review_body(&ingress("default", "web", "app.example.com", &["/"]));
    let mut review: serde_json::Value = serde_json::from_slice(&body).unwrap();
    review["request"]["resource"] =
        serde_json::json!({"group": "apps", "version": "v1", "resource": "deployments"});

    let result = admit(&cluster, &serde_json::to_vec(&review).unwrap()).await;

    assert!(matches!(result, Err(Error::UnexpectedResource(_))));
    assert_eq!(cluster.namespace_scans(), 0);
}

// ============================================================================
// Response Envelope Tests
// ============================================================================

/// Test that responses carry the request uid back, allowed or not.
#[tokio::test]
async fn test_response_echoes_request_uid() {
    let cluster = MockCluster::new();

    let allowed: AdmissionResponse = admit(
        &cluster,
        &review_body(&ingress("default", "web", "app.example.com", &["/"])),
    )
    .await
    .unwrap();
    assert!(allowed.allowed);
    assert_eq!(allowed.uid, REVIEW_UID);

    let denied = admit(&cluster, &review_body(&ingress("default", "web", "*", &["/"])))
        .await
        .unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.uid, REVIEW_UID);
}
