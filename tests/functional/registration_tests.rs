//! Webhook registration cycles against a mock cluster.
//!
//! These tests cover the install sequence each replica runs at startup:
//! look up any stored registration, replace it, and tolerate the races that
//! happen when several replicas start at once.

use std::sync::Arc;

use ingress_admission_controller::config::Config;
use ingress_admission_controller::gateway::ClusterGateway;
use ingress_admission_controller::registration::{
    self, WEBHOOK_CONFIG_NAME, install, webhook_configuration,
};

use crate::mock_gateway::MockCluster;

/// Test that a fresh cluster ends up with exactly one registration, shaped
/// to intercept ingress writes and call back into the webhook service.
#[tokio::test]
async fn test_fresh_install_creates_the_registration() {
    let cluster = MockCluster::new();
    let config = Config::default();

    install(&cluster, &config, b"ca-pem".to_vec()).await.unwrap();

    let stored = cluster.stored_webhook_configs();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].metadata.name.as_deref(), Some(WEBHOOK_CONFIG_NAME));
    assert!(cluster.deleted_names().is_empty());

    let webhooks = stored[0].webhooks.as_ref().unwrap();
    assert_eq!(webhooks.len(), 1);
    let rules = webhooks[0].rules.as_ref().unwrap();
    assert_eq!(
        rules[0].operations,
        Some(vec!["CREATE".to_string(), "UPDATE".to_string()])
    );
    assert_eq!(rules[0].resources, Some(vec!["ingresses".to_string()]));
    let service = webhooks[0].client_config.service.as_ref().unwrap();
    assert_eq!(service.name, config.service_name);
    assert_eq!(service.namespace, config.service_namespace);
    assert_eq!(
        webhooks[0].client_config.ca_bundle.as_ref().unwrap().0,
        b"ca-pem"
    );
}

/// Test that a registration left over from an earlier run is replaced,
/// picking up the current trust bundle.
#[tokio::test]
async fn test_stale_registration_is_replaced() {
    let config = Config::default();
    let cluster = MockCluster::new()
        .with_webhook_config(webhook_configuration(&config, b"stale".to_vec()));

    install(&cluster, &config, b"fresh".to_vec()).await.unwrap();

    assert_eq!(cluster.deleted_names(), vec![WEBHOOK_CONFIG_NAME]);
    let stored = cluster.stored_webhook_configs();
    assert_eq!(stored.len(), 1);
    let webhooks = stored[0].webhooks.as_ref().unwrap();
    let ca = webhooks[0].client_config.ca_bundle.as_ref().unwrap();
    assert_eq!(ca.0, b"fresh");
}

/// Test that running the install twice still leaves a single registration.
#[tokio::test]
async fn test_reinstall_is_idempotent() {
    let cluster = MockCluster::new();
    let config = Config::default();

    install(&cluster, &config, b"ca-pem".to_vec()).await.unwrap();
    install(&cluster, &config, b"ca-pem".to_vec()).await.unwrap();

    assert_eq!(cluster.stored_webhook_configs().len(), 1);
    assert_eq!(cluster.deleted_names(), vec![WEBHOOK_CONFIG_NAME]);
}

/// Test that losing the delete race to another replica does not abort the
/// install.
#[tokio::test]
async fn test_delete_race_is_tolerated() {
    let config = Config::default();
    let cluster = MockCluster::new()
        .with_webhook_config(webhook_configuration(&config, b"stale".to_vec()))
        .webhook_config_delete_races();

    install(&cluster, &config, b"fresh".to_vec()).await.unwrap();

    assert_eq!(cluster.stored_webhook_configs().len(), 1);
}

/// Test that a failed registration lookup aborts the install.
#[tokio::test]
async fn test_lookup_failure_aborts_the_install() {
    let cluster = MockCluster::new().fail_webhook_config_get();
    let config = Config::default();

    let result = install(&cluster, &config, b"ca-pem".to_vec()).await;

    assert!(result.is_err());
    assert!(cluster.stored_webhook_configs().is_empty());
}

/// Test that a failed creation aborts the install.
#[tokio::test]
async fn test_create_failure_aborts_the_install() {
    let cluster = MockCluster::new().fail_webhook_config_create();
    let config = Config::default();

    let result = install(&cluster, &config, b"ca-pem".to_vec()).await;

    assert!(result.is_err());
    assert!(cluster.stored_webhook_configs().is_empty());
}

/// Test the full startup task: wait out the grace period, then install.
/// The paused clock fast-forwards the delay.
#[tokio::test(start_paused = true)]
async fn test_run_waits_out_the_grace_period_then_installs() {
    let cluster = Arc::new(MockCluster::new());
    let gateway: Arc<dyn ClusterGateway> = cluster.clone();

    registration::run(gateway, Config::default(), b"ca-pem".to_vec())
        .await
        .unwrap();

    assert_eq!(cluster.stored_webhook_configs().len(), 1);
}
