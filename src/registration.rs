//! Self-registration with the API server.
//!
//! On startup the controller installs its own ValidatingWebhookConfiguration
//! so the API server starts sending ingress reviews to the webhook service.
//! Any previous registration under the same name is deleted first; the
//! replacement carries the current CA bundle, so a redeploy with fresh
//! certificates heals the trust relationship on its own.

use k8s_openapi::ByteString;
use k8s_openapi::api::admissionregistration::v1::{
    RuleWithOperations, ServiceReference, ValidatingWebhook, ValidatingWebhookConfiguration,
    WebhookClientConfig,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::gateway::ClusterGateway;
use crate::webhooks::{INGRESS_API_GROUP, INGRESS_API_VERSION, INGRESS_RESOURCE};

/// Well-known name of the registration object. Replacement happens under
/// this name, so at most one registration from this controller exists.
pub const WEBHOOK_CONFIG_NAME: &str = "k8s-ingress-admission-controller";
/// Name of the webhook entry inside the registration object.
pub const WEBHOOK_NAME: &str = "k8s-ingress-admission-controller.target.k8s.io";

/// Wait before registering so the TLS listener is accepting connections by
/// the time the API server starts calling back. A plain delay, not a
/// readiness handshake.
const STARTUP_DELAY: Duration = Duration::from_secs(10);

/// Register this controller with the API server, after the startup delay.
///
/// An error here means the controller is running but invisible, no reviews
/// will ever arrive. Callers must treat it as fatal.
pub async fn run(
    gateway: Arc<dyn ClusterGateway>,
    config: Config,
    ca_bundle: Vec<u8>,
) -> Result<()> {
    info!(delay_secs = STARTUP_DELAY.as_secs(), "Waiting for webhook server before registering");
    tokio::time::sleep(STARTUP_DELAY).await;
    install(gateway.as_ref(), &config, ca_bundle).await
}

/// Replace any existing registration with a freshly built one.
pub async fn install(
    gateway: &dyn ClusterGateway,
    config: &Config,
    ca_bundle: Vec<u8>,
) -> Result<()> {
    match gateway.get_webhook_config(WEBHOOK_CONFIG_NAME).await {
        Ok(_) => {
            info!(name = WEBHOOK_CONFIG_NAME, "Deleting existing webhook registration");
            if let Err(error) = gateway.delete_webhook_config(WEBHOOK_CONFIG_NAME).await {
                // Another replica may have won the delete race.
                if !error.is_not_found() {
                    return Err(error);
                }
            }
        }
        Err(error) if error.is_not_found() => {
            info!(name = WEBHOOK_CONFIG_NAME, "No existing webhook registration");
        }
        Err(error) => return Err(error),
    }

    gateway
        .create_webhook_config(&webhook_configuration(config, ca_bundle))
        .await?;
    info!(
        name = WEBHOOK_CONFIG_NAME,
        service_namespace = %config.service_namespace,
        service_name = %config.service_name,
        "Webhook registration installed"
    );
    Ok(())
}

/// Build the registration object: intercept CREATE and UPDATE of ingresses
/// and send them to the webhook service, trusting `ca_bundle` for the
/// callback.
pub fn webhook_configuration(
    config: &Config,
    ca_bundle: Vec<u8>,
) -> ValidatingWebhookConfiguration {
    ValidatingWebhookConfiguration {
        metadata: ObjectMeta {
            name: Some(WEBHOOK_CONFIG_NAME.to_string()),
            ..Default::default()
        },
        webhooks: Some(vec![ValidatingWebhook {
            name: WEBHOOK_NAME.to_string(),
            admission_review_versions: vec!["v1".to_string()],
            side_effects: "None".to_string(),
            failure_policy: Some("Fail".to_string()),
            rules: Some(vec![RuleWithOperations {
                operations: Some(vec!["CREATE".to_string(), "UPDATE".to_string()]),
                api_groups: Some(vec![INGRESS_API_GROUP.to_string()]),
                api_versions: Some(vec![INGRESS_API_VERSION.to_string()]),
                resources: Some(vec![INGRESS_RESOURCE.to_string()]),
                scope: None,
            }]),
            client_config: WebhookClientConfig {
                service: Some(ServiceReference {
                    name: config.service_name.clone(),
                    namespace: config.service_namespace.clone(),
                    path: Some("/".to_string()),
                    port: None,
                }),
                ca_bundle: Some(ByteString(ca_bundle)),
                ..Default::default()
            },
            ..Default::default()
        }]),
    }
}
