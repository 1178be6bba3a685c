//! Cluster state gateway.
//!
//! The one surface through which the admission controller touches the
//! Kubernetes API: namespace/ingress enumeration for the duplicate scan and
//! the lifecycle of the webhook registration object. A single `KubeGateway`
//! is constructed at startup and passed explicitly to the decision engine and
//! the registration agent; nothing in the crate builds its own client.
//!
//! The trait exists so behavioral tests can swap in an in-memory cluster
//! without a live API server.

use async_trait::async_trait;
use k8s_openapi::api::admissionregistration::v1::ValidatingWebhookConfiguration;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::api::networking::v1::Ingress;
use kube::Client;
use kube::api::{Api, DeleteParams, ListParams, PostParams};

use crate::error::Result;

/// Query/command interface to the cluster control plane.
///
/// Every call is a live, blocking round-trip to the API server; there is no
/// caching layer. A slow API server stalls the admission decision that is
/// waiting on it.
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    /// List the names of all namespaces in the cluster.
    async fn list_namespaces(&self) -> Result<Vec<String>>;

    /// List all ingresses in one namespace.
    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>>;

    /// Fetch the webhook registration with the given name.
    ///
    /// Absence surfaces as a Kubernetes 404; callers classify it with
    /// [`crate::error::Error::is_not_found`].
    async fn get_webhook_config(&self, name: &str) -> Result<ValidatingWebhookConfiguration>;

    /// Delete the webhook registration with the given name.
    async fn delete_webhook_config(&self, name: &str) -> Result<()>;

    /// Create a webhook registration.
    async fn create_webhook_config(&self, config: &ValidatingWebhookConfiguration) -> Result<()>;
}

/// [`ClusterGateway`] backed by a shared `kube::Client`.
#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
}

impl KubeGateway {
    /// Wrap an already-connected client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn webhook_configs(&self) -> Api<ValidatingWebhookConfiguration> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl ClusterGateway for KubeGateway {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let namespaces = api.list(&ListParams::default()).await?;
        Ok(namespaces
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>> {
        let api: Api<Ingress> = Api::namespaced(self.client.clone(), namespace);
        let ingresses = api.list(&ListParams::default()).await?;
        Ok(ingresses.items)
    }

    async fn get_webhook_config(&self, name: &str) -> Result<ValidatingWebhookConfiguration> {
        Ok(self.webhook_configs().get(name).await?)
    }

    async fn delete_webhook_config(&self, name: &str) -> Result<()> {
        self.webhook_configs()
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }

    async fn create_webhook_config(&self, config: &ValidatingWebhookConfiguration) -> Result<()> {
        self.webhook_configs()
            .create(&PostParams::default(), config)
            .await?;
        Ok(())
    }
}
