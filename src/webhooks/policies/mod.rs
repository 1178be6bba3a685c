//! Validation policies for ingress admission.
//!
//! Policies are applied per rule, in a fixed order, and the first violation
//! decides the verdict:
//!
//! 1. Empty hostname (hostnames)
//! 2. Bare wildcard hostname (hostnames)
//! 3. Localhost hostname (hostnames)
//! 4. Host/path already claimed elsewhere in the cluster (duplicates)
//!
//! Later rules of the same ingress are not evaluated once a rule has been
//! rejected, so a rule that fails a cheap hostname predicate never triggers
//! the cluster scan.

pub mod duplicates;
pub mod hostnames;

use k8s_openapi::api::networking::v1::Ingress;
use tracing::{error, info};

use crate::gateway::ClusterGateway;

pub use duplicates::DuplicateHost;
pub use hostnames::HostViolation;

/// Machine-readable denial category, mapped onto the canonical Kubernetes
/// status reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// A hostname predicate rejected the rule.
    Forbidden,
    /// Another ingress already claims the host and path.
    AlreadyExists,
    /// The cluster could not be scanned, so uniqueness is unknown.
    InternalError,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::Forbidden => "Forbidden",
            DenialReason::AlreadyExists => "AlreadyExists",
            DenialReason::InternalError => "InternalError",
        }
    }
}

/// Result of validating an ingress against the policy pipeline.
#[derive(Debug)]
pub struct ValidationResult {
    /// Whether the ingress passed every policy
    pub allowed: bool,
    /// Denial category (if not allowed)
    pub reason: Option<DenialReason>,
    /// Detailed message (if not allowed)
    pub message: Option<String>,
}

impl ValidationResult {
    /// Create an allowed result
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            message: None,
        }
    }

    /// Create a denied result
    pub fn denied(reason: DenialReason, message: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            message: Some(message),
        }
    }
}

/// Run every rule of `ingress` through the policy pipeline.
///
/// Denial messages carry the owning `namespace:name` prefix so the verdict
/// shown to the client names the resource it judged. A failed cluster scan
/// denies the request: admitting an ingress whose uniqueness could not be
/// checked would let duplicates through silently.
pub async fn validate_ingress(gateway: &dyn ClusterGateway, ingress: &Ingress) -> ValidationResult {
    let namespace = ingress.metadata.namespace.clone().unwrap_or_default();
    let name = ingress.metadata.name.clone().unwrap_or_default();
    let owner = format!("{namespace}:{name}");

    let rules = ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_deref())
        .unwrap_or(&[]);

    for rule in rules {
        let host = rule.host.as_deref().unwrap_or("");

        if let Some(violation) = hostnames::check(rule) {
            info!(ingress = %owner, host = %host, "denying ingress: {}", violation.message());
            return ValidationResult::denied(
                DenialReason::Forbidden,
                format!("{owner}: {}", violation.message()),
            );
        }

        match duplicates::find_duplicate(gateway, rule, &namespace, &name).await {
            Ok(None) => {}
            Ok(Some(conflict)) => {
                info!(
                    ingress = %owner,
                    host = %host,
                    claimed_by = %format!("{}:{}", conflict.namespace, conflict.name),
                    "denying ingress: duplicate host and path"
                );
                return ValidationResult::denied(
                    DenialReason::AlreadyExists,
                    format!(
                        "{owner}: duplicate hostnames are not allowed in this cluster, \
                         host and path already claimed by {}:{}",
                        conflict.namespace, conflict.name
                    ),
                );
            }
            Err(error) => {
                error!(ingress = %owner, host = %host, error = %error, "duplicate scan failed, denying ingress");
                return ValidationResult::denied(
                    DenialReason::InternalError,
                    format!(
                        "{owner}: could not verify hostname uniqueness, the request may be retried"
                    ),
                );
            }
        }
    }

    ValidationResult::allowed()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::get_unwrap
)]
mod tests {
    use super::*;
    use crate::gateway::testing::EmptyCluster;
    use k8s_openapi::api::networking::v1::{
        HTTPIngressPath, HTTPIngressRuleValue, IngressRule, IngressSpec,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn ingress(namespace: &str, name: &str, rules: Vec<IngressRule>) -> Ingress {
        Ingress {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: Some(rules),
                ..Default::default()
            }),
            status: None,
        }
    }

    fn rule(host: &str, path: &str) -> IngressRule {
        IngressRule {
            host: (!host.is_empty()).then(|| host.to_string()),
            http: Some(HTTPIngressRuleValue {
                paths: vec![HTTPIngressPath {
                    path: Some(path.to_string()),
                    path_type: "Prefix".to_string(),
                    ..Default::default()
                }],
            }),
        }
    }

    #[tokio::test]
    async fn test_ingress_without_rules_allowed() {
        let result = validate_ingress(&EmptyCluster, &ingress("default", "web", vec![])).await;
        assert!(result.allowed);
        assert!(result.reason.is_none());
        assert!(result.message.is_none());
    }

    #[tokio::test]
    async fn test_valid_host_in_empty_cluster_allowed() {
        let candidate = ingress("default", "web", vec![rule("app.example.com", "/")]);
        let result = validate_ingress(&EmptyCluster, &candidate).await;
        assert!(result.allowed);
    }

    #[tokio::test]
    async fn test_empty_host_denied_with_owner_prefix() {
        let candidate = ingress("default", "web", vec![rule("", "/")]);
        let result = validate_ingress(&EmptyCluster, &candidate).await;
        assert!(!result.allowed);
        assert_eq!(result.reason, Some(DenialReason::Forbidden));
        let message = result.message.unwrap();
        assert!(message.contains("default:web"));
        assert!(message.contains("empty hostname"));
    }

    #[tokio::test]
    async fn test_first_violating_rule_decides() {
        let candidate = ingress(
            "default",
            "web",
            vec![rule("*", "/"), rule("", "/"), rule("localhost", "/")],
        );
        let result = validate_ingress(&EmptyCluster, &candidate).await;
        assert!(!result.allowed);
        assert!(result.message.unwrap().contains("wildcard"));
    }

    #[tokio::test]
    async fn test_localhost_denied_case_insensitive() {
        let candidate = ingress("default", "web", vec![rule("LOCALHOST", "/")]);
        let result = validate_ingress(&EmptyCluster, &candidate).await;
        assert!(!result.allowed);
        assert_eq!(result.reason, Some(DenialReason::Forbidden));
        assert!(result.message.unwrap().contains("localhost"));
    }

    #[test]
    fn test_denial_reasons_map_to_status_reasons() {
        assert_eq!(DenialReason::Forbidden.as_str(), "Forbidden");
        assert_eq!(DenialReason::AlreadyExists.as_str(), "AlreadyExists");
        assert_eq!(DenialReason::InternalError.as_str(), "InternalError");
    }
}
