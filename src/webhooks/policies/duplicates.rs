//! Cluster-wide host/path uniqueness policy.
//!
//! Unlike the hostname predicates this one is not self-contained: every
//! evaluation walks the live cluster through the gateway, namespace by
//! namespace, and compares the candidate rule against every rule already
//! stored. There is no cache and no index; cost grows with the ingress
//! population and is paid on every admission request.

use k8s_openapi::api::networking::v1::{HTTPIngressPath, IngressRule};
use tracing::info;

use crate::error::Result;
use crate::gateway::ClusterGateway;

/// Identity of an existing ingress that already claims a candidate's host
/// and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateHost {
    pub namespace: String,
    pub name: String,
}

/// Scan the cluster for an ingress, other than the owner, with a rule that
/// serves `rule`'s host on any of `rule`'s paths.
///
/// Enumeration order decides which conflict is reported: the first matching
/// ingress in the first listed namespace wins and the scan stops there. The
/// owner (namespace, name) is skipped so that an update never collides with
/// its own stored copy.
pub async fn find_duplicate(
    gateway: &dyn ClusterGateway,
    rule: &IngressRule,
    owner_namespace: &str,
    owner_name: &str,
) -> Result<Option<DuplicateHost>> {
    // Rules without a usable host are rejected by the hostname policy and
    // cannot conflict.
    let Some(host) = rule.host.as_deref().filter(|host| !host.is_empty()) else {
        return Ok(None);
    };

    for namespace in gateway.list_namespaces().await? {
        for existing in gateway.list_ingresses(&namespace).await? {
            let existing_name = existing.metadata.name.clone().unwrap_or_default();
            if namespace == owner_namespace && existing_name == owner_name {
                continue;
            }

            let existing_rules = existing
                .spec
                .as_ref()
                .and_then(|spec| spec.rules.as_deref())
                .unwrap_or(&[]);
            if existing_rules
                .iter()
                .any(|existing_rule| shares_host_and_path(rule, existing_rule))
            {
                info!(
                    host = %host,
                    namespace = %namespace,
                    name = %existing_name,
                    "host and path already claimed by another ingress"
                );
                return Ok(Some(DuplicateHost {
                    namespace,
                    name: existing_name,
                }));
            }
        }
    }

    Ok(None)
}

/// True when `existing` serves `candidate`'s host on at least one of
/// `candidate`'s paths.
fn shares_host_and_path(candidate: &IngressRule, existing: &IngressRule) -> bool {
    if existing.host != candidate.host {
        return false;
    }
    paths(candidate).iter().any(|candidate_path| {
        paths(existing)
            .iter()
            .any(|existing_path| path_of(existing_path) == path_of(candidate_path))
    })
}

/// A rule without an `http` block carries no paths.
fn paths(rule: &IngressRule) -> &[HTTPIngressPath] {
    rule.http
        .as_ref()
        .map(|http| http.paths.as_slice())
        .unwrap_or(&[])
}

/// An absent path and the empty path are the same claim.
fn path_of(path: &HTTPIngressPath) -> &str {
    path.path.as_deref().unwrap_or("")
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
    use k8s_openapi::api::networking::v1::HTTPIngressRuleValue;

    fn rule(host: &str, path_values: &[&str]) -> IngressRule {
        IngressRule {
            host: Some(host.to_string()),
            http: Some(HTTPIngressRuleValue {
                paths: path_values
                    .iter()
                    .map(|path| HTTPIngressPath {
                        path: Some((*path).to_string()),
                        path_type: "Prefix".to_string(),
                        ..Default::default()
                    })
                    .collect(),
            }),
        }
    }

    #[test]
    fn test_same_host_and_path_conflict() {
        assert!(shares_host_and_path(
            &rule("example.com", &["/foo"]),
            &rule("example.com", &["/foo"]),
        ));
    }

    #[test]
    fn test_same_host_different_path_no_conflict() {
        assert!(!shares_host_and_path(
            &rule("example.com", &["/foo"]),
            &rule("example.com", &["/bar"]),
        ));
    }

    #[test]
    fn test_different_host_same_path_no_conflict() {
        assert!(!shares_host_and_path(
            &rule("example.com", &["/foo"]),
            &rule("other.example.com", &["/foo"]),
        ));
    }

    #[test]
    fn test_any_shared_path_conflicts() {
        assert!(shares_host_and_path(
            &rule("example.com", &["/a", "/b"]),
            &rule("example.com", &["/c", "/b"]),
        ));
    }

    #[test]
    fn test_rule_without_http_block_never_conflicts() {
        let bare = IngressRule {
            host: Some("example.com".to_string()),
            http: None,
        };
        assert!(!shares_host_and_path(&bare, &rule("example.com", &["/"])));
        assert!(!shares_host_and_path(&rule("example.com", &["/"]), &bare));
    }

    #[test]
    fn test_absent_path_equals_empty_path() {
        let unspecified = IngressRule {
            host: Some("example.com".to_string()),
            http: Some(HTTPIngressRuleValue {
                paths: vec![HTTPIngressPath {
                    path: None,
                    path_type: "ImplementationSpecific".to_string(),
                    ..Default::default()
                }],
            }),
        };
        assert!(shares_host_and_path(&unspecified, &rule("example.com", &[""])));
    }
}
