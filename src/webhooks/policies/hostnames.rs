//! Hostname validation policy.
//!
//! The first three predicates applied to every ingress rule, in order:
//! - the host must be present and non-empty
//! - the host must not be the bare wildcard `*`
//! - the host must not be "localhost" in any casing
//!
//! A wildcard such as `*.example.com` is not the bare wildcard and passes
//! this policy.

use k8s_openapi::api::networking::v1::IngressRule;

/// Ways a rule's hostname can violate cluster policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostViolation {
    Empty,
    Wildcard,
    Localhost,
}

impl HostViolation {
    /// Human-readable denial text, without the owning resource prefix.
    pub fn message(&self) -> &'static str {
        match self {
            HostViolation::Empty => "empty hostname is not allowed in this cluster",
            HostViolation::Wildcard => "wildcard hostname \"*\" is not allowed in this cluster",
            HostViolation::Localhost => "localhost hostname is not allowed in this cluster",
        }
    }
}

/// Check one rule's host against the hostname predicates, in declaration
/// order. The first violated predicate wins. An absent host is treated as
/// the empty host.
pub fn check(rule: &IngressRule) -> Option<HostViolation> {
    let host = rule.host.as_deref().unwrap_or("");

    if host.is_empty() {
        return Some(HostViolation::Empty);
    }
    if host == "*" {
        return Some(HostViolation::Wildcard);
    }
    if host.eq_ignore_ascii_case("localhost") {
        return Some(HostViolation::Localhost);
    }

    None
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

    fn rule(host: Option<&str>) -> IngressRule {
        IngressRule {
            host: host.map(str::to_string),
            http: None,
        }
    }

    #[test]
    fn test_valid_host_passes() {
        assert_eq!(check(&rule(Some("app.example.com"))), None);
    }

    #[test]
    fn test_empty_host_rejected() {
        assert_eq!(check(&rule(Some(""))), Some(HostViolation::Empty));
    }

    #[test]
    fn test_absent_host_treated_as_empty() {
        assert_eq!(check(&rule(None)), Some(HostViolation::Empty));
    }

    #[test]
    fn test_bare_wildcard_rejected() {
        assert_eq!(check(&rule(Some("*"))), Some(HostViolation::Wildcard));
    }

    #[test]
    fn test_subdomain_wildcard_passes() {
        assert_eq!(check(&rule(Some("*.example.com"))), None);
    }

    #[test]
    fn test_localhost_rejected_in_any_casing() {
        for host in ["localhost", "LOCALHOST", "LocalHost", "localHOST"] {
            assert_eq!(
                check(&rule(Some(host))),
                Some(HostViolation::Localhost),
                "expected {host} to be rejected"
            );
        }
    }

    #[test]
    fn test_localhost_subdomain_passes() {
        // Only the exact name is loopback; a subdomain of it is a real host.
        assert_eq!(check(&rule(Some("localhost.example.com"))), None);
    }

    #[test]
    fn test_messages_name_the_violation() {
        assert!(HostViolation::Empty.message().contains("empty hostname"));
        assert!(HostViolation::Wildcard.message().contains("wildcard"));
        assert!(HostViolation::Localhost.message().contains("localhost"));
    }
}
