//! Admission decision engine.
//!
//! Takes a raw admission review body and produces the verdict for it. The
//! engine distinguishes two failure planes: a malformed or mistargeted
//! review is a protocol error surfaced as [`Error`] for the transport layer
//! to report, while a policy violation is a normal, well-formed response
//! with `allowed: false` and a structured reason.

use k8s_openapi::api::networking::v1::Ingress;
use kube::core::GroupVersionResource;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};

use crate::error::{Error, Result};
use crate::gateway::ClusterGateway;
use crate::webhooks::policies::{self, DenialReason};

/// API group of the resource this webhook reviews.
pub const INGRESS_API_GROUP: &str = "networking.k8s.io";
/// API version of the resource this webhook reviews.
pub const INGRESS_API_VERSION: &str = "v1";
/// Plural resource name of the resource this webhook reviews.
pub const INGRESS_RESOURCE: &str = "ingresses";

/// Decide one admission review.
///
/// Returns `Ok` with the verdict, allowed or denied, whenever the review
/// itself was well formed. Returns `Err` when the body cannot be decoded,
/// carries no request, targets a resource other than ingresses, or omits
/// the object under review.
pub async fn admit(gateway: &dyn ClusterGateway, body: &[u8]) -> Result<AdmissionResponse> {
    let review: AdmissionReview<Ingress> = serde_json::from_slice(body)?;
    let request: AdmissionRequest<Ingress> = review.try_into()?;

    // Registration asks the API server for ingress reviews only; anything
    // else reaching this endpoint is a misconfiguration, not a deniable
    // request.
    if !is_reviewed_resource(&request.resource) {
        return Err(Error::UnexpectedResource(format!(
            "{}/{} {}",
            request.resource.group, request.resource.version, request.resource.resource
        )));
    }

    let ingress = request.object.as_ref().ok_or(Error::MissingObject)?;
    let verdict = policies::validate_ingress(gateway, ingress).await;

    if verdict.allowed {
        return Ok(AdmissionResponse::from(&request));
    }

    let reason = verdict.reason.unwrap_or(DenialReason::Forbidden);
    let message = verdict
        .message
        .unwrap_or_else(|| "ingress validation failed".to_string());
    Ok(deny_with_reason(&request, reason, message))
}

fn is_reviewed_resource(resource: &GroupVersionResource) -> bool {
    resource.group == INGRESS_API_GROUP
        && resource.version == INGRESS_API_VERSION
        && resource.resource == INGRESS_RESOURCE
}

/// Create a denial response carrying both the message and the machine
/// readable status reason. kube-rs deny() only sets status.message, so the
/// reason is written onto the result afterwards.
fn deny_with_reason(
    request: &AdmissionRequest<Ingress>,
    reason: DenialReason,
    message: String,
) -> AdmissionResponse {
    let mut response = AdmissionResponse::from(request).deny(message);
    response.result.reason = reason.as_str().to_string();
    response
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

    const UID: &str = "705ab4f5-6393-11e8-b7cc-42010a800002";

    fn ingress(namespace: &str, name: &str, host: &str, path: &str) -> Ingress {
        Ingress {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: Some(vec![IngressRule {
                    host: (!host.is_empty()).then(|| host.to_string()),
                    http: Some(HTTPIngressRuleValue {
                        paths: vec![HTTPIngressPath {
                            path: Some(path.to_string()),
                            path_type: "Prefix".to_string(),
                            ..Default::default()
                        }],
                    }),
                }]),
                ..Default::default()
            }),
            status: None,
        }
    }

    fn review_body_for(ingress: &Ingress, group: &str, version: &str, resource: &str) -> Vec<u8> {
        let review = serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": UID,
                "kind": {"group": group, "version": version, "kind": "Ingress"},
                "resource": {"group": group, "version": version, "resource": resource},
                "requestKind": {"group": group, "version": version, "kind": "Ingress"},
                "requestResource": {"group": group, "version": version, "resource": resource},
                "name": ingress.metadata.name.clone().unwrap_or_default(),
                "namespace": ingress.metadata.namespace.clone().unwrap_or_default(),
                "operation": "CREATE",
                "userInfo": {"username": "kubernetes-admin", "groups": ["system:masters"]},
                "object": serde_json::to_value(ingress).unwrap(),
                "oldObject": null,
                "dryRun": false
            }
        });
        serde_json::to_vec(&review).unwrap()
    }

    fn review_body(ingress: &Ingress) -> Vec<u8> {
        review_body_for(
            ingress,
            INGRESS_API_GROUP,
            INGRESS_API_VERSION,
            INGRESS_RESOURCE,
        )
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let err = admit(&EmptyCluster, b"{ this is not json").await.unwrap_err();
        assert!(matches!(err, Error::MalformedReview(_)));
    }

    #[tokio::test]
    async fn test_review_without_request_is_an_error() {
        let body = serde_json::to_vec(&serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview"
        }))
        .unwrap();
        let err = admit(&EmptyCluster, &body).await.unwrap_err();
        assert!(matches!(err, Error::MissingRequest(_)));
    }

    #[tokio::test]
    async fn test_other_resource_is_an_error() {
        let candidate = ingress("default", "web", "app.example.com", "/");
        let body = review_body_for(&candidate, "apps", "v1", "deployments");
        let err = admit(&EmptyCluster, &body).await.unwrap_err();
        match err {
            Error::UnexpectedResource(gvr) => assert!(gvr.contains("deployments")),
            other => panic!("expected UnexpectedResource, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_review_without_object_is_an_error() {
        let review = serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": UID,
                "kind": {"group": INGRESS_API_GROUP, "version": INGRESS_API_VERSION, "kind": "Ingress"},
                "resource": {"group": INGRESS_API_GROUP, "version": INGRESS_API_VERSION, "resource": INGRESS_RESOURCE},
                "name": "web",
                "namespace": "default",
                "operation": "CREATE",
                "userInfo": {"username": "kubernetes-admin"},
                "object": null,
                "dryRun": false
            }
        });
        let body = serde_json::to_vec(&review).unwrap();
        let err = admit(&EmptyCluster, &body).await.unwrap_err();
        assert!(matches!(err, Error::MissingObject));
    }

    #[tokio::test]
    async fn test_allowed_response_echoes_uid() {
        let candidate = ingress("default", "web", "app.example.com", "/");
        let response = admit(&EmptyCluster, &review_body(&candidate)).await.unwrap();
        assert!(response.allowed);
        assert_eq!(response.uid, UID);
        assert!(response.result.message.is_empty());
    }

    #[tokio::test]
    async fn test_denied_response_carries_reason_and_message() {
        let candidate = ingress("default", "web", "", "/");
        let response = admit(&EmptyCluster, &review_body(&candidate)).await.unwrap();
        assert!(!response.allowed);
        assert_eq!(response.uid, UID);
        assert_eq!(response.result.reason, "Forbidden");
        assert!(response.result.message.contains("default:web"));
        assert!(response.result.message.contains("empty hostname"));
    }
}
