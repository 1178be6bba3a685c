//! Webhook module for validating ingress admission requests.
//!
//! The decision engine (admission) applies the policy pipeline (policies)
//! to every review the server (server) receives, ordered as: empty hostname,
//! wildcard hostname, localhost hostname, cluster-wide duplicate host/path.

pub mod admission;
pub mod policies;
mod server;

pub use admission::{INGRESS_API_GROUP, INGRESS_API_VERSION, INGRESS_RESOURCE, admit};
pub use policies::{DenialReason, ValidationResult, validate_ingress};
pub use server::{WebhookState, create_webhook_router, run_webhook_server};

// Re-export the kube-rs response type `admit` hands back, so callers can
// name it without importing kube
pub use kube::core::admission::AdmissionResponse;
