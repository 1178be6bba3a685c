//! ingress-admission-controller library crate
//!
//! A validating admission webhook for Kubernetes ingresses. Every proposed
//! create or update is checked against a fixed policy pipeline (no empty,
//! wildcard, or localhost hostnames; no host/path claimed twice across the
//! cluster) and the controller registers itself with the API server on
//! startup.

pub mod config;
pub mod error;
pub mod gateway;
pub mod registration;
pub mod webhooks;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::{ClusterGateway, KubeGateway};
pub use webhooks::run_webhook_server;
