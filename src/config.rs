//! Runtime configuration from the environment.
//!
//! Everything has an in-cluster default; environment variables override for
//! non-standard deployments. TLS material and in-cluster credentials are
//! supplied by the deployment (certificate secret mount + service account),
//! not produced here.

use tracing::warn;

/// Default webhook listen port
pub const DEFAULT_PORT: u16 = 8000;
/// Default path to the webhook TLS certificate
pub const DEFAULT_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to the webhook TLS private key
pub const DEFAULT_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default path to the CA bundle handed to the API server at registration
pub const DEFAULT_CA_BUNDLE_PATH: &str = "/etc/webhook/certs/ca.crt";
/// Default Service name the registration points the API server at
pub const DEFAULT_SERVICE_NAME: &str = "k8s-ingress-admission-controller";
/// Default namespace of that Service
pub const DEFAULT_SERVICE_NAMESPACE: &str = "kube-system";

/// Runtime configuration for the webhook process
#[derive(Clone, Debug)]
pub struct Config {
    /// Port the TLS listener binds on
    pub port: u16,
    /// Path to the serving certificate (PEM)
    pub tls_cert_path: String,
    /// Path to the serving private key (PEM)
    pub tls_key_path: String,
    /// Path to the CA bundle the API server uses to trust the serving cert
    pub ca_bundle_path: String,
    /// Service name written into the webhook registration
    pub service_name: String,
    /// Service namespace written into the webhook registration
    pub service_namespace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tls_cert_path: DEFAULT_CERT_PATH.to_string(),
            tls_key_path: DEFAULT_KEY_PATH.to_string(),
            ca_bundle_path: DEFAULT_CA_BUNDLE_PATH.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_namespace: DEFAULT_SERVICE_NAMESPACE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let port = match std::env::var("WEBHOOK_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "WEBHOOK_PORT is not a valid port, using default");
                defaults.port
            }),
            Err(_) => defaults.port,
        };
        Self {
            port,
            tls_cert_path: env_or("TLS_CERT_PATH", defaults.tls_cert_path),
            tls_key_path: env_or("TLS_KEY_PATH", defaults.tls_key_path),
            ca_bundle_path: env_or("CA_BUNDLE_PATH", defaults.ca_bundle_path),
            service_name: env_or("WEBHOOK_SERVICE_NAME", defaults.service_name),
            service_namespace: env_or("WEBHOOK_SERVICE_NAMESPACE", defaults.service_namespace),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}
