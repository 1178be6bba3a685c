//! Error types for the admission controller.
//!
//! One crate-wide error enum covers the gateway, the decision engine, the
//! registration agent, and the TLS listener. Malformed-input variants abort a
//! single admission decision; everything else is fatal to the process.

use thiserror::Error;

/// Error type for admission controller operations
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error surfaced through the cluster gateway
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The admission review envelope (or its embedded object) did not parse
    #[error("malformed admission review: {0}")]
    MalformedReview(#[from] serde_json::Error),

    /// The envelope parsed but carried no request half
    #[error("admission review is missing a request: {0}")]
    MissingRequest(#[from] kube::core::admission::ConvertAdmissionReviewError),

    /// The request targets a resource type this webhook does not review
    #[error("admission request is for {0}, not the ingress resource this webhook reviews")]
    UnexpectedResource(String),

    /// The request carried no object to validate
    #[error("admission request has no object")]
    MissingObject,

    /// TLS certificate or key material could not be loaded
    #[error("TLS configuration error: {0}")]
    TlsConfig(#[source] std::io::Error),

    /// The webhook listener failed
    #[error("webhook server error: {0}")]
    Server(#[source] std::io::Error),

    /// Filesystem error reading startup inputs
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error indicates a not-found condition.
    ///
    /// Registration treats a 404 on get as "no stale registration" and a 404
    /// on delete as a benign race with another replica.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(e)) if e.code == 404)
    }
}

/// Result type alias for admission controller operations
pub type Result<T> = std::result::Result<T, Error>;
