//! Admission webhook server.
//!
//! Serves two HTTPS endpoints on the port the registration object points at:
//! `/` takes admission review bodies and returns verdicts, `/healthz` answers
//! liveness probes. Both accept any HTTP method; the API server POSTs, but
//! probes and humans may GET.
//!
//! TLS is not optional. The API server refuses to call back over plaintext,
//! so the server only starts once the certificate pair is readable.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::ClusterGateway;
use crate::webhooks::admission;

/// Content type required on review requests. The API server always sends
/// exactly this; anything else is rejected before the body is touched.
const REVIEW_CONTENT_TYPE: &str = "application/json";

/// Shared state for webhook handlers
pub struct WebhookState {
    pub gateway: Arc<dyn ClusterGateway>,
}

impl WebhookState {
    pub fn new(gateway: Arc<dyn ClusterGateway>) -> Self {
        Self { gateway }
    }
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/", any(review_ingress))
        .route("/healthz", any(healthz))
        .with_state(state)
}

/// Liveness probe handler. The fixed body is the whole contract.
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Ingress admission review handler
async fn review_ingress(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if content_type != REVIEW_CONTENT_TYPE {
        warn!(content_type = %content_type, "Rejecting admission request with unsupported content type");
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    debug!(bytes = body.len(), "Processing admission request");

    match admission::admit(state.gateway.as_ref(), &body).await {
        Ok(response) => {
            if response.allowed {
                info!(uid = %response.uid, "Admission request allowed");
            } else {
                warn!(
                    uid = %response.uid,
                    reason = %response.result.reason,
                    message = %response.result.message,
                    "Admission request denied"
                );
            }
            (StatusCode::OK, Json(response.into_review())).into_response()
        }
        Err(error) => {
            error!(error = %error, "Failed to review admission request");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

/// Run the webhook server with TLS
///
/// Binds to 0.0.0.0 on the configured port and serves the admission and
/// health endpoints. TLS certificates are loaded from the configured paths
/// (PEM format).
pub async fn run_webhook_server(gateway: Arc<dyn ClusterGateway>, config: &Config) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let state = Arc::new(WebhookState::new(gateway));
    let app = create_webhook_router(state);

    let tls = RustlsConfig::from_pem_file(
        PathBuf::from(&config.tls_cert_path),
        PathBuf::from(&config.tls_key_path),
    )
    .await
    .map_err(Error::TlsConfig)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(port = config.port, "Webhook server listening with TLS");

    axum_server::bind_rustls(addr, tls)
        .serve(app.into_make_service())
        .await
        .map_err(Error::Server)?;

    Ok(())
}
