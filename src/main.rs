//! ingress-admission-controller - A validating admission webhook for
//! Kubernetes ingresses.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Creates the Kubernetes client behind the cluster gateway
//! - Starts the TLS webhook server
//! - Registers the webhook with the API server once the server is up
//!
//! Registration failure is fatal: a controller that never registered would
//! sit idle forever, so the process exits non-zero and lets the supervisor
//! restart the whole startup sequence.

use std::sync::Arc;

use kube::Client;
use tokio::signal;
use tokio::task::JoinError;
use tracing::{error, info};

use ingress_admission_controller::gateway::ClusterGateway;
use ingress_admission_controller::{Config, KubeGateway, registration, run_webhook_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ingress_admission_controller=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .init();

    info!("Starting ingress admission controller");

    let config = Config::from_env();

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let gateway: Arc<dyn ClusterGateway> = Arc::new(KubeGateway::new(client));

    info!(path = %config.ca_bundle_path, "Loading CA bundle for webhook registration");
    let ca_bundle = std::fs::read(&config.ca_bundle_path)?;

    let mut registration_handle = tokio::spawn(registration::run(
        gateway.clone(),
        config.clone(),
        ca_bundle,
    ));

    let mut server_handle = {
        let gateway = gateway.clone();
        let config = config.clone();
        tokio::spawn(async move { run_webhook_server(gateway, &config).await })
    };

    // Phase 1: wait out registration. Until it has succeeded this process is
    // not part of the admission chain, and a registration error must surface
    // as a non-zero exit instead of a warning nobody reads.
    tokio::select! {
        result = &mut registration_handle => {
            match result {
                Ok(Ok(())) => info!("Webhook registration complete"),
                Ok(Err(e)) => {
                    error!(error = %e, "Webhook registration failed");
                    return Err(e.into());
                }
                Err(e) => {
                    error!(error = %e, "Registration task panicked");
                    return Err(e.into());
                }
            }
        }
        result = &mut server_handle => {
            return Err(server_exited(result));
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal during startup, shutting down");
            return Ok(());
        }
    }

    // Phase 2: registered and serving. Run until the server dies or we are
    // told to stop.
    tokio::select! {
        result = &mut server_handle => {
            return Err(server_exited(result));
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, shutting down");
        }
    }

    info!("Admission controller stopped");
    Ok(())
}

/// The webhook server never returns in normal operation; classify how it
/// stopped for the process exit status.
fn server_exited(
    result: Result<ingress_admission_controller::Result<()>, JoinError>,
) -> Box<dyn std::error::Error> {
    match result {
        Ok(Ok(())) => {
            error!("Webhook server exited unexpectedly");
            "webhook server exited unexpectedly".into()
        }
        Ok(Err(e)) => {
            error!(error = %e, "Webhook server failed");
            e.into()
        }
        Err(e) => {
            error!(error = %e, "Webhook server task panicked");
            e.into()
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the controller cannot shut
/// down gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
