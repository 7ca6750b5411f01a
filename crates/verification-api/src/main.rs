//! Identity Verification API Service
//!
//! REST service that verifies identity proofs against policy via the
//! external Self verifier and records successful verifications on-chain.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use celo_registry_client::RegistryRecorder;
use identity_common::VerificationRecorder;
use verification_api::{create_router, AppState, Config, SelfVerifierClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Identity Verification API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Verifier backend: {}", config.verifier_url);
    info!("Verification scope: {}", config.scope);

    // On-chain recording is optional: enabled only when the full chain
    // configuration is present (partial configuration failed fast above).
    let recorder: Option<Arc<dyn VerificationRecorder>> = match config.chain.clone() {
        Some(chain) => {
            let recorder = RegistryRecorder::new(chain)
                .context("Failed to initialize registry recorder")?;
            Some(Arc::new(recorder))
        }
        None => {
            warn!("Chain-record configuration absent, on-chain recording disabled");
            None
        }
    };

    let verifier = SelfVerifierClient::new(
        config.verifier_url.clone(),
        config.scope.clone(),
        config.endpoint.clone(),
    );

    let state = AppState {
        verifier: Arc::new(verifier),
        recorder,
        policy: config.policy(),
        verifier_timeout: Duration::from_secs(config.verifier_timeout_secs),
        confirm_timeout_secs: config.tx_confirm_timeout_secs,
    };

    let app = create_router(state);

    let listener = TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Verification API listening on {}", config.api_address());
    info!("Health check: http://{}/health", config.api_address());
    info!("  POST /api/self/verify - Verify identity proof");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
