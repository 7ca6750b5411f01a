//! Identity Verification API
//!
//! HTTP service for the verification-and-recording flow: accepts a
//! zero-knowledge identity proof bundle, delegates policy verification
//! (minimum age, OFAC, excluded countries) to the external Self verifier,
//! and on success optionally records `(userIdentifier, nullifier)` in the
//! on-chain verification registry on Celo.
//!
//! ## Endpoints
//!
//! - `POST /api/self/verify` - Verify a proof and record the result
//! - `GET /health` - Health check

pub mod config;
pub mod handlers;
pub mod verifier;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use handlers::AppState;
pub use verifier::{ProofVerifier, SelfVerifierClient};

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/self/verify", post(handlers::verify_handler))
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
