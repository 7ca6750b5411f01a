//! Client for the external identity verifier
//!
//! The verifier is a black box: it takes the proof bundle plus the policy
//! and answers with a validity verdict and the disclosed attributes. Its
//! response is validated against an explicit schema before any field is
//! trusted.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use identity_common::{Error, Result, VerificationPolicy, VerifierVerdict, VerifyPayload};

/// Verifier backend for mainnet attestation roots
pub const MAINNET_VERIFIER_URL: &str = "https://api.self.xyz";

/// Verifier backend for staging/testnet attestation roots
pub const STAGING_VERIFIER_URL: &str = "https://api.staging.self.xyz";

/// How disclosed user identifiers are encoded (EVM address hex)
pub const USER_IDENTIFIER_TYPE: &str = "hex";

/// Black-box proof verification capability.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    /// Verify a proof bundle against the deployment policy.
    async fn verify(
        &self,
        payload: &VerifyPayload,
        policy: &VerificationPolicy,
    ) -> Result<VerifierVerdict>;
}

/// HTTP client for the Self verifier backend.
pub struct SelfVerifierClient {
    base_url: String,
    scope: String,
    endpoint: String,
    client: reqwest::Client,
}

impl SelfVerifierClient {
    /// Create a new verifier client.
    ///
    /// # Arguments
    /// * `base_url` - Verifier backend base URL
    /// * `scope` - Scope string identifying this deployment
    /// * `endpoint` - Public URL of this deployment, bound into proofs
    pub fn new(base_url: String, scope: String, endpoint: String) -> Self {
        Self {
            base_url,
            scope,
            endpoint,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ProofVerifier for SelfVerifierClient {
    async fn verify(
        &self,
        payload: &VerifyPayload,
        policy: &VerificationPolicy,
    ) -> Result<VerifierVerdict> {
        let url = format!("{}/api/v1/verify", self.base_url);

        debug!(scope = %self.scope, "Submitting proof to verifier: {}", url);

        let body = json!({
            "attestationId": payload.attestation_id,
            "proof": payload.proof,
            "publicSignals": payload.public_signals,
            "userContextData": payload.user_context_data,
            "scope": self.scope,
            "endpoint": self.endpoint,
            "userIdentifierType": USER_IDENTIFIER_TYPE,
            "policy": policy,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Verifier unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "Verifier returned {}: {}",
                status, detail
            )));
        }

        // Boundary validation: reject responses that do not match the
        // verdict schema instead of trusting loose field access.
        response
            .json::<VerifierVerdict>()
            .await
            .map_err(|e| Error::Transport(format!("Malformed verifier response: {}", e)))
    }
}
