//! Verification policy applied by the external verifier

use serde::{Deserialize, Serialize};

/// Minimum age the proof must attest to.
pub const MINIMUM_AGE: u8 = 18;

/// Attestation types the verifier is allowed to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationType {
    Passport,
}

/// Policy configuration passed to the external verifier alongside the proof.
///
/// The verifier enforces these; this service only constructs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationPolicy {
    /// Minimum age the disclosed attributes must satisfy
    pub minimum_age: u8,

    /// Whether OFAC sanctions screening is applied
    pub ofac_screening: bool,

    /// ISO country codes whose documents are rejected
    pub excluded_countries: Vec<String>,

    /// Attestation types accepted for this deployment
    pub allowed_attestation_types: Vec<AttestationType>,
}

impl VerificationPolicy {
    /// Build the policy for a deployment. Passport is currently the only
    /// accepted attestation type.
    pub fn new(ofac_screening: bool, excluded_countries: Vec<String>) -> Self {
        Self {
            minimum_age: MINIMUM_AGE,
            ofac_screening,
            excluded_countries,
            allowed_attestation_types: vec![AttestationType::Passport],
        }
    }
}
