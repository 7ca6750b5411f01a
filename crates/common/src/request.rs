//! Wire models for the verification endpoint and the external verifier

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error message returned when any required field is absent.
pub const REQUIRED_FIELDS_MESSAGE: &str =
    "attestationId, proof, publicSignals, and userContextData are required";

/// Inbound proof submission.
///
/// All four fields are opaque blobs produced by the identity app; nothing
/// beyond presence is checked before delegation to the verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPayload {
    pub attestation_id: Option<Value>,
    pub proof: Option<Value>,
    pub public_signals: Option<Value>,
    pub user_context_data: Option<Value>,
}

impl VerifyPayload {
    /// True when every required field is present and non-empty.
    pub fn is_complete(&self) -> bool {
        [
            &self.attestation_id,
            &self.proof,
            &self.public_signals,
            &self.user_context_data,
        ]
        .into_iter()
        .all(is_present)
    }
}

fn is_present(field: &Option<Value>) -> bool {
    match field {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(_) => true,
    }
}

/// Validity verdict from the external verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityDetails {
    pub is_valid: bool,

    /// Per-check detail the verifier attaches (age, OFAC, country, scope).
    /// Passed through to rejected clients untouched.
    #[serde(flatten)]
    pub checks: serde_json::Map<String, Value>,
}

/// Identity data the verifier resolved from the proof.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub user_identifier: Option<String>,
}

/// The external verifier's response, validated at the boundary before any
/// field is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierVerdict {
    pub is_valid_details: ValidityDetails,

    #[serde(default)]
    pub user_data: UserData,

    /// Attributes the proof disclosed (nullifier, age threshold, country).
    #[serde(default)]
    pub disclose_output: Value,
}

impl VerifierVerdict {
    pub fn is_valid(&self) -> bool {
        self.is_valid_details.is_valid
    }

    /// The verifier's detail object, surfaced to clients on rejection.
    pub fn rejection_details(&self) -> Value {
        serde_json::to_value(&self.is_valid_details).unwrap_or(Value::Null)
    }

    /// Extract `(userIdentifier, nullifier)` for on-chain recording.
    /// Returns `None` if either is absent, which under correct verifier
    /// configuration should not happen.
    pub fn identity(&self) -> Option<(&str, &str)> {
        let user = self.user_data.user_identifier.as_deref()?;
        let nullifier = self.disclose_output.get("nullifier")?.as_str()?;
        Some((user, nullifier))
    }
}
