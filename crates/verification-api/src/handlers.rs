//! API request handlers for proof verification

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use identity_common::{
    Error, Nullifier, RecordStatus, VerificationPolicy, VerificationRecorder, VerifyPayload,
};

use crate::verifier::ProofVerifier;

/// Shared application state
pub struct AppState {
    /// External verifier the proof bundle is delegated to
    pub verifier: Arc<dyn ProofVerifier>,

    /// On-chain recorder; `None` when recording is disabled by configuration
    pub recorder: Option<Arc<dyn VerificationRecorder>>,

    /// Policy handed to the verifier with every proof
    pub policy: VerificationPolicy,

    /// Bounded wait for the verifier call
    pub verifier_timeout: Duration,

    /// Confirmation window, echoed in unconfirmed-transaction errors
    pub confirm_timeout_secs: u64,
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "verification-api"
    }))
}

/// Verify an identity proof and record the result on-chain.
///
/// The flow is ordered cheapest-first:
/// 1. Presence check on the four required fields (no verifier call if any
///    is missing)
/// 2. Delegate to the external verifier under a bounded timeout
/// 3. On a valid proof, submit `recordVerification` to the registry and
///    wait for confirmation, if recording is enabled
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyPayload>,
) -> (StatusCode, Json<Value>) {
    let request_id = Uuid::new_v4();

    if !payload.is_complete() {
        warn!(%request_id, "Rejected proof submission with missing fields");
        return error_response(&Error::MissingFields);
    }

    info!(%request_id, "Delegating proof bundle to verifier");

    let verdict = match timeout(
        state.verifier_timeout,
        state.verifier.verify(&payload, &state.policy),
    )
    .await
    {
        Err(_) => {
            let err = Error::Timeout("proof verification");
            error!(%request_id, "Verifier call timed out");
            return error_response(&err);
        }
        Ok(Err(err)) => {
            error!(%request_id, %err, "Verifier call failed");
            return error_response(&err);
        }
        Ok(Ok(verdict)) => verdict,
    };

    if !verdict.is_valid() {
        info!(%request_id, "Proof rejected by verifier policy");
        return error_response(&Error::VerificationRejected(verdict.rejection_details()));
    }

    let mut tx_hash: Option<String> = None;

    if let Some(recorder) = &state.recorder {
        let Some((user, nullifier_hex)) = verdict.identity() else {
            error!(%request_id, "Verifier omitted userIdentifier or nullifier");
            return error_response(&Error::MissingDisclosureData);
        };

        let nullifier = match Nullifier::from_hex(nullifier_hex) {
            Ok(nullifier) => nullifier,
            Err(_) => {
                error!(%request_id, nullifier = nullifier_hex, "Disclosed nullifier is malformed");
                return error_response(&Error::MalformedNullifier(nullifier_hex.to_string()));
            }
        };

        match recorder.record(user, &nullifier).await {
            Ok(RecordStatus::Confirmed { tx_hash: hash, block }) => {
                info!(%request_id, tx_hash = %hash, ?block, "Verification recorded on-chain");
                tx_hash = Some(hash);
            }
            Ok(RecordStatus::Pending { tx_hash: hash }) => {
                warn!(%request_id, tx_hash = %hash, "Recording transaction unconfirmed");
                let err = Error::Unconfirmed {
                    tx_hash: hash,
                    timeout_secs: state.confirm_timeout_secs,
                };
                return error_response(&err);
            }
            Err(err) => {
                error!(%request_id, %err, "On-chain recording failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "status": "error",
                        "result": false,
                        "reason": format!("On-chain recording failed: {}", err),
                    })),
                );
            }
        }
    }

    info!(%request_id, "Verification successful");

    let mut body = json!({
        "status": "success",
        "result": true,
        "discloseOutput": verdict.disclose_output,
    });
    if let Some(hash) = tx_hash {
        body["txHash"] = json!(hash);
    }

    (StatusCode::OK, Json(body))
}

/// Convert a flow error into its HTTP response body, matching the contract
/// the dashboard client consumes: missing fields get a bare `message`,
/// policy rejections carry the verifier's `details`, disclosure and
/// transaction problems a `reason`, and anything else a generic `message`.
fn error_response(err: &Error) -> (StatusCode, Json<Value>) {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = match err {
        Error::MissingFields => json!({ "message": err.to_string() }),
        Error::VerificationRejected(details) => json!({
            "status": "error",
            "result": false,
            "details": details,
        }),
        Error::MissingDisclosureData | Error::MalformedNullifier(_) => json!({
            "status": "error",
            "result": false,
            "reason": err.to_string(),
        }),
        Error::Unconfirmed { tx_hash, .. } => json!({
            "status": "error",
            "result": false,
            "reason": err.to_string(),
            "txHash": tx_hash,
        }),
        _ => json!({
            "status": "error",
            "result": false,
            "message": err.to_string(),
        }),
    };

    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use identity_common::{Result, VerifierVerdict, REQUIRED_FIELDS_MESSAGE};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const USER: &str = "0x0000000000000000000000000000000000000abc";

    fn nullifier_hex() -> String {
        Nullifier::new([0xde; 32]).to_hex()
    }

    /// Verifier that returns a canned verdict and counts invocations
    struct MockVerifier {
        verdict: Option<VerifierVerdict>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl MockVerifier {
        fn returning(verdict: Value) -> Arc<Self> {
            Arc::new(Self {
                verdict: Some(serde_json::from_value(verdict).unwrap()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                verdict: None,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        /// Never answers within any reasonable handler timeout
        fn stalling() -> Arc<Self> {
            Arc::new(Self {
                verdict: None,
                delay: Duration::from_secs(60),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProofVerifier for MockVerifier {
        async fn verify(
            &self,
            _payload: &VerifyPayload,
            _policy: &VerificationPolicy,
        ) -> Result<VerifierVerdict> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match &self.verdict {
                Some(verdict) => Ok(verdict.clone()),
                None => Err(Error::Transport("connection refused".to_string())),
            }
        }
    }

    /// Recorder that returns a canned status and captures its arguments
    struct MockRecorder {
        outcome: Result<RecordStatus>,
        calls: AtomicUsize,
        last_args: Mutex<Option<(String, Nullifier)>>,
    }

    impl MockRecorder {
        fn with(outcome: Result<RecordStatus>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
                last_args: Mutex::new(None),
            })
        }

        fn confirmed() -> Arc<Self> {
            Self::with(Ok(RecordStatus::Confirmed {
                tx_hash: "0xf00d".to_string(),
                block: Some(42),
            }))
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VerificationRecorder for MockRecorder {
        async fn record(&self, user: &str, nullifier: &Nullifier) -> Result<RecordStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_args.lock().unwrap() = Some((user.to_string(), nullifier.clone()));
            match &self.outcome {
                Ok(status) => Ok(status.clone()),
                Err(err) => Err(Error::Transaction(err.to_string())),
            }
        }
    }

    fn state(
        verifier: Arc<MockVerifier>,
        recorder: Option<Arc<MockRecorder>>,
    ) -> Arc<AppState> {
        state_with_timeout(verifier, recorder, Duration::from_secs(5))
    }

    fn state_with_timeout(
        verifier: Arc<MockVerifier>,
        recorder: Option<Arc<MockRecorder>>,
        verifier_timeout: Duration,
    ) -> Arc<AppState> {
        Arc::new(AppState {
            verifier,
            recorder: recorder.map(|r| r as Arc<dyn VerificationRecorder>),
            policy: VerificationPolicy::new(true, vec![]),
            verifier_timeout,
            confirm_timeout_secs: 90,
        })
    }

    fn complete_payload() -> VerifyPayload {
        serde_json::from_value(json!({
            "attestationId": "1",
            "proof": {"a": ["0x1", "0x2"]},
            "publicSignals": ["0x3"],
            "userContextData": {"wallet": USER},
        }))
        .unwrap()
    }

    fn valid_verdict() -> Value {
        json!({
            "isValidDetails": {"isValid": true},
            "userData": {"userIdentifier": USER},
            "discloseOutput": {"nullifier": nullifier_hex(), "minimumAge": 18},
        })
    }

    #[tokio::test]
    async fn test_missing_field_returns_400_without_verifier_call() {
        for field in ["attestationId", "proof", "publicSignals", "userContextData"] {
            let verifier = MockVerifier::returning(valid_verdict());
            let mut raw = serde_json::to_value(complete_payload()).unwrap();
            raw.as_object_mut().unwrap().remove(field);
            let payload: VerifyPayload = serde_json::from_value(raw).unwrap();

            let (status, Json(body)) =
                verify_handler(State(state(verifier.clone(), None)), Json(payload)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "missing {}", field);
            assert_eq!(body["message"], REQUIRED_FIELDS_MESSAGE);
            assert_eq!(verifier.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_rejected_proof_returns_400_without_chain_write() {
        let verifier = MockVerifier::returning(json!({
            "isValidDetails": {"isValid": false, "isOfacValid": false},
        }));
        let recorder = MockRecorder::confirmed();

        let (status, Json(body)) = verify_handler(
            State(state(verifier, Some(recorder.clone()))),
            Json(complete_payload()),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["result"], false);
        assert_eq!(body["details"]["isOfacValid"], false);
        assert_eq!(recorder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_without_chain_config_skips_recording() {
        let verifier = MockVerifier::returning(valid_verdict());

        let (status, Json(body)) =
            verify_handler(State(state(verifier, None)), Json(complete_payload())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["result"], true);
        assert_eq!(body["discloseOutput"]["nullifier"], nullifier_hex());
        assert!(body.get("txHash").is_none());
    }

    #[tokio::test]
    async fn test_missing_disclosure_returns_500_when_recording_enabled() {
        let verifier = MockVerifier::returning(json!({
            "isValidDetails": {"isValid": true},
            "userData": {"userIdentifier": USER},
            "discloseOutput": {"minimumAge": 18},
        }));
        let recorder = MockRecorder::confirmed();

        let (status, Json(body)) = verify_handler(
            State(state(verifier, Some(recorder.clone()))),
            Json(complete_payload()),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["reason"], "Missing user or nullifier in result");
        assert_eq!(recorder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_records_disclosed_identity_exactly_once() {
        let verifier = MockVerifier::returning(valid_verdict());
        let recorder = MockRecorder::confirmed();

        let (status, Json(body)) = verify_handler(
            State(state(verifier, Some(recorder.clone()))),
            Json(complete_payload()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["result"], true);
        assert_eq!(body["txHash"], "0xf00d");

        assert_eq!(recorder.call_count(), 1);
        let args = recorder.last_args.lock().unwrap();
        let (user, nullifier) = args.as_ref().unwrap();
        assert_eq!(user, USER);
        assert_eq!(*nullifier, Nullifier::new([0xde; 32]));
    }

    #[tokio::test]
    async fn test_unconfirmed_transaction_is_distinct_500() {
        let verifier = MockVerifier::returning(valid_verdict());
        let recorder = MockRecorder::with(Ok(RecordStatus::Pending {
            tx_hash: "0xbeef".to_string(),
        }));

        let (status, Json(body)) = verify_handler(
            State(state(verifier, Some(recorder))),
            Json(complete_payload()),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["txHash"], "0xbeef");
        let reason = body["reason"].as_str().unwrap();
        assert!(reason.contains("0xbeef"));
        assert!(reason.contains("not confirmed"));
    }

    #[tokio::test]
    async fn test_transaction_failure_surfaces_chain_error() {
        let verifier = MockVerifier::returning(valid_verdict());
        let recorder = MockRecorder::with(Err(Error::Transaction(
            "Transaction 0xf00d reverted".to_string(),
        )));

        let (status, Json(body)) = verify_handler(
            State(state(verifier, Some(recorder))),
            Json(complete_payload()),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let reason = body["reason"].as_str().unwrap();
        assert!(reason.starts_with("On-chain recording failed"));
        assert!(reason.contains("reverted"));
    }

    #[tokio::test]
    async fn test_malformed_nullifier_returns_500_naming_the_value() {
        let verifier = MockVerifier::returning(json!({
            "isValidDetails": {"isValid": true},
            "userData": {"userIdentifier": USER},
            "discloseOutput": {"nullifier": "0xdead", "minimumAge": 18},
        }));
        let recorder = MockRecorder::confirmed();

        let (status, Json(body)) = verify_handler(
            State(state(verifier, Some(recorder.clone()))),
            Json(complete_payload()),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let reason = body["reason"].as_str().unwrap();
        assert!(reason.contains("Malformed nullifier"));
        assert!(reason.contains("0xdead"));
        assert_eq!(recorder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_verifier_returns_500_timeout_message() {
        let verifier = MockVerifier::stalling();

        let (status, Json(body)) = verify_handler(
            State(state_with_timeout(
                verifier.clone(),
                None,
                Duration::from_millis(20),
            )),
            Json(complete_payload()),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert_eq!(body["result"], false);
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("Timed out during proof verification"));
        assert!(!message.contains("Transport"));
        assert_eq!(verifier.call_count(), 1);
    }

    #[tokio::test]
    async fn test_verifier_transport_failure_returns_500_message() {
        let verifier = MockVerifier::failing();

        let (status, Json(body)) =
            verify_handler(State(state(verifier, None)), Json(complete_payload())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert_eq!(body["result"], false);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("connection refused"));
    }
}
