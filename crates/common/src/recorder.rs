//! Seam between the verification handler and the on-chain registry

use async_trait::async_trait;

use crate::error::Result;
use crate::nullifier::Nullifier;

/// Outcome of an on-chain recording attempt.
///
/// Submission and confirmation are distinct phases: a transaction can be
/// accepted by the node and still miss the confirmation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// Transaction mined; the verification is recorded on-chain.
    Confirmed {
        tx_hash: String,
        block: Option<u64>,
    },

    /// Transaction submitted but not confirmed within the bounded wait.
    /// Callers should look the hash up before resubmitting.
    Pending { tx_hash: String },
}

impl RecordStatus {
    pub fn tx_hash(&self) -> &str {
        match self {
            RecordStatus::Confirmed { tx_hash, .. } => tx_hash,
            RecordStatus::Pending { tx_hash } => tx_hash,
        }
    }
}

/// Write path to the on-chain verification registry.
///
/// Implementations perform no duplicate suppression: resubmitting an
/// already-recorded `(user, nullifier)` pair is bounded only by whatever
/// replay protection the registry contract enforces via the nullifier.
#[async_trait]
pub trait VerificationRecorder: Send + Sync {
    /// Submit `recordVerification(user, nullifier)` and wait (bounded) for
    /// confirmation.
    async fn record(&self, user: &str, nullifier: &Nullifier) -> Result<RecordStatus>;
}
