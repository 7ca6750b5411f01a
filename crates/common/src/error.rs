use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("attestationId, proof, publicSignals, and userContextData are required")]
    MissingFields,

    #[error("Proof rejected by verifier")]
    VerificationRejected(serde_json::Value),

    #[error("Missing user or nullifier in result")]
    MissingDisclosureData,

    #[error("Malformed nullifier in result: {0}")]
    MalformedNullifier(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Transaction {tx_hash} submitted but not confirmed within {timeout_secs}s")]
    Unconfirmed { tx_hash: String, timeout_secs: u64 },

    #[error("Timed out during {0}")]
    Timeout(&'static str),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid nullifier format")]
    InvalidNullifier,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// HTTP status code the error maps to at the API boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::MissingFields | Error::VerificationRejected(_) => 400,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
