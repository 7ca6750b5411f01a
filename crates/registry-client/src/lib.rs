//! Celo client for the identity verification registry
//!
//! Submits `recordVerification(address,bytes32)` transactions and waits a
//! bounded time for confirmation. Submission and confirmation are distinct
//! phases: a transaction that misses the confirmation window is reported as
//! `RecordStatus::Pending` with its hash rather than blocking the caller.

pub mod config;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, TransactionRequest, U64};
use tracing::{info, warn};

use identity_common::{Error, Nullifier, RecordStatus, Result, VerificationRecorder};

pub use config::{ChainRecordConfig, CELO_ALFAJORES_CHAIN_ID, CELO_MAINNET_CHAIN_ID};

/// Recorder backed by the on-chain verification registry contract.
#[derive(Debug)]
pub struct RegistryRecorder {
    client: SignerMiddleware<Provider<Http>, LocalWallet>,
    registry_address: Address,
    confirm_timeout: Duration,
}

impl RegistryRecorder {
    /// Create a recorder from validated chain configuration.
    ///
    /// Parses the signer key and contract address eagerly so that a bad
    /// deployment fails at startup, not on the first request.
    pub fn new(config: ChainRecordConfig) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| Error::Config(format!("Invalid CELO_RPC_URL: {}", e)))?;

        let wallet = LocalWallet::from_str(&config.signer_key)
            .map_err(|e| Error::Config(format!("Invalid SELF_REGISTRY_SIGNER_KEY: {}", e)))?
            .with_chain_id(config.chain_id);

        let registry_address = Address::from_str(&config.registry_address)
            .map_err(|e| Error::Config(format!("Invalid SELF_REGISTRY_ADDRESS: {}", e)))?;

        info!(
            registry = %config.registry_address,
            chain_id = config.chain_id,
            "Registry recorder initialized"
        );

        Ok(Self {
            client: SignerMiddleware::new(provider, wallet),
            registry_address,
            confirm_timeout: config.confirm_timeout,
        })
    }
}

#[async_trait]
impl VerificationRecorder for RegistryRecorder {
    async fn record(&self, user: &str, nullifier: &Nullifier) -> Result<RecordStatus> {
        let user: Address = user
            .parse()
            .map_err(|e| Error::Transaction(format!("Invalid user identifier: {}", e)))?;

        let tx = TransactionRequest::new()
            .to(self.registry_address)
            .data(record_verification_calldata(user, nullifier));

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| Error::Transaction(format!("Submission failed: {}", e)))?;

        let tx_hash = format!("{:#x}", *pending);
        info!(%tx_hash, %nullifier, "recordVerification submitted");

        let receipt = match tokio::time::timeout(self.confirm_timeout, pending).await {
            Err(_) => {
                warn!(%tx_hash, "Confirmation window elapsed, transaction still pending");
                return Ok(RecordStatus::Pending { tx_hash });
            }
            Ok(Err(e)) => {
                return Err(Error::Transaction(format!("Confirmation failed: {}", e)));
            }
            Ok(Ok(None)) => {
                return Err(Error::Transaction(format!(
                    "Transaction {} dropped from the mempool",
                    tx_hash
                )));
            }
            Ok(Ok(Some(receipt))) => receipt,
        };

        if receipt.status != Some(U64::from(1)) {
            return Err(Error::Transaction(format!("Transaction {} reverted", tx_hash)));
        }

        let block = receipt.block_number.map(|b| b.as_u64());
        info!(%tx_hash, ?block, "recordVerification confirmed");

        Ok(RecordStatus::Confirmed { tx_hash, block })
    }
}

/// ABI-encode a call to `recordVerification(address user, bytes32 nullifier)`.
fn record_verification_calldata(user: Address, nullifier: &Nullifier) -> Bytes {
    let selector = ethers::utils::id("recordVerification(address,bytes32)");
    let args = ethers::abi::encode(&[
        Token::Address(user),
        Token::FixedBytes(nullifier.as_bytes().to_vec()),
    ]);

    let mut data = Vec::with_capacity(4 + args.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&args);
    Bytes::from(data)
}
