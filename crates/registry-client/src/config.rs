//! Connection settings for the on-chain verification registry

use std::time::Duration;

/// Celo mainnet chain id
pub const CELO_MAINNET_CHAIN_ID: u64 = 42220;

/// Celo Alfajores testnet chain id
pub const CELO_ALFAJORES_CHAIN_ID: u64 = 44787;

/// Everything needed to write to the registry contract.
///
/// All-or-nothing by construction: the caller only builds one of these when
/// the RPC URL, signer key, and contract address are all configured.
#[derive(Debug, Clone)]
pub struct ChainRecordConfig {
    /// Celo JSON-RPC endpoint
    pub rpc_url: String,

    /// Hex-encoded private key of the registry signer
    pub signer_key: String,

    /// Address of the verification registry contract
    pub registry_address: String,

    /// Chain id the signer binds its transactions to
    pub chain_id: u64,

    /// Bounded wait for transaction confirmation
    pub confirm_timeout: Duration,
}

impl ChainRecordConfig {
    pub fn new(
        rpc_url: String,
        signer_key: String,
        registry_address: String,
        mainnet: bool,
        confirm_timeout: Duration,
    ) -> Self {
        Self {
            rpc_url,
            signer_key,
            registry_address,
            chain_id: chain_id_for(mainnet),
            confirm_timeout,
        }
    }
}

/// Chain id for the selected Celo network
pub fn chain_id_for(mainnet: bool) -> u64 {
    if mainnet {
        CELO_MAINNET_CHAIN_ID
    } else {
        CELO_ALFAJORES_CHAIN_ID
    }
}
