//! Configuration management for the Verification API
//!
//! Loads configuration from environment variables once at startup into an
//! immutable struct. The three chain-record variables are all-or-nothing:
//! setting only some of them is a deployment mistake and fails fast instead
//! of silently skipping on-chain recording.

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

use celo_registry_client::ChainRecordConfig;
use identity_common::VerificationPolicy;

use crate::verifier::{MAINNET_VERIFIER_URL, STAGING_VERIFIER_URL};

/// Environment variables that together enable on-chain recording.
const CHAIN_RECORD_VARS: [&str; 3] = [
    "CELO_RPC_URL",
    "SELF_REGISTRY_SIGNER_KEY",
    "SELF_REGISTRY_ADDRESS",
];

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Verification scope identifying this deployment to the verifier
    pub scope: String,

    /// Public URL of this deployment, echoed to the verifier
    pub endpoint: String,

    /// Whether proofs are verified against mainnet attestation roots
    pub mainnet: bool,

    /// Base URL of the external verifier backend
    pub verifier_url: String,

    /// Whether OFAC sanctions screening is applied
    pub ofac_enabled: bool,

    /// ISO country codes whose documents are rejected
    pub excluded_countries: Vec<String>,

    /// Bounded wait for the external verifier call, in seconds
    pub verifier_timeout_secs: u64,

    /// Bounded wait for transaction confirmation, in seconds
    pub tx_confirm_timeout_secs: u64,

    /// On-chain recording settings; `None` disables the recording step
    pub chain: Option<ChainRecordConfig>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an explicit lookup function.
    /// Lets tests supply variables without mutating process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mainnet = lookup("SELF_MAINNET")
            .unwrap_or_else(|| "false".to_string())
            .parse()
            .context("Invalid SELF_MAINNET (expected true/false)")?;

        let tx_confirm_timeout_secs: u64 = lookup("TX_CONFIRM_TIMEOUT_SECS")
            .unwrap_or_else(|| "90".to_string())
            .parse()
            .context("Invalid TX_CONFIRM_TIMEOUT_SECS")?;

        let config = Config {
            api_host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            api_port: lookup("API_PORT")
                .unwrap_or_else(|| "8084".to_string())
                .parse()
                .context("Invalid API_PORT")?,

            scope: lookup("NEXT_PUBLIC_SELF_SCOPE").unwrap_or_else(|| "defi-vault".to_string()),

            endpoint: lookup("NEXT_PUBLIC_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),

            mainnet,

            verifier_url: lookup("SELF_VERIFIER_URL").unwrap_or_else(|| {
                let default = if mainnet {
                    MAINNET_VERIFIER_URL
                } else {
                    STAGING_VERIFIER_URL
                };
                default.to_string()
            }),

            ofac_enabled: lookup("SELF_OFAC_ENABLED")
                .unwrap_or_else(|| "true".to_string())
                .parse()
                .context("Invalid SELF_OFAC_ENABLED (expected true/false)")?,

            excluded_countries: lookup("SELF_EXCLUDED_COUNTRIES")
                .map(|raw| {
                    raw.split(',')
                        .map(|code| code.trim().to_uppercase())
                        .filter(|code| !code.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            verifier_timeout_secs: lookup("VERIFIER_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .context("Invalid VERIFIER_TIMEOUT_SECS")?,

            tx_confirm_timeout_secs,

            chain: Self::chain_config(&lookup, mainnet, tx_confirm_timeout_secs)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Build the chain-record configuration, enforcing all-or-nothing.
    fn chain_config(
        lookup: &impl Fn(&str) -> Option<String>,
        mainnet: bool,
        tx_confirm_timeout_secs: u64,
    ) -> Result<Option<ChainRecordConfig>> {
        let values: Vec<Option<String>> = CHAIN_RECORD_VARS
            .iter()
            .map(|var| lookup(var).filter(|v| !v.is_empty()))
            .collect();

        let present = values.iter().filter(|v| v.is_some()).count();
        if present == 0 {
            return Ok(None);
        }
        if present < CHAIN_RECORD_VARS.len() {
            let missing: Vec<&str> = CHAIN_RECORD_VARS
                .iter()
                .zip(&values)
                .filter(|(_, value)| value.is_none())
                .map(|(var, _)| *var)
                .collect();
            bail!(
                "Partial chain-record configuration: missing {}. \
                 Set all of CELO_RPC_URL, SELF_REGISTRY_SIGNER_KEY, and \
                 SELF_REGISTRY_ADDRESS to enable recording, or none to disable it",
                missing.join(", ")
            );
        }

        let mut values = values.into_iter().flatten();
        let rpc_url = values.next().unwrap_or_default();
        let signer_key = values.next().unwrap_or_default();
        let registry_address = values.next().unwrap_or_default();

        Ok(Some(ChainRecordConfig::new(
            rpc_url,
            signer_key,
            registry_address,
            mainnet,
            Duration::from_secs(tx_confirm_timeout_secs),
        )))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            bail!("API_PORT must be greater than 0");
        }
        if self.verifier_timeout_secs == 0 {
            bail!("VERIFIER_TIMEOUT_SECS must be greater than 0");
        }
        if self.tx_confirm_timeout_secs == 0 {
            bail!("TX_CONFIRM_TIMEOUT_SECS must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Policy handed to the external verifier with every proof
    pub fn policy(&self) -> VerificationPolicy {
        VerificationPolicy::new(self.ofac_enabled, self.excluded_countries.clone())
    }
}
