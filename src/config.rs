//! Configuration management

use anyhow::{Context, Result};
use std::env;

/// Runtime configuration, read once from the environment.
///
/// Endpoints and key material are injected; nothing here is baked into the
/// crate. Defaults target Base mainnet, where the attestation registry is a
/// predeploy at a fixed address.
#[derive(Debug, Clone)]
pub struct Config {
    pub chain_id: u64,
    pub rpc_url: String,
    /// Attestation registry contract address.
    pub eas_address: String,
    /// Uid of the registered dataset schema. Required: the schema is created
    /// out-of-band and its uid differs per deployment.
    pub schema_uid: String,
    /// GraphQL endpoint of the attestation indexer.
    pub indexer_url: String,
    /// Base URL of the external training service.
    pub trainer_url: String,
    /// Attester signing key. Optional: without it the read path still works
    /// and submission fails with a dedicated error.
    pub private_key: Option<String>,
}

impl Config {
    /// Load `.env` if present, then read the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        Ok(Config {
            chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| "8453".to_string())
                .parse()
                .context("Invalid CHAIN_ID")?,
            rpc_url: env::var("RPC_URL").unwrap_or_else(|_| "https://mainnet.base.org".to_string()),
            eas_address: env::var("EAS_ADDRESS")
                .unwrap_or_else(|_| "0x4200000000000000000000000000000000000021".to_string()),
            schema_uid: env::var("EAS_SCHEMA_UID")
                .context("EAS_SCHEMA_UID must be set to the registered dataset schema uid")?,
            indexer_url: env::var("EAS_INDEXER_URL")
                .unwrap_or_else(|_| "https://base.easscan.org/graphql".to_string()),
            trainer_url: env::var("TRAINING_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            private_key: env::var("ATTESTER_PRIVATE_KEY").ok(),
        })
    }
}
