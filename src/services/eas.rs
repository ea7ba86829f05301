//! Attestation writes against the on-chain registry.

use alloy::{
    network::EthereumWallet,
    primitives::{Address, Bytes, FixedBytes, U256},
    providers::ProviderBuilder,
    signers::local::PrivateKeySigner,
    sol,
    sol_types::SolEvent,
};
use anyhow::{Context, Result};

use crate::config::Config;
use crate::error::{AttestError, SubmissionError};
use crate::models::{AttestationReceipt, SubmitOptions};

sol! {
    #[sol(rpc)]
    contract IEAS {
        struct AttestationRequestData {
            address recipient;
            uint64 expirationTime;
            bool revocable;
            bytes32 refUID;
            bytes data;
            uint256 value;
        }

        struct AttestationRequest {
            bytes32 schema;
            AttestationRequestData data;
        }

        function attest(AttestationRequest request) external payable returns (bytes32 uid);

        event Attested(address indexed recipient, address indexed attester, bytes32 uid, bytes32 indexed schemaUID);
    }
}

/// Client for the attestation registry. Holds the parsed endpoint and schema
/// identity plus the optional attester wallet; a signing provider is built
/// per submission so a wallet-less client can still be constructed for
/// read-oriented callers.
pub struct EasClient {
    rpc_url: String,
    eas_address: Address,
    schema_uid: FixedBytes<32>,
    wallet: Option<EthereumWallet>,
    attester: Option<Address>,
}

impl EasClient {
    pub fn new(config: &Config) -> Result<Self> {
        let eas_address: Address = config
            .eas_address
            .parse()
            .context("Invalid EAS contract address")?;
        let schema_uid: FixedBytes<32> = config
            .schema_uid
            .parse()
            .context("Invalid EAS_SCHEMA_UID")?;

        let (wallet, attester) = match config.private_key.as_deref() {
            Some(key) => {
                let signer: PrivateKeySigner =
                    key.parse().context("Invalid attester private key")?;
                let attester = signer.address();
                (Some(EthereumWallet::from(signer)), Some(attester))
            }
            None => (None, None),
        };

        tracing::debug!(
            chain_id = config.chain_id,
            eas = %eas_address,
            signing = wallet.is_some(),
            "attestation registry client ready"
        );

        Ok(EasClient {
            rpc_url: config.rpc_url.clone(),
            eas_address,
            schema_uid,
            wallet,
            attester,
        })
    }

    /// Address the configured key signs with, if one is configured.
    pub fn attester_address(&self) -> Option<Address> {
        self.attester
    }

    pub fn schema_uid(&self) -> FixedBytes<32> {
        self.schema_uid
    }

    /// Submit one attestation and wait for it to land.
    ///
    /// The future resolves only once the transaction is included, so callers
    /// should treat it as long-running. Dropping the future after `send` has
    /// gone out does not recall the transaction; it only stops the wait.
    pub async fn submit(
        &self,
        recipient: Address,
        payload: Vec<u8>,
        options: &SubmitOptions,
    ) -> Result<AttestationReceipt, AttestError> {
        let wallet = self.wallet.as_ref().ok_or(SubmissionError::NoSigner)?;

        tracing::info!(
            recipient = %recipient,
            payload_len = payload.len(),
            expiration = options.expiration,
            revocable = options.revocable,
            "submitting attestation"
        );

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet.clone())
            .on_http(self.rpc_url.parse().map_err(|e| {
                SubmissionError::Network(format!("invalid rpc url: {e}"))
            })?);

        let contract = IEAS::new(self.eas_address, &provider);
        let request = IEAS::AttestationRequest {
            schema: self.schema_uid,
            data: IEAS::AttestationRequestData {
                recipient,
                expirationTime: options.expiration,
                revocable: options.revocable,
                refUID: FixedBytes::ZERO,
                data: Bytes::from(payload),
                value: U256::ZERO,
            },
        };

        let call = contract.attest(request);
        let pending = call
            .send()
            .await
            .map_err(|e| classify_send_error(&e.to_string()))?;

        let tx_hash = format!("{:?}", pending.tx_hash());
        tracing::info!(tx = %tx_hash, "attestation sent, awaiting inclusion");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| SubmissionError::Confirmation(e.to_string()))?;

        if !receipt.status() {
            return Err(SubmissionError::Reverted(tx_hash).into());
        }

        // The uid only exists in the Attested event; a successful receipt
        // without one means the wrong contract was called.
        let uid = receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| {
                IEAS::Attested::decode_log(&log.inner, true)
                    .ok()
                    .map(|event| event.data.uid)
            })
            .ok_or(SubmissionError::MissingUid)?;

        tracing::info!(uid = %uid, tx = %tx_hash, "attestation confirmed");

        Ok(AttestationReceipt {
            uid: format!("{uid:?}"),
            tx_hash,
            recipient: recipient.to_string(),
        })
    }
}

/// Sort a send failure into the reason buckets callers can act on. The
/// transport only hands back strings at this layer, so classification is by
/// message content.
fn classify_send_error(message: &str) -> SubmissionError {
    let lower = message.to_lowercase();
    if lower.contains("insufficient funds") || lower.contains("insufficient balance") {
        SubmissionError::InsufficientFunds(message.to_string())
    } else if lower.contains("rejected") || lower.contains("denied") {
        SubmissionError::Rejected(message.to_string())
    } else if lower.contains("revert") {
        SubmissionError::Reverted(message.to_string())
    } else {
        SubmissionError::Network(message.to_string())
    }
}
